// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use lume_catalog::{
	Catalog, EntityBuilder, VirtualColumn,
	test_utils::{
		build_catalog, customer_code_column, customer_entity, order_catalog, order_discounted_column, order_entity,
		order_total_column,
	},
};
use lume_engine::{
	Database, Slot,
	test_utils::{create_customer, create_order, create_test_database},
};
use lume_type::{Expr, Type, Value};

fn seeded(catalog: Catalog) -> Database {
	let db = create_test_database(catalog);
	let ann = create_customer(&db, "ann", "Ann");
	let bob = create_customer(&db, "bob", "Bob");
	create_order(&db, &ann, 10.0, "ANN");
	create_order(&db, &ann, 20.0, "ANN");
	create_order(&db, &bob, 40.0, "BOB");
	db
}

fn correlated_catalog() -> Catalog {
	build_catalog(
		customer_entity(VirtualColumn::new(Expr::call("upper", vec![Expr::field("handle")])).allow_correlated(true)),
		order_entity(order_total_column(), order_discounted_column()),
	)
}

fn assert_close(value: Value, expected: f64) {
	let actual = value.as_f64().unwrap();
	assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

#[test]
fn test_total_is_fetched_with_the_rows() {
	let db = seeded(order_catalog());
	let orders = db.objects("order").unwrap().order_by("id").unwrap();

	let mut fetched = orders.fetch().unwrap();
	let after_fetch = db.query_count();

	assert_eq!(fetched.len(), 3);
	for order in &mut fetched {
		let subtotal = order.get("subtotal").unwrap().as_f64().unwrap();
		assert_close(order.get("total").unwrap(), subtotal * 1.1);
	}
	assert_eq!(db.query_count(), after_fetch);
}

#[test]
fn test_deferred_total_costs_one_fetch_per_row() {
	let db = seeded(order_catalog());

	for orders in [
		db.objects("order").unwrap().defer(&["total"]),
		db.objects("order").unwrap().defer(&["total"]).clear_projection().unwrap(),
	] {
		let mut fetched = orders.fetch().unwrap();
		let before = db.query_count();

		for order in &mut fetched {
			assert_eq!(order.slot("total"), Some(&Slot::Unset));
			let subtotal = order.get("subtotal").unwrap().as_f64().unwrap();
			assert_close(order.get("total").unwrap(), subtotal * 1.1);
			assert_close(order.get("total").unwrap(), subtotal * 1.1);
		}

		assert_eq!(db.query_count() - before, fetched.len());
	}
}

#[test]
fn test_local_compute_is_called_once_and_skips_the_database() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let total = order_total_column().compute(move |record| {
		counter.fetch_add(1, Ordering::SeqCst);
		let subtotal = record.value("subtotal").and_then(Value::as_f64).unwrap_or_default();
		Ok(Value::Float8(subtotal * 1.1))
	});
	let db = seeded(build_catalog(customer_entity(customer_code_column()), order_entity(total, order_discounted_column())));

	let mut order = db.objects("order").unwrap().clear_projection().unwrap().get(1).unwrap();
	let before = db.query_count();

	assert_close(order.get("total").unwrap(), 11.0);
	assert_close(order.get("total").unwrap(), 11.0);
	assert_eq!(calls.load(Ordering::SeqCst), 1);
	assert_eq!(db.query_count(), before);
}

#[test]
fn test_projection_precedence() {
	let db = seeded(order_catalog());
	let loaded = |set: lume_engine::QuerySet| {
		let order = set.get(1).unwrap();
		(order.slot("total").unwrap().is_loaded(), order.slot("discounted").unwrap().is_loaded())
	};

	assert_eq!(loaded(db.objects("order").unwrap()), (true, false));
	assert_eq!(loaded(db.objects("order").unwrap().only(&["subtotal", "discounted"])), (false, true));
	assert_eq!(loaded(db.objects("order").unwrap().project(&["total", "discounted"]).unwrap()), (true, true));
	assert_eq!(
		loaded(
			db.objects("order")
				.unwrap()
				.defer(&["total", "discounted"])
				.project(&["total"])
				.unwrap()
				.project(&["discounted"])
				.unwrap()
		),
		(true, true)
	);
	assert_eq!(loaded(db.objects("order").unwrap().defer(&["total"]).clear_deferred()), (true, false));
	assert_eq!(loaded(db.objects("order").unwrap().clear_projection().unwrap()), (false, false));
}

#[test]
fn test_only_leaves_stored_fields_deferred() {
	let db = seeded(order_catalog());
	let mut order = db.objects("order").unwrap().only(&["subtotal"]).get(2).unwrap();

	assert_eq!(order.deferred_fields(), vec!["customer", "customer_code"]);
	assert_eq!(order.get("customer_code").unwrap(), Value::from("ANN"));
	assert_eq!(order.deferred_fields(), vec!["customer"]);
}

#[test]
fn test_read_only_column_rejects_assignment() {
	let db = seeded(order_catalog());

	let mut existing = db.objects("order").unwrap().get(1).unwrap();
	assert_eq!(existing.set("total", 99.0).unwrap_err().code(), "VC_001");

	let mut fresh = db.new_entity("order").unwrap();
	assert_eq!(fresh.set("total", 99.0).unwrap_err().code(), "VC_001");
}

#[test]
fn test_rematerialization_never_writes() {
	let writes = Arc::new(AtomicUsize::new(0));
	let counter = writes.clone();
	let total = order_total_column().write(move |record, value| {
		counter.fetch_add(1, Ordering::SeqCst);
		record.set_value("subtotal", Value::Float8(value.as_f64().unwrap_or_default() / 1.1));
		Ok(())
	});
	let db = seeded(build_catalog(customer_entity(customer_code_column()), order_entity(total, order_discounted_column())));

	let mut order = db.objects("order").unwrap().get(1).unwrap();
	let current = order.get("total").unwrap();
	order.set("total", current).unwrap();
	order.refresh().unwrap();
	assert_eq!(writes.load(Ordering::SeqCst), 0);

	order.set("total", 22.0).unwrap();
	assert_eq!(writes.load(Ordering::SeqCst), 1);
	assert_close(order.get("subtotal").unwrap(), 20.0);

	db.save(&mut order).unwrap();
	order.refresh().unwrap();
	assert_close(order.get("total").unwrap(), 22.0);
	assert_eq!(writes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_refresh_replaces_stale_values() {
	let db = seeded(order_catalog());
	let mut order = db.objects("order").unwrap().get(1).unwrap();

	db.execute_batch("UPDATE \"orders\" SET \"subtotal\" = 100.0 WHERE \"id\" = 1").unwrap();
	order.refresh().unwrap();

	assert_close(order.get("subtotal").unwrap(), 100.0);
	assert_close(order.get("total").unwrap(), 110.0);
}

#[test]
fn test_missing_row_is_an_error() {
	let db = seeded(order_catalog());
	let mut deferred = db.objects("order").unwrap().clear_projection().unwrap().get(1).unwrap();
	let mut loaded = db.objects("order").unwrap().get(1).unwrap();

	db.execute_batch("DELETE FROM \"orders\" WHERE \"id\" = 1").unwrap();

	assert_eq!(deferred.get("total").unwrap_err().code(), "VC_002");
	assert_eq!(loaded.refresh().unwrap_err().code(), "VC_002");
}

#[test]
fn test_behind_reference_values_are_deferred() {
	let db = seeded(order_catalog());
	let rows = db.objects("order").unwrap().order_by("id").unwrap().values(&["id", "customer__code"]).unwrap();

	let compiled = rows.sql().unwrap();
	assert!(compiled.sql.text.contains("'__lume_deferred__'"));
	assert!(!compiled.sql.text.contains("upper("));

	for row in rows.fetch_values().unwrap() {
		assert_eq!(row[1], None);
	}
}

#[test]
fn test_owner_rooted_query_computes_code() {
	let db = seeded(order_catalog());
	let mut customer = db.objects("customer").unwrap().get(2).unwrap();

	assert!(customer.slot("code").unwrap().is_loaded());
	assert_eq!(customer.get("code").unwrap(), Value::from("BOB"));
}

#[test]
fn test_owner_rooted_values_through_self_reference() {
	let mut catalog = Catalog::new();
	catalog
		.register(
			EntityBuilder::new("node")
				.primary_key("id", Type::Int8)
				.field("label", Type::Utf8)
				.foreign_key("parent", Type::Int8, "node", "id")
				.virtual_column("shout", Type::Utf8, VirtualColumn::new(Expr::call("upper", vec![Expr::field("label")]))),
		)
		.unwrap();
	let db = create_test_database(catalog);
	db.execute_batch(
		"INSERT INTO \"node\" (\"id\", \"label\", \"parent\") VALUES (1, 'root', NULL), (2, 'leaf', 1)",
	)
	.unwrap();

	let rows = db.objects("node").unwrap().filter_eq("id", 2).unwrap().values(&["id", "parent__shout"]).unwrap();

	assert!(!rows.sql().unwrap().sql.text.contains("__lume_deferred__"));
	assert_eq!(rows.fetch_values().unwrap(), vec![vec![Some(Value::Int8(2)), Some(Value::from("ROOT"))]]);
}

#[test]
fn test_correlated_values_are_computed() {
	let db = seeded(correlated_catalog());
	let rows = db
		.objects("order")
		.unwrap()
		.order_by("id")
		.unwrap()
		.values(&["id", "customer__code"])
		.unwrap()
		.fetch_values()
		.unwrap();

	let codes: Vec<_> = rows.into_iter().map(|row| row[1].clone()).collect();
	assert_eq!(codes, vec![Some(Value::from("ANN")), Some(Value::from("ANN")), Some(Value::from("BOB"))]);
}

#[test]
fn test_join_on_virtual_target_matches_nothing_without_correlation() {
	let db = seeded(order_catalog());
	let orders = db.objects("order").unwrap().filter_eq("customer_code__name", "Ann").unwrap();

	assert!(orders.sql().unwrap().sql.text.contains("ON NULL"));
	assert!(orders.fetch().unwrap().is_empty());
}

#[test]
fn test_join_on_virtual_target_with_correlation() {
	let db = seeded(correlated_catalog());
	let orders = db.objects("order").unwrap().filter_eq("customer_code__name", "Ann").unwrap();

	assert_eq!(orders.fetch().unwrap().len(), 2);
}

#[test]
fn test_parent_values_are_adopted() {
	let db = seeded(order_catalog());
	let parent = db.objects("order").unwrap().get(1).unwrap();

	let mut child = db.new_entity("order").unwrap().with_parent(parent);
	let before = db.query_count();

	assert_close(child.get("total").unwrap(), 11.0);
	assert_eq!(db.query_count(), before);
}
