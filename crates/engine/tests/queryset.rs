// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lume_catalog::test_utils::order_catalog;
use lume_engine::test_utils::{create_customer, create_order, create_test_database};
use lume_type::{Value, expression::BinaryOp};

#[test]
fn test_save_assigns_primary_key() {
	let db = create_test_database(order_catalog());
	let ann = create_customer(&db, "ann", "Ann");
	let bob = create_customer(&db, "bob", "Bob");

	assert_eq!(ann.pk(), Some(&Value::Int8(1)));
	assert_eq!(bob.pk(), Some(&Value::Int8(2)));
}

#[test]
fn test_save_updates_existing_row() {
	let db = create_test_database(order_catalog());
	let mut ann = create_customer(&db, "ann", "Ann");

	ann.set("name", "Annette").unwrap();
	db.save(&mut ann).unwrap();

	let mut fetched = db.objects("customer").unwrap().get(1).unwrap();
	assert_eq!(fetched.get("name").unwrap(), Value::from("Annette"));
	assert_eq!(db.objects("customer").unwrap().fetch().unwrap().len(), 1);
}

#[test]
fn test_filter_order_and_limit() {
	let db = create_test_database(order_catalog());
	let ann = create_customer(&db, "ann", "Ann");
	for subtotal in [5.0, 15.0, 25.0, 35.0] {
		create_order(&db, &ann, subtotal, "ANN");
	}

	let rows = db
		.objects("order")
		.unwrap()
		.filter("subtotal", BinaryOp::Gt, 10.0)
		.unwrap()
		.order_by("-subtotal")
		.unwrap()
		.limit(2)
		.values(&["subtotal"])
		.unwrap()
		.fetch_values()
		.unwrap();

	assert_eq!(rows, vec![vec![Some(Value::Float8(35.0))], vec![Some(Value::Float8(25.0))]]);
}

#[test]
fn test_filter_across_relation() {
	let db = create_test_database(order_catalog());
	let ann = create_customer(&db, "ann", "Ann");
	let bob = create_customer(&db, "bob", "Bob");
	create_order(&db, &ann, 1.0, "ANN");
	create_order(&db, &bob, 2.0, "BOB");

	let orders = db.objects("order").unwrap().filter_eq("customer__name", "Bob").unwrap().fetch().unwrap();

	assert_eq!(orders.len(), 1);
	assert_eq!(orders[0].pk(), Some(&Value::Int8(2)));
}

#[test]
fn test_values_of_entity_query_uses_concrete_fields() {
	let db = create_test_database(order_catalog());
	let ann = create_customer(&db, "ann", "Ann");
	create_order(&db, &ann, 3.0, "ANN");

	let rows = db.objects("order").unwrap().fetch_values().unwrap();
	assert_eq!(
		rows,
		vec![vec![
			Some(Value::Int8(1)),
			Some(Value::Float8(3.0)),
			Some(Value::Int8(1)),
			Some(Value::from("ANN")),
		]]
	);
}

#[test]
fn test_flattened_query_rejects_entity_operations() {
	let db = create_test_database(order_catalog());
	let rows = db.objects("order").unwrap().values(&["id"]).unwrap();

	assert_eq!(rows.fetch().unwrap_err().code(), "QUERY_003");
	assert_eq!(rows.clone().project(&["total"]).err().unwrap().code(), "QUERY_003");
	assert_eq!(rows.clear_projection().err().unwrap().code(), "QUERY_003");
}

#[test]
fn test_project_rejects_stored_field() {
	let db = create_test_database(order_catalog());
	assert_eq!(db.objects("order").unwrap().project(&["subtotal"]).err().unwrap().code(), "QUERY_006");
}

#[test]
fn test_get_missing() {
	let db = create_test_database(order_catalog());
	assert_eq!(db.objects("order").unwrap().get(42).unwrap_err().code(), "ENGINE_004");
}

#[test]
fn test_unknown_entity() {
	let db = create_test_database(order_catalog());
	assert_eq!(db.objects("invoice").err().unwrap().code(), "CATALOG_002");
}
