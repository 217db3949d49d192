// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use lume_catalog::Catalog;
use lume_type::Value;
use tracing_subscriber::EnvFilter;

use crate::{Database, Entity, SqliteConfig};

/// Installs a test-writer subscriber once per process. Honors `RUST_LOG`.
pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
		.with_test_writer()
		.try_init();
}

/// An in-memory database with tables for every entity of `catalog`.
pub fn create_test_database(catalog: Catalog) -> Database {
	init_logging();
	let db = Database::open(SqliteConfig::in_memory(), Arc::new(catalog)).unwrap();
	db.create_schema().unwrap();
	db
}

pub fn create_customer(db: &Database, handle: &str, name: &str) -> Entity {
	let mut customer = db.new_entity("customer").unwrap();
	customer.set("handle", handle).unwrap();
	customer.set("name", name).unwrap();
	db.save(&mut customer).unwrap();
	customer
}

pub fn create_order(db: &Database, customer: &Entity, subtotal: f64, customer_code: &str) -> Entity {
	let mut order = db.new_entity("order").unwrap();
	order.set("subtotal", subtotal).unwrap();
	order.set("customer", customer.pk().cloned().unwrap_or(Value::Undefined)).unwrap();
	order.set("customer_code", customer_code).unwrap();
	db.save(&mut order).unwrap();
	order
}
