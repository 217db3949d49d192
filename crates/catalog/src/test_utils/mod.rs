// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Shared fixtures: a `customer` entity and an `order` entity referencing it
//! once by primary key and once through the virtual `customer.code`.

use lume_type::{Expr, Type};

use crate::{Catalog, EntityBuilder, VirtualColumn};

/// `code = upper(handle)`, not reachable from other entities' queries.
pub fn customer_code_column() -> VirtualColumn {
	VirtualColumn::new(Expr::call("upper", vec![Expr::field("handle")]))
}

/// `total = subtotal * 1.1`, projected by default.
pub fn order_total_column() -> VirtualColumn {
	VirtualColumn::new(Expr::field("subtotal") * Expr::constant(1.1))
}

/// `discounted = subtotal * 0.9`, only on request.
pub fn order_discounted_column() -> VirtualColumn {
	VirtualColumn::new(Expr::field("subtotal") * Expr::constant(0.9)).auto_include(false)
}

pub fn customer_entity(code: VirtualColumn) -> EntityBuilder {
	EntityBuilder::new("customer")
		.primary_key("id", Type::Int8)
		.field("handle", Type::Utf8)
		.nullable_field("name", Type::Utf8)
		.virtual_column("code", Type::Utf8, code)
}

pub fn order_entity(total: VirtualColumn, discounted: VirtualColumn) -> EntityBuilder {
	EntityBuilder::new("order")
		.table("orders")
		.primary_key("id", Type::Int8)
		.field("subtotal", Type::Float8)
		.foreign_key("customer", Type::Int8, "customer", "id")
		.foreign_key("customer_code", Type::Utf8, "customer", "code")
		.virtual_column("total", Type::Float8, total)
		.virtual_column("discounted", Type::Float8, discounted)
}

pub fn build_catalog(customer: EntityBuilder, order: EntityBuilder) -> Catalog {
	let mut catalog = Catalog::new();
	catalog.register(customer).unwrap();
	catalog.register(order).unwrap();
	catalog
}

pub fn order_catalog() -> Catalog {
	build_catalog(
		customer_entity(customer_code_column()),
		order_entity(order_total_column(), order_discounted_column()),
	)
}
