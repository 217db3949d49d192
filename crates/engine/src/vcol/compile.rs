// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lume_catalog::VirtualColumnDef;
use lume_sql::{QueryError, Scope, Sql, SqlCompiler, TableRef, qualified, quote_name};
use lume_type::DEFERRED_SENTINEL;
use tracing::{instrument, trace};

/// The literal selected in place of a virtual column that must not be
/// evaluated in the current query.
pub fn deferred_literal() -> Sql {
	Sql::new(format!("'{DEFERRED_SENTINEL}'"))
}

/// Compiles `def` as it is reached through `alias`.
///
/// On the base table the expression is inlined. On a joined table it runs as
/// a correlated subquery keyed by the owner's primary key. Queries rooted at
/// another entity get the deferred sentinel unless the column allows
/// correlated access.
#[instrument(name = "vcol::compile", level = "trace", skip(compiler, def), fields(column = %def.name()))]
pub fn compile_virtual_column(compiler: &SqlCompiler<'_>, def: &VirtualColumnDef, alias: &str) -> lume_type::Result<Sql> {
	let query = compiler.query();

	if !def.allow_correlated() && query.entity().name() != def.owner() {
		trace!(owner = %def.owner(), root = %query.entity().name(), "correlated access denied");
		return Ok(deferred_literal());
	}

	match query.alias_map().get(alias) {
		Some(TableRef::BaseTable(base)) => {
			let owner = compiler.catalog().entity(def.owner())?;
			let scope = Scope::new(base.alias.clone(), owner);
			Ok(compiler.compile_virtual_column(def, &scope)?.parenthesized())
		}
		Some(TableRef::Join(join)) => {
			let owner = compiler.catalog().entity(def.owner())?;
			let pk = owner.primary_key().name.clone();
			let outer = Scope::new(join.alias.clone(), owner.clone());
			let inner = outer.nested(owner.clone());

			let expression = compiler.compile_virtual_column(def, &inner)?;
			let mut sql = Sql::new("(SELECT ");
			sql.append(expression).push(&format!(
				" AS {} FROM {} {} WHERE {} = {} LIMIT 1)",
				quote_name(&format!("_{}_join", def.name())),
				quote_name(owner.table()),
				quote_name(&inner.alias),
				qualified(&inner.alias, &pk),
				qualified(&join.alias, &pk),
			));
			Ok(sql)
		}
		None => Err(QueryError::UnsupportedQueryShape {
			alias: alias.to_string(),
			field: def.name().to_string(),
		}
		.into()),
	}
}

#[cfg(test)]
mod tests {
	use lume_catalog::test_utils::{
		build_catalog, customer_entity, order_catalog, order_discounted_column, order_entity, order_total_column,
	};
	use lume_catalog::{Catalog, EntityBuilder, VirtualColumn};
	use lume_sql::{Query, SqlCompiler};
	use lume_type::{Expr, Type};

	use super::*;
	use crate::vcol::VirtualColumns;

	fn correlated_catalog() -> Catalog {
		build_catalog(
			customer_entity(VirtualColumn::new(Expr::call("upper", vec![Expr::field("handle")])).allow_correlated(true)),
			order_entity(order_total_column(), order_discounted_column()),
		)
	}

	fn compile(catalog: &Catalog, query: &Query, alias: &str, entity: &str, field: &str) -> lume_type::Result<Sql> {
		let hooks = VirtualColumns::hooks();
		let compiler = SqlCompiler::new(catalog, query, &hooks);
		let def = catalog.entity(entity).unwrap().virtual_column(field).unwrap().clone();
		compile_virtual_column(&compiler, &def, alias)
	}

	#[test]
	fn test_base_table_inlines_expression() {
		let catalog = order_catalog();
		let query = Query::new(catalog.entity("order").unwrap());

		let sql = compile(&catalog, &query, "orders", "order", "total").unwrap();
		assert_eq!(sql.text, "((\"orders\".\"subtotal\" * ?))");
	}

	#[test]
	fn test_behind_reference_is_sentinel() {
		let catalog = order_catalog();
		let mut query = Query::new(catalog.entity("order").unwrap());
		query.set_values(&catalog, &["customer__code"]).unwrap();

		let sql = compile(&catalog, &query, "customer", "customer", "code").unwrap();
		assert_eq!(sql.text, "'__lume_deferred__'");
		assert!(sql.params.is_empty());
	}

	#[test]
	fn test_correlated_join_subquery() {
		let catalog = correlated_catalog();
		let mut query = Query::new(catalog.entity("order").unwrap());
		query.set_values(&catalog, &["customer__code"]).unwrap();

		let sql = compile(&catalog, &query, "customer", "customer", "code").unwrap();
		assert_eq!(
			sql.text,
			"(SELECT upper(\"U0\".\"handle\") AS \"_code_join\" FROM \"customer\" \"U0\" \
			 WHERE \"U0\".\"id\" = \"customer\".\"id\" LIMIT 1)"
		);
	}

	#[test]
	fn test_owner_rooted_query_compiles_real_expression() {
		let catalog = order_catalog();
		let query = Query::new(catalog.entity("customer").unwrap());

		let sql = compile(&catalog, &query, "customer", "customer", "code").unwrap();
		assert_eq!(sql.text, "(upper(\"customer\".\"handle\"))");
	}

	#[test]
	fn test_owner_rooted_join_compiles_real_subquery() {
		let mut catalog = Catalog::new();
		catalog
			.register(
				EntityBuilder::new("node")
					.primary_key("id", Type::Int8)
					.field("label", Type::Utf8)
					.foreign_key("parent", Type::Int8, "node", "id")
					.virtual_column(
						"shout",
						Type::Utf8,
						VirtualColumn::new(Expr::call("upper", vec![Expr::field("label")])),
					),
			)
			.unwrap();
		let mut query = Query::new(catalog.entity("node").unwrap());
		query.set_values(&catalog, &["id", "parent__shout"]).unwrap();

		let sql = compile(&catalog, &query, "T2", "node", "shout").unwrap();
		assert_eq!(
			sql.text,
			"(SELECT upper(\"U0\".\"label\") AS \"_shout_join\" FROM \"node\" \"U0\" \
			 WHERE \"U0\".\"id\" = \"T2\".\"id\" LIMIT 1)"
		);
	}

	#[test]
	fn test_unknown_alias() {
		let catalog = order_catalog();
		let query = Query::new(catalog.entity("order").unwrap());

		let err = compile(&catalog, &query, "T9", "order", "total").unwrap_err();
		assert_eq!(err.code(), "QUERY_004");
	}

	#[test]
	fn test_self_reference_is_recursive() {
		let catalog = build_catalog(
			customer_entity(VirtualColumn::new(Expr::field("code"))),
			order_entity(order_total_column(), order_discounted_column()),
		);
		let query = Query::new(catalog.entity("customer").unwrap());

		let err = compile(&catalog, &query, "customer", "customer", "code").unwrap_err();
		assert_eq!(err.code(), "QUERY_005");
	}
}
