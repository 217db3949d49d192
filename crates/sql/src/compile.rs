// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lume_catalog::{Catalog, VirtualColumnDef};
use lume_type::{Expr, Type, Value, expression::BinaryOp};
use tracing::{debug, instrument};

use crate::{
	emit::{ExprEmitter, Scope, Sql, qualified, quote_name},
	error::QueryError,
	hook::Hooks,
	query::{ColumnRef, Filter, Join, JoinKind, Query, TableRef},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
	Stored,
	Virtual,
}

/// Describes one column of a compiled result row.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
	pub name: String,
	pub ty: Type,
	pub kind: OutputKind,
}

#[derive(Debug, Clone)]
pub struct CompiledQuery {
	pub sql: Sql,
	pub columns: Vec<OutputColumn>,
}

pub struct SqlCompiler<'a> {
	catalog: &'a Catalog,
	query: &'a Query,
	hooks: &'a Hooks,
}

impl<'a> SqlCompiler<'a> {
	pub fn new(catalog: &'a Catalog, query: &'a Query, hooks: &'a Hooks) -> Self {
		Self {
			catalog,
			query,
			hooks,
		}
	}

	pub fn catalog(&self) -> &'a Catalog {
		self.catalog
	}

	pub fn query(&self) -> &'a Query {
		self.query
	}

	#[instrument(name = "sql::compile", level = "debug", skip(self), fields(entity = %self.query.entity().name()))]
	pub fn as_sql(&self) -> crate::Result<CompiledQuery> {
		let (select, columns) = match self.query.values() {
			Some(values) => {
				let mut select = Vec::with_capacity(values.len());
				let mut columns = Vec::with_capacity(values.len());
				for value in values {
					let (sql, column) = self.compile_output(&value.column, value.name.clone())?;
					select.push(sql);
					columns.push(column);
				}
				(select, columns)
			}
			None => self.entity_projection()?,
		};

		let mut sql = Sql::new("SELECT ");
		for (i, column) in select.into_iter().enumerate() {
			if i > 0 {
				sql.push(", ");
			}
			sql.append(column);
		}

		sql.push(" FROM ");
		for table in self.query.alias_map().values() {
			match table {
				TableRef::BaseTable(base) => {
					sql.push(&table_with_alias(&base.table, &base.alias));
				}
				TableRef::Join(join) => {
					let condition = self.compile_join_condition(join)?;
					let keyword = match join.kind {
						JoinKind::Inner => " INNER JOIN ",
						JoinKind::LeftOuter => " LEFT OUTER JOIN ",
					};
					sql.push(keyword).push(&table_with_alias(&join.table, &join.alias)).push(" ON ").append(condition);
				}
			}
		}

		for (i, filter) in self.query.filters().iter().enumerate() {
			sql.push(if i == 0 {
				" WHERE "
			} else {
				" AND "
			});
			let filter = self.compile_filter(filter)?;
			sql.append(filter);
		}

		for (i, order) in self.query.order_by().iter().enumerate() {
			sql.push(if i == 0 {
				" ORDER BY "
			} else {
				", "
			});
			let column = self.compile_column(&order.column)?;
			sql.append(column);
			if order.descending {
				sql.push(" DESC");
			}
		}

		if let Some(limit) = self.query.limit() {
			sql.push(&format!(" LIMIT {limit}"));
		}

		debug!(sql = %sql.text, params = sql.params.len(), "compiled query");

		Ok(CompiledQuery {
			sql,
			columns,
		})
	}

	fn entity_projection(&self) -> crate::Result<(Vec<Sql>, Vec<OutputColumn>)> {
		let mut select = Vec::new();
		let mut columns = Vec::new();

		for field in self.query.loaded_stored_fields() {
			let column = self.query.base_column(&field.name);
			let (sql, column) = self.compile_output(&column, field.name.clone())?;
			select.push(sql);
			columns.push(column);
		}

		let virtual_columns = match &self.hooks.projection {
			Some(resolver) => resolver.virtual_columns(self.query)?,
			None => Vec::new(),
		};

		for def in virtual_columns {
			let column = self.query.base_column(def.name());
			let (sql, column) = self.compile_output(&column, def.name().to_string())?;
			select.push(sql);
			columns.push(column);
		}

		Ok((select, columns))
	}

	fn compile_output(&self, column: &ColumnRef, name: String) -> crate::Result<(Sql, OutputColumn)> {
		let field = column.entity.field(&column.field).ok_or_else(|| QueryError::UnknownField {
			entity: column.entity.name().to_string(),
			path: column.field.clone(),
		})?;

		let kind = if field.is_virtual() {
			OutputKind::Virtual
		} else {
			OutputKind::Stored
		};

		let mut sql = self.compile_column(column)?;
		if kind == OutputKind::Virtual {
			sql.push(&format!(" AS {}", quote_name(&column.field)));
		}

		Ok((
			sql,
			OutputColumn {
				name,
				ty: field.ty,
				kind,
			},
		))
	}

	/// Renders a column reference. Installed column hooks are asked first;
	/// the first one that answers wins.
	pub fn compile_column(&self, column: &ColumnRef) -> crate::Result<Sql> {
		for hook in &self.hooks.columns {
			if let Some(result) = hook.compile_column(self, column) {
				return result;
			}
		}

		if column.entity.is_virtual(&column.field) {
			return Err(QueryError::MissingColumnCompiler {
				entity: column.entity.name().to_string(),
				field: column.field.clone(),
			}
			.into());
		}

		Ok(Sql::new(qualified(&column.alias, &column.field)))
	}

	/// Renders the `ON` condition of a join, asking join hooks first.
	pub fn compile_join_condition(&self, join: &Join) -> crate::Result<Sql> {
		for hook in &self.hooks.joins {
			if let Some(result) = hook.compile_join_condition(self, join) {
				return result;
			}
		}

		if join.entity.is_virtual(&join.target_field) {
			return Err(QueryError::MissingColumnCompiler {
				entity: join.entity.name().to_string(),
				field: join.target_field.clone(),
			}
			.into());
		}

		Ok(Sql::new(format!(
			"{} = {}",
			qualified(&join.parent_alias, &join.field.name),
			qualified(&join.alias, &join.target_field)
		)))
	}

	/// Compiles an arbitrary expression in `scope`.
	pub fn compile_expression(&self, expr: &Expr, scope: &Scope<'_>) -> crate::Result<Sql> {
		ExprEmitter::new(self.catalog).emit(expr, scope)
	}

	/// Compiles the expression of a virtual column in `scope`, rejecting
	/// expressions that lead back to the column itself.
	pub fn compile_virtual_column(&self, def: &VirtualColumnDef, scope: &Scope<'_>) -> crate::Result<Sql> {
		let mut emitter = ExprEmitter::new(self.catalog);
		emitter.enter(def.owner(), def.name())?;
		emitter.emit(def.expression(), scope)
	}

	fn compile_filter(&self, filter: &Filter) -> crate::Result<Sql> {
		let mut sql = self.compile_column(&filter.column)?;
		match (&filter.value, filter.op) {
			(Value::Undefined, BinaryOp::Eq) => {
				sql.push(" IS NULL");
			}
			(Value::Undefined, BinaryOp::NotEq) => {
				sql.push(" IS NOT NULL");
			}
			(value, op) => {
				sql.push(&format!(" {} ", op.as_sql())).bind(value.clone());
			}
		}
		Ok(sql)
	}
}

fn table_with_alias(table: &str, alias: &str) -> String {
	if table == alias {
		quote_name(table)
	} else {
		format!("{} {}", quote_name(table), quote_name(alias))
	}
}
