// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use lume_catalog::{Catalog, EntityDef, FieldKind};
use lume_type::{
	Expr, Value,
	expression::{SubqueryExpr, UnaryOp},
};

use crate::error::QueryError;

/// SQL text with its positional `?` parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
	pub text: String,
	pub params: Vec<Value>,
}

impl Sql {
	pub fn new(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			params: Vec::new(),
		}
	}

	pub fn push(&mut self, text: &str) -> &mut Self {
		self.text.push_str(text);
		self
	}

	pub fn append(&mut self, other: Sql) -> &mut Self {
		self.text.push_str(&other.text);
		self.params.extend(other.params);
		self
	}

	pub fn bind(&mut self, value: Value) -> &mut Self {
		self.text.push('?');
		self.params.push(value);
		self
	}

	/// Wraps the text in parentheses.
	pub fn parenthesized(self) -> Self {
		Self {
			text: format!("({})", self.text),
			params: self.params,
		}
	}
}

pub fn quote_name(name: &str) -> String {
	format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn qualified(alias: &str, column: &str) -> String {
	format!("{}.{}", quote_name(alias), quote_name(column))
}

/// The entity an expression is evaluated against, bound to a table alias.
/// Subqueries open a nested scope aliased `U<n>`.
#[derive(Debug)]
pub struct Scope<'a> {
	pub alias: String,
	pub entity: Arc<EntityDef>,
	outer: Option<&'a Scope<'a>>,
	next_depth: usize,
}

impl<'a> Scope<'a> {
	pub fn new(alias: impl Into<String>, entity: Arc<EntityDef>) -> Self {
		Self {
			alias: alias.into(),
			entity,
			outer: None,
			next_depth: 0,
		}
	}

	pub fn nested(&'a self, entity: Arc<EntityDef>) -> Scope<'a> {
		Scope {
			alias: format!("U{}", self.next_depth),
			entity,
			outer: Some(self),
			next_depth: self.next_depth + 1,
		}
	}

	pub fn outer(&self) -> Option<&'a Scope<'a>> {
		self.outer
	}
}

/// Renders [`Expr`] trees to SQLite text. References to other virtual
/// columns are inlined; a cycle between them is an error.
pub struct ExprEmitter<'a> {
	catalog: &'a Catalog,
	inlining: Vec<(String, String)>,
}

impl<'a> ExprEmitter<'a> {
	pub fn new(catalog: &'a Catalog) -> Self {
		Self {
			catalog,
			inlining: Vec::new(),
		}
	}

	/// Marks a virtual column as being compiled, so that its own expression
	/// cannot refer back to it.
	pub fn enter(&mut self, entity: &str, field: &str) -> crate::Result<()> {
		if self.inlining.iter().any(|(e, f)| e == entity && f == field) {
			return Err(QueryError::RecursiveExpression {
				entity: entity.to_string(),
				field: field.to_string(),
			}
			.into());
		}
		self.inlining.push((entity.to_string(), field.to_string()));
		Ok(())
	}

	pub fn leave(&mut self) {
		self.inlining.pop();
	}

	pub fn emit(&mut self, expr: &Expr, scope: &Scope<'_>) -> crate::Result<Sql> {
		match expr {
			Expr::Field(name) => self.emit_field(name, scope),
			Expr::OuterRef(name) => match scope.outer() {
				Some(outer) => self.emit_field(name, outer),
				None => Err(QueryError::UnknownField {
					entity: scope.entity.name().to_string(),
					path: format!("outer.{name}"),
				}
				.into()),
			},
			Expr::Constant(Value::Undefined) => Ok(Sql::new("NULL")),
			Expr::Constant(value) => {
				let mut sql = Sql::default();
				sql.bind(value.clone());
				Ok(sql)
			}
			Expr::Unary {
				op,
				expr,
			} => {
				let inner = self.emit(expr, scope)?.parenthesized();
				let mut sql = Sql::default();
				match op {
					UnaryOp::Not => {
						sql.push("NOT ").append(inner);
					}
					UnaryOp::Neg => {
						sql.push("-").append(inner);
					}
					UnaryOp::IsNull => {
						sql.append(inner).push(" IS NULL");
					}
					UnaryOp::IsNotNull => {
						sql.append(inner).push(" IS NOT NULL");
					}
				}
				Ok(sql)
			}
			Expr::Binary {
				op,
				left,
				right,
			} => {
				let left = self.emit(left, scope)?;
				let right = self.emit(right, scope)?;
				let mut sql = Sql::new("(");
				sql.append(left).push(&format!(" {} ", op.as_sql())).append(right).push(")");
				Ok(sql)
			}
			Expr::Call {
				function,
				args,
			} => {
				let mut sql = Sql::new(format!("{function}("));
				for (i, arg) in args.iter().enumerate() {
					if i > 0 {
						sql.push(", ");
					}
					let arg = self.emit(arg, scope)?;
					sql.append(arg);
				}
				sql.push(")");
				Ok(sql)
			}
			Expr::Case {
				branches,
				otherwise,
			} => {
				let mut sql = Sql::new("CASE");
				for (condition, result) in branches {
					let condition = self.emit(condition, scope)?;
					let result = self.emit(result, scope)?;
					sql.push(" WHEN ").append(condition).push(" THEN ").append(result);
				}
				if let Some(otherwise) = otherwise {
					let otherwise = self.emit(otherwise, scope)?;
					sql.push(" ELSE ").append(otherwise);
				}
				sql.push(" END");
				Ok(sql)
			}
			Expr::Subquery(subquery) => self.emit_subquery(subquery, scope),
			Expr::Raw {
				sql,
				params,
			} => Ok(Sql {
				text: sql.clone(),
				params: params.clone(),
			}),
		}
	}

	fn emit_field(&mut self, name: &str, scope: &Scope<'_>) -> crate::Result<Sql> {
		let Some(field) = scope.entity.field(name) else {
			return Err(QueryError::UnknownField {
				entity: scope.entity.name().to_string(),
				path: name.to_string(),
			}
			.into());
		};

		match &field.kind {
			FieldKind::Virtual(column) => {
				self.enter(column.owner(), column.name())?;
				let result = self.emit(column.expression(), scope);
				self.leave();
				Ok(result?.parenthesized())
			}
			_ => Ok(Sql::new(qualified(&scope.alias, name))),
		}
	}

	fn emit_subquery(&mut self, subquery: &SubqueryExpr, scope: &Scope<'_>) -> crate::Result<Sql> {
		let entity = self.catalog.entity(&subquery.entity)?;
		let inner = scope.nested(entity.clone());

		let projection = self.emit(&subquery.projection, &inner)?;
		let mut sql = Sql::new("(SELECT ");
		sql.append(projection).push(&format!(" FROM {} {}", quote_name(entity.table()), quote_name(&inner.alias)));
		if let Some(filter) = &subquery.filter {
			let filter = self.emit(filter, &inner)?;
			sql.push(" WHERE ").append(filter);
		}
		sql.push(" LIMIT 1)");
		Ok(sql)
	}
}
