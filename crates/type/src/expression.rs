// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Query expressions attached to virtual columns.
//!
//! An [`Expr`] is written against the attributes of one entity type and only
//! becomes SQL once the compiler knows which table alias it is evaluated in.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
	/// An attribute of the entity in scope; may itself be a virtual column.
	Field(String),
	/// An attribute of the enclosing scope, used inside subqueries.
	OuterRef(String),
	Constant(Value),
	Unary {
		op: UnaryOp,
		expr: Box<Expr>,
	},
	Binary {
		op: BinaryOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Call {
		function: String,
		args: Vec<Expr>,
	},
	Case {
		branches: Vec<(Expr, Expr)>,
		otherwise: Option<Box<Expr>>,
	},
	/// A scalar subquery over another entity type.
	Subquery(Box<SubqueryExpr>),
	/// Verbatim SQL with positional `?` parameters.
	Raw {
		sql: String,
		params: Vec<Value>,
	},
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubqueryExpr {
	pub entity: String,
	pub projection: Expr,
	pub filter: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
	Not,
	Neg,
	IsNull,
	IsNotNull,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Eq,
	NotEq,
	Lt,
	LtEq,
	Gt,
	GtEq,
	And,
	Or,
	Concat,
}

impl BinaryOp {
	pub fn as_sql(&self) -> &'static str {
		match self {
			BinaryOp::Add => "+",
			BinaryOp::Sub => "-",
			BinaryOp::Mul => "*",
			BinaryOp::Div => "/",
			BinaryOp::Eq => "=",
			BinaryOp::NotEq => "<>",
			BinaryOp::Lt => "<",
			BinaryOp::LtEq => "<=",
			BinaryOp::Gt => ">",
			BinaryOp::GtEq => ">=",
			BinaryOp::And => "AND",
			BinaryOp::Or => "OR",
			BinaryOp::Concat => "||",
		}
	}
}

impl Expr {
	pub fn field(name: impl Into<String>) -> Self {
		Expr::Field(name.into())
	}

	pub fn outer(name: impl Into<String>) -> Self {
		Expr::OuterRef(name.into())
	}

	pub fn constant(value: impl Into<Value>) -> Self {
		Expr::Constant(value.into())
	}

	pub fn call(function: impl Into<String>, args: Vec<Expr>) -> Self {
		Expr::Call {
			function: function.into(),
			args,
		}
	}

	pub fn raw(sql: impl Into<String>, params: Vec<Value>) -> Self {
		Expr::Raw {
			sql: sql.into(),
			params,
		}
	}

	pub fn subquery(entity: impl Into<String>, projection: Expr) -> Self {
		Expr::Subquery(Box::new(SubqueryExpr {
			entity: entity.into(),
			projection,
			filter: None,
		}))
	}

	/// Restricts a subquery expression; a no-op on anything else.
	pub fn filter(self, predicate: Expr) -> Self {
		match self {
			Expr::Subquery(mut subquery) => {
				subquery.filter = Some(match subquery.filter.take() {
					Some(existing) => existing.and(predicate),
					None => predicate,
				});
				Expr::Subquery(subquery)
			}
			other => other,
		}
	}

	pub fn binary(self, op: BinaryOp, right: Expr) -> Self {
		Expr::Binary {
			op,
			left: Box::new(self),
			right: Box::new(right),
		}
	}

	pub fn eq(self, right: Expr) -> Self {
		self.binary(BinaryOp::Eq, right)
	}

	pub fn gt(self, right: Expr) -> Self {
		self.binary(BinaryOp::Gt, right)
	}

	pub fn and(self, right: Expr) -> Self {
		self.binary(BinaryOp::And, right)
	}

	pub fn concat(self, right: Expr) -> Self {
		self.binary(BinaryOp::Concat, right)
	}

	pub fn is_null(self) -> Self {
		Expr::Unary {
			op: UnaryOp::IsNull,
			expr: Box::new(self),
		}
	}
}

impl Add for Expr {
	type Output = Expr;

	fn add(self, rhs: Expr) -> Expr {
		self.binary(BinaryOp::Add, rhs)
	}
}

impl Sub for Expr {
	type Output = Expr;

	fn sub(self, rhs: Expr) -> Expr {
		self.binary(BinaryOp::Sub, rhs)
	}
}

impl Mul for Expr {
	type Output = Expr;

	fn mul(self, rhs: Expr) -> Expr {
		self.binary(BinaryOp::Mul, rhs)
	}
}

impl Div for Expr {
	type Output = Expr;

	fn div(self, rhs: Expr) -> Expr {
		self.binary(BinaryOp::Div, rhs)
	}
}

impl Neg for Expr {
	type Output = Expr;

	fn neg(self) -> Expr {
		Expr::Unary {
			op: UnaryOp::Neg,
			expr: Box::new(self),
		}
	}
}
