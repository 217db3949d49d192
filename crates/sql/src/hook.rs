// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Extension points of [`SqlCompiler`](crate::SqlCompiler).
//!
//! A hook returns `None` when it has nothing to say about its input, and the
//! compiler falls back to its structural rendering.

use std::sync::Arc;

use lume_catalog::VirtualColumnDef;

use crate::{
	compile::SqlCompiler,
	emit::Sql,
	query::{ColumnRef, Join, Query},
};

pub trait ColumnCompiler: Send + Sync {
	fn compile_column(&self, compiler: &SqlCompiler<'_>, column: &ColumnRef) -> Option<crate::Result<Sql>>;
}

pub trait JoinConditionCompiler: Send + Sync {
	fn compile_join_condition(&self, compiler: &SqlCompiler<'_>, join: &Join) -> Option<crate::Result<Sql>>;
}

pub trait ProjectionResolver: Send + Sync {
	/// Virtual columns of the root entity to project, in output order.
	fn virtual_columns(&self, query: &Query) -> crate::Result<Vec<Arc<VirtualColumnDef>>>;
}

#[derive(Clone, Default)]
pub struct Hooks {
	pub columns: Vec<Arc<dyn ColumnCompiler>>,
	pub joins: Vec<Arc<dyn JoinConditionCompiler>>,
	pub projection: Option<Arc<dyn ProjectionResolver>>,
}

impl Hooks {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_column_compiler(mut self, hook: Arc<dyn ColumnCompiler>) -> Self {
		self.columns.push(hook);
		self
	}

	pub fn with_join_compiler(mut self, hook: Arc<dyn JoinConditionCompiler>) -> Self {
		self.joins.push(hook);
		self
	}

	pub fn with_projection(mut self, hook: Arc<dyn ProjectionResolver>) -> Self {
		self.projection = Some(hook);
		self
	}
}
