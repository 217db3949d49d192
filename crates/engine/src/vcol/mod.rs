// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Virtual column support: the lazy attribute protocol on [`Entity`] and the
//! compiler hooks that put virtual columns into SQL.
//!
//! [`Entity`]: crate::Entity

mod attribute;
pub mod compile;
pub mod deferred;
pub mod join;

use std::sync::Arc;

pub use attribute::VirtualAttribute;
use lume_catalog::VirtualColumnDef;
use lume_sql::{ColumnCompiler, ColumnRef, Hooks, Join, JoinConditionCompiler, ProjectionResolver, Query, Sql, SqlCompiler};

/// Installs virtual column handling into a [`SqlCompiler`].
#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualColumns;

impl VirtualColumns {
	pub fn hooks() -> Hooks {
		let hook = Arc::new(VirtualColumns);
		Hooks::new().with_column_compiler(hook.clone()).with_join_compiler(hook.clone()).with_projection(hook)
	}
}

impl ColumnCompiler for VirtualColumns {
	fn compile_column(&self, compiler: &SqlCompiler<'_>, column: &ColumnRef) -> Option<lume_type::Result<Sql>> {
		let def = column.entity.virtual_column(&column.field)?;
		Some(compile::compile_virtual_column(compiler, def, &column.alias))
	}
}

impl JoinConditionCompiler for VirtualColumns {
	fn compile_join_condition(&self, compiler: &SqlCompiler<'_>, join: &Join) -> Option<lume_type::Result<Sql>> {
		let def = join.entity.virtual_column(&join.target_field)?;
		Some(join::compile_join_condition(compiler, def, join))
	}
}

impl ProjectionResolver for VirtualColumns {
	fn virtual_columns(&self, query: &Query) -> lume_type::Result<Vec<Arc<VirtualColumnDef>>> {
		deferred::effective_virtual_columns(query.entity(), query.projection())
	}
}
