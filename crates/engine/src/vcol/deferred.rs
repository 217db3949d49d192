// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use lume_catalog::{EntityDef, VirtualColumnDef};
use lume_sql::{DeferredLoading, ProjectionRequest, QueryError};
use tracing::trace;

/// Virtual columns of `entity` a query projects, highest precedence first:
/// an explicit request, an explicit clear, an `only()` list, a `defer()`
/// list, then the auto-include defaults.
pub fn effective_virtual_columns(
	entity: &EntityDef,
	request: &ProjectionRequest,
) -> lume_type::Result<Vec<Arc<VirtualColumnDef>>> {
	let columns: Vec<Arc<VirtualColumnDef>> = match (&request.requested, &request.loading) {
		(Some(names), _) if !names.is_empty() => names
			.iter()
			.map(|name| {
				entity.virtual_column(name).cloned().ok_or_else(|| {
					lume_type::Error::from(QueryError::NotAVirtualColumn {
						entity: entity.name().to_string(),
						name: name.clone(),
					})
				})
			})
			.collect::<lume_type::Result<_>>()?,
		(Some(_), _) => Vec::new(),
		(None, DeferredLoading::Only(only)) => {
			entity.virtual_columns().filter(|c| only.contains(c.name())).cloned().collect()
		}
		(None, DeferredLoading::Defer(deferred)) => entity
			.virtual_columns()
			.filter(|c| c.auto_include() && !deferred.contains(c.name()))
			.cloned()
			.collect(),
		(None, DeferredLoading::All) => entity.virtual_columns().filter(|c| c.auto_include()).cloned().collect(),
	};

	trace!(entity = %entity.name(), columns = columns.len(), "resolved virtual columns");
	Ok(columns)
}
