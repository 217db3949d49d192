// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use lume_catalog::{Catalog, EntityDef, FieldDef};
use lume_type::{Value, expression::BinaryOp};

use crate::error::QueryError;

/// Separator between the segments of a field path, `customer__name`.
pub const LOOKUP_SEP: &str = "__";

/// An entry of the alias map: the table a query scans, or a table reached
/// through a foreign key.
#[derive(Debug, Clone)]
pub enum TableRef {
	BaseTable(BaseTable),
	Join(Join),
}

impl TableRef {
	pub fn alias(&self) -> &str {
		match self {
			TableRef::BaseTable(base) => &base.alias,
			TableRef::Join(join) => &join.alias,
		}
	}
}

#[derive(Debug, Clone)]
pub struct BaseTable {
	pub table: String,
	pub alias: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
	Inner,
	LeftOuter,
}

#[derive(Debug, Clone)]
pub struct Join {
	pub table: String,
	pub alias: String,
	pub parent_alias: String,
	/// The joined entity.
	pub entity: Arc<EntityDef>,
	/// The foreign key on the parent side.
	pub field: FieldDef,
	/// The field of `entity` the foreign key points at.
	pub target_field: String,
	pub kind: JoinKind,
}

/// A field of the entity bound to `alias`.
#[derive(Debug, Clone)]
pub struct ColumnRef {
	pub alias: String,
	pub entity: Arc<EntityDef>,
	pub field: String,
}

#[derive(Debug, Clone)]
pub struct Filter {
	pub column: ColumnRef,
	pub op: BinaryOp,
	pub value: Value,
}

#[derive(Debug, Clone)]
pub struct OrderBy {
	pub column: ColumnRef,
	pub descending: bool,
}

#[derive(Debug, Clone)]
pub struct ValuePath {
	pub name: String,
	pub column: ColumnRef,
}

/// Stored-field loading mode, the `only()` / `defer()` state of a query.
/// Virtual column names may appear in either list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeferredLoading {
	#[default]
	All,
	Only(IndexSet<String>),
	Defer(IndexSet<String>),
}

/// What a query asks to populate on the entities it returns.
#[derive(Debug, Clone, Default)]
pub struct ProjectionRequest {
	/// `None`: defaults apply. `Some(empty)`: cleared. Otherwise exactly
	/// these virtual columns.
	pub requested: Option<IndexSet<String>>,
	pub loading: DeferredLoading,
}

#[derive(Debug, Clone)]
pub struct Query {
	entity: Arc<EntityDef>,
	base_alias: String,
	alias_map: IndexMap<String, TableRef>,
	filters: Vec<Filter>,
	order_by: Vec<OrderBy>,
	limit: Option<usize>,
	projection: ProjectionRequest,
	values: Option<Vec<ValuePath>>,
}

impl Query {
	pub fn new(entity: Arc<EntityDef>) -> Self {
		let base_alias = entity.table().to_string();
		let mut alias_map = IndexMap::new();
		alias_map.insert(
			base_alias.clone(),
			TableRef::BaseTable(BaseTable {
				table: entity.table().to_string(),
				alias: base_alias.clone(),
			}),
		);

		Self {
			entity,
			base_alias,
			alias_map,
			filters: Vec::new(),
			order_by: Vec::new(),
			limit: None,
			projection: ProjectionRequest::default(),
			values: None,
		}
	}

	/// The root entity type.
	pub fn entity(&self) -> &Arc<EntityDef> {
		&self.entity
	}

	pub fn base_alias(&self) -> &str {
		&self.base_alias
	}

	pub fn alias_map(&self) -> &IndexMap<String, TableRef> {
		&self.alias_map
	}

	pub fn filters(&self) -> &[Filter] {
		&self.filters
	}

	pub fn order_by(&self) -> &[OrderBy] {
		&self.order_by
	}

	pub fn limit(&self) -> Option<usize> {
		self.limit
	}

	pub fn projection(&self) -> &ProjectionRequest {
		&self.projection
	}

	pub fn values(&self) -> Option<&[ValuePath]> {
		self.values.as_deref()
	}

	pub fn is_flattened(&self) -> bool {
		self.values.is_some()
	}

	/// A column of the root entity on the base table.
	pub fn base_column(&self, field: &str) -> ColumnRef {
		ColumnRef {
			alias: self.base_alias.clone(),
			entity: self.entity.clone(),
			field: field.to_string(),
		}
	}

	/// Resolves `field` or `relation__...__field`, adding the joins the path
	/// needs. Joins are shared between paths walking the same relations.
	pub fn resolve(&mut self, catalog: &Catalog, path: &str, kind: JoinKind) -> crate::Result<ColumnRef> {
		let segments: Vec<&str> = path.split(LOOKUP_SEP).collect();
		let (last, relations) = segments.split_last().ok_or_else(|| QueryError::UnknownField {
			entity: self.entity.name().to_string(),
			path: path.to_string(),
		})?;

		let mut alias = self.base_alias.clone();
		let mut entity = self.entity.clone();

		for segment in relations {
			let Some(field) = entity.field(segment) else {
				return Err(QueryError::UnknownField {
					entity: entity.name().to_string(),
					path: path.to_string(),
				}
				.into());
			};
			let Some(fk) = field.foreign_key() else {
				return Err(QueryError::NotARelation {
					entity: entity.name().to_string(),
					field: segment.to_string(),
				}
				.into());
			};

			let target = catalog.entity(&fk.target)?;
			let field = field.clone();
			alias = self.setup_join(&alias, target.clone(), field, kind);
			entity = target;
		}

		if entity.field(last).is_none() {
			return Err(QueryError::UnknownField {
				entity: entity.name().to_string(),
				path: path.to_string(),
			}
			.into());
		}

		Ok(ColumnRef {
			alias,
			entity,
			field: last.to_string(),
		})
	}

	fn setup_join(&mut self, parent_alias: &str, entity: Arc<EntityDef>, field: FieldDef, kind: JoinKind) -> String {
		let existing = self.alias_map.values_mut().find_map(|table| match table {
			TableRef::Join(join) if join.parent_alias == parent_alias && join.field.name == field.name => {
				Some(join)
			}
			_ => None,
		});

		if let Some(join) = existing {
			if kind == JoinKind::Inner {
				join.kind = JoinKind::Inner;
			}
			return join.alias.clone();
		}

		let table = entity.table().to_string();
		let mut alias = table.clone();
		let mut next = self.alias_map.len() + 1;
		while self.alias_map.contains_key(&alias) {
			alias = format!("T{next}");
			next += 1;
		}

		let target_field = field.foreign_key().map(|fk| fk.target_field.clone()).unwrap_or_default();

		self.alias_map.insert(
			alias.clone(),
			TableRef::Join(Join {
				table,
				alias: alias.clone(),
				parent_alias: parent_alias.to_string(),
				entity,
				field,
				target_field,
				kind,
			}),
		);
		alias
	}

	pub fn add_filter(&mut self, catalog: &Catalog, path: &str, op: BinaryOp, value: Value) -> crate::Result<()> {
		let column = self.resolve(catalog, path, JoinKind::Inner)?;
		self.filters.push(Filter {
			column,
			op,
			value,
		});
		Ok(())
	}

	pub fn add_ordering(&mut self, catalog: &Catalog, path: &str) -> crate::Result<()> {
		let (path, descending) = match path.strip_prefix('-') {
			Some(path) => (path, true),
			None => (path, false),
		};
		let column = self.resolve(catalog, path, JoinKind::LeftOuter)?;
		self.order_by.push(OrderBy {
			column,
			descending,
		});
		Ok(())
	}

	pub fn set_limit(&mut self, limit: usize) {
		self.limit = Some(limit);
	}

	/// `only()`: load just these fields (the primary key is always loaded).
	pub fn add_immediate_loading<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
		let names = names.into_iter().map(str::to_string).collect();
		self.projection.loading = DeferredLoading::Only(names);
	}

	/// `defer()`: skip these fields. Narrows an existing `only()` list.
	pub fn add_deferred_loading<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
		let loading = std::mem::take(&mut self.projection.loading);
		self.projection.loading = match loading {
			DeferredLoading::All => DeferredLoading::Defer(names.into_iter().map(str::to_string).collect()),
			DeferredLoading::Defer(mut deferred) => {
				deferred.extend(names.into_iter().map(str::to_string));
				DeferredLoading::Defer(deferred)
			}
			DeferredLoading::Only(mut only) => {
				for name in names {
					only.shift_remove(name);
				}
				DeferredLoading::Only(only)
			}
		};
	}

	pub fn clear_deferred_loading(&mut self) {
		self.projection.loading = DeferredLoading::All;
	}

	/// Requests virtual columns of the root entity explicitly. Repeated calls
	/// accumulate.
	pub fn add_virtual_columns<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> crate::Result<()> {
		if self.is_flattened() {
			return Err(QueryError::Flattened {
				operation: "project()",
			}
			.into());
		}

		let mut requested = self.projection.requested.take().unwrap_or_default();
		for name in names {
			if !self.entity.is_virtual(name) {
				return Err(QueryError::NotAVirtualColumn {
					entity: self.entity.name().to_string(),
					name: name.to_string(),
				}
				.into());
			}
			requested.insert(name.to_string());
		}
		self.projection.requested = Some(requested);
		Ok(())
	}

	pub fn clear_virtual_columns(&mut self) -> crate::Result<()> {
		if self.is_flattened() {
			return Err(QueryError::Flattened {
				operation: "clear_projection()",
			}
			.into());
		}
		self.projection.requested = Some(IndexSet::new());
		Ok(())
	}

	/// Flattens the query to value tuples. Without paths every concrete field
	/// of the root entity is returned.
	pub fn set_values(&mut self, catalog: &Catalog, paths: &[&str]) -> crate::Result<()> {
		let paths: Vec<String> = if paths.is_empty() {
			self.entity.concrete_fields().map(|f| f.name.clone()).collect()
		} else {
			paths.iter().map(|p| p.to_string()).collect()
		};

		let mut values = Vec::with_capacity(paths.len());
		for path in paths {
			let column = self.resolve(catalog, &path, JoinKind::LeftOuter)?;
			values.push(ValuePath {
				name: path,
				column,
			});
		}
		self.values = Some(values);
		Ok(())
	}

	/// Concrete fields the query loads on the root entity, primary key first.
	pub fn loaded_stored_fields(&self) -> Vec<&FieldDef> {
		let pk = self.entity.primary_key();
		let mut fields = vec![pk];
		fields.extend(self.entity.concrete_fields().filter(|f| f.name != pk.name).filter(|f| {
			match &self.projection.loading {
				DeferredLoading::All => true,
				DeferredLoading::Only(only) => only.contains(&f.name),
				DeferredLoading::Defer(deferred) => !deferred.contains(&f.name),
			}
		}));
		fields
	}
}
