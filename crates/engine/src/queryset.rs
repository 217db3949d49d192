// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lume_sql::{CompiledQuery, Query, QueryError};
use lume_type::{Value, expression::BinaryOp};
use tracing::{debug, instrument};

use crate::{Database, Entity, database::Row, error::EngineError};

/// A lazily evaluated query against one entity type. Builder methods consume
/// and return the set; nothing runs until [`fetch`](Self::fetch),
/// [`fetch_values`](Self::fetch_values) or [`get`](Self::get).
#[derive(Clone)]
pub struct QuerySet {
	db: Database,
	query: Query,
}

impl QuerySet {
	pub(crate) fn new(db: Database, query: Query) -> Self {
		Self {
			db,
			query,
		}
	}

	pub fn query(&self) -> &Query {
		&self.query
	}

	pub fn filter(mut self, path: &str, op: BinaryOp, value: impl Into<Value>) -> crate::Result<Self> {
		self.query.add_filter(self.db.catalog(), path, op, value.into())?;
		Ok(self)
	}

	pub fn filter_eq(self, path: &str, value: impl Into<Value>) -> crate::Result<Self> {
		self.filter(path, BinaryOp::Eq, value)
	}

	/// Orders by `path`; a leading `-` sorts descending.
	pub fn order_by(mut self, path: &str) -> crate::Result<Self> {
		self.query.add_ordering(self.db.catalog(), path)?;
		Ok(self)
	}

	pub fn limit(mut self, limit: usize) -> Self {
		self.query.set_limit(limit);
		self
	}

	pub fn only(mut self, names: &[&str]) -> Self {
		self.query.add_immediate_loading(names.iter().copied());
		self
	}

	pub fn defer(mut self, names: &[&str]) -> Self {
		self.query.add_deferred_loading(names.iter().copied());
		self
	}

	pub fn clear_deferred(mut self) -> Self {
		self.query.clear_deferred_loading();
		self
	}

	/// Adds virtual columns to the projection. Once called, only the
	/// requested virtual columns are computed by the query.
	pub fn project(mut self, names: &[&str]) -> crate::Result<Self> {
		self.query.add_virtual_columns(names.iter().copied())?;
		Ok(self)
	}

	/// Projects no virtual columns at all.
	pub fn clear_projection(mut self) -> crate::Result<Self> {
		self.query.clear_virtual_columns()?;
		Ok(self)
	}

	/// Flattens the result to value rows. Paths may cross relations.
	pub fn values(mut self, paths: &[&str]) -> crate::Result<Self> {
		self.query.set_values(self.db.catalog(), paths)?;
		Ok(self)
	}

	pub fn sql(&self) -> crate::Result<CompiledQuery> {
		self.db.compile(&self.query)
	}

	#[instrument(name = "engine::fetch", level = "debug", skip(self), fields(entity = %self.query.entity().name()))]
	pub fn fetch(&self) -> crate::Result<Vec<Entity>> {
		if self.query.is_flattened() {
			return Err(QueryError::Flattened {
				operation: "fetch()",
			}
			.into());
		}

		let compiled = self.sql()?;
		let rows = self.db.execute(&compiled)?;
		debug!(rows = rows.len(), "materializing");

		let entity = self.query.entity();
		Ok(rows.into_iter().map(|row| self.db.materialize(entity, &compiled.columns, row)).collect())
	}

	/// Runs the query as value rows. An entity query is flattened to its
	/// concrete fields first. `None` cells are virtual columns the query
	/// did not compute.
	pub fn fetch_values(&self) -> crate::Result<Vec<Row>> {
		if self.query.is_flattened() {
			return self.db.execute(&self.sql()?);
		}

		let flattened = self.clone().values(&[])?;
		flattened.db.execute(&flattened.sql()?)
	}

	/// The single entity with primary key `pk`.
	pub fn get(&self, pk: impl Into<Value>) -> crate::Result<Entity> {
		let pk = pk.into();
		let entity = self.query.entity().clone();
		let set = self.clone().filter(&entity.primary_key().name, BinaryOp::Eq, pk.clone())?.limit(1);

		set.fetch()?.into_iter().next().ok_or_else(|| {
			EngineError::DoesNotExist {
				entity: entity.name().to_string(),
				key: pk.to_string(),
			}
			.into()
		})
	}
}
