// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use lume_catalog::{Catalog, EntityDef, FieldDef, FieldKind};
use lume_sql::{CompiledQuery, Hooks, OutputColumn, OutputKind, Query, SqlCompiler, quote_name};
use lume_type::{Value, expression::BinaryOp};
use parking_lot::Mutex;
use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};
use tracing::{debug, instrument};

use crate::{
	DbPath, Entity, QuerySet, SqliteConfig,
	convert::{self, column_type, to_sql},
	entity::Slot,
	error::EngineError,
	vcol::{VirtualAttribute, VirtualColumns},
};

/// A row as decoded from SQLite. `None` marks a deferred virtual column.
pub type Row = Vec<Option<Value>>;

/// Handle to one SQLite connection and the catalog describing its tables.
#[derive(Clone)]
pub struct Database {
	inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
	connection: Mutex<Connection>,
	catalog: Arc<Catalog>,
	hooks: Hooks,
	queries: AtomicUsize,
}

impl Database {
	#[instrument(name = "engine::open", level = "debug", skip(catalog), fields(path = ?config.path))]
	pub fn open(config: SqliteConfig, catalog: Arc<Catalog>) -> crate::Result<Self> {
		let connection = match &config.path {
			DbPath::Memory => Connection::open_in_memory(),
			DbPath::File(path) => Connection::open(path),
		}
		.map_err(EngineError::from)?;

		connection.busy_timeout(config.busy_timeout).map_err(EngineError::from)?;
		connection.pragma_update(None, "foreign_keys", config.foreign_keys).map_err(EngineError::from)?;

		Ok(Self {
			inner: Arc::new(DatabaseInner {
				connection: Mutex::new(connection),
				catalog,
				hooks: VirtualColumns::hooks(),
				queries: AtomicUsize::new(0),
			}),
		})
	}

	pub fn catalog(&self) -> &Arc<Catalog> {
		&self.inner.catalog
	}

	pub fn hooks(&self) -> &Hooks {
		&self.inner.hooks
	}

	/// Number of statements run through this handle so far.
	pub fn query_count(&self) -> usize {
		self.inner.queries.load(Ordering::SeqCst)
	}

	pub fn execute_batch(&self, sql: &str) -> crate::Result<()> {
		self.inner.queries.fetch_add(1, Ordering::SeqCst);
		self.inner.connection.lock().execute_batch(sql).map_err(EngineError::from)?;
		Ok(())
	}

	/// Creates a table per registered entity. Only concrete fields become
	/// columns.
	#[instrument(name = "engine::create_schema", level = "debug", skip(self))]
	pub fn create_schema(&self) -> crate::Result<()> {
		let mut ddl = String::new();
		for entity in self.inner.catalog.entities() {
			let columns: Vec<String> = entity.concrete_fields().map(|f| self.column_ddl(entity, f)).collect();
			ddl.push_str(&format!(
				"CREATE TABLE IF NOT EXISTS {} ({});\n",
				quote_name(entity.table()),
				columns.join(", ")
			));
		}
		debug!(%ddl, "creating schema");
		self.execute_batch(&ddl)
	}

	fn column_ddl(&self, entity: &EntityDef, field: &FieldDef) -> String {
		let mut ddl = format!("{} {}", quote_name(&field.name), column_type(field.ty));

		if field.name == entity.primary_key().name {
			ddl.push_str(" PRIMARY KEY");
			return ddl;
		}
		if !field.nullable {
			ddl.push_str(" NOT NULL");
		}
		if let FieldKind::ForeignKey(fk) = &field.kind {
			let target = self.inner.catalog.find_entity(&fk.target);
			if let Some(target) = target.filter(|t| !t.is_virtual(&fk.target_field)) {
				ddl.push_str(&format!(" REFERENCES {} ({})", quote_name(target.table()), quote_name(&fk.target_field)));
			}
		}
		ddl
	}

	/// A new, unsaved instance bound to this database.
	pub fn new_entity(&self, name: &str) -> crate::Result<Entity> {
		let mut entity = Entity::new(self.inner.catalog.entity(name)?);
		entity.attach(self.clone());
		Ok(entity)
	}

	pub fn objects(&self, name: &str) -> crate::Result<QuerySet> {
		Ok(QuerySet::new(self.clone(), Query::new(self.inner.catalog.entity(name)?)))
	}

	/// Inserts or updates the loaded concrete fields of `entity`. Virtual
	/// columns are never written.
	#[instrument(name = "engine::save", level = "debug", skip(self, entity), fields(entity = %entity.def().name()))]
	pub fn save(&self, entity: &mut Entity) -> crate::Result<()> {
		let def = entity.def().clone();
		let pk_name = def.primary_key().name.clone();

		let fields: Vec<(&str, Value)> = def
			.concrete_fields()
			.filter(|f| f.name != pk_name)
			.filter_map(|f| match entity.slot(&f.name) {
				Some(Slot::Loaded(value)) => Some((f.name.as_str(), value.clone())),
				_ => None,
			})
			.collect();

		if let Some(pk) = entity.pk().cloned() {
			if self.update(&def, &pk_name, &pk, &fields)? > 0 {
				entity.attach(self.clone());
				return Ok(());
			}
			let mut fields = fields;
			fields.insert(0, (pk_name.as_str(), pk));
			self.insert(&def, &fields)?;
		} else {
			let rowid = self.insert(&def, &fields)?;
			entity.set_slot(&pk_name, Slot::Loaded(Value::Int8(rowid)));
		}

		entity.attach(self.clone());
		Ok(())
	}

	fn update(&self, def: &EntityDef, pk_name: &str, pk: &Value, fields: &[(&str, Value)]) -> crate::Result<usize> {
		let mut assignments: Vec<String> =
			fields.iter().map(|(name, _)| format!("{} = ?", quote_name(name))).collect();
		if assignments.is_empty() {
			assignments.push(format!("{0} = {0}", quote_name(pk_name)));
		}
		let sql = format!(
			"UPDATE {} SET {} WHERE {} = ?",
			quote_name(def.table()),
			assignments.join(", "),
			quote_name(pk_name)
		);
		let params: Vec<SqlValue> =
			fields.iter().map(|(_, value)| to_sql(value)).chain(std::iter::once(to_sql(pk))).collect();

		debug!(%sql, "update");
		self.inner.queries.fetch_add(1, Ordering::SeqCst);
		let updated =
			self.inner.connection.lock().execute(&sql, params_from_iter(params.iter())).map_err(EngineError::from)?;
		Ok(updated)
	}

	fn insert(&self, def: &EntityDef, fields: &[(&str, Value)]) -> crate::Result<i64> {
		let sql = if fields.is_empty() {
			format!("INSERT INTO {} DEFAULT VALUES", quote_name(def.table()))
		} else {
			let names: Vec<String> = fields.iter().map(|(name, _)| quote_name(name)).collect();
			let placeholders = vec!["?"; fields.len()].join(", ");
			format!("INSERT INTO {} ({}) VALUES ({})", quote_name(def.table()), names.join(", "), placeholders)
		};
		let params: Vec<SqlValue> = fields.iter().map(|(_, value)| to_sql(value)).collect();

		debug!(%sql, "insert");
		self.inner.queries.fetch_add(1, Ordering::SeqCst);
		let connection = self.inner.connection.lock();
		connection.execute(&sql, params_from_iter(params.iter())).map_err(EngineError::from)?;
		Ok(connection.last_insert_rowid())
	}

	pub fn compile(&self, query: &Query) -> crate::Result<CompiledQuery> {
		SqlCompiler::new(&self.inner.catalog, query, &self.inner.hooks).as_sql()
	}

	#[instrument(name = "engine::execute", level = "debug", skip(self, compiled), fields(sql = %compiled.sql.text))]
	pub(crate) fn execute(&self, compiled: &CompiledQuery) -> crate::Result<Vec<Row>> {
		let params: Vec<SqlValue> = compiled.sql.params.iter().map(to_sql).collect();

		self.inner.queries.fetch_add(1, Ordering::SeqCst);
		let connection = self.inner.connection.lock();
		let mut statement = connection.prepare(&compiled.sql.text).map_err(EngineError::from)?;
		let mut rows = statement.query(params_from_iter(params.iter())).map_err(EngineError::from)?;

		let mut result = Vec::new();
		while let Some(row) = rows.next().map_err(EngineError::from)? {
			let mut decoded = Vec::with_capacity(compiled.columns.len());
			for (i, column) in compiled.columns.iter().enumerate() {
				let cell = row.get_ref(i).map_err(EngineError::from)?;
				decoded.push(convert::decode(cell, column)?);
			}
			result.push(decoded);
		}

		debug!(rows = result.len(), "executed");
		Ok(result)
	}

	/// Loads a single attribute of one row by primary key.
	#[instrument(name = "engine::fetch_field", level = "debug", skip(self, entity), fields(entity = %entity.name()))]
	pub(crate) fn fetch_field(&self, entity: &Arc<EntityDef>, pk: &Value, field: &str) -> crate::Result<Value> {
		let mut query = Query::new(entity.clone());
		query.add_filter(&self.inner.catalog, &entity.primary_key().name, BinaryOp::Eq, pk.clone())?;
		query.set_values(&self.inner.catalog, &[field])?;

		let compiled = self.compile(&query)?;
		let row = self.execute(&compiled)?.into_iter().next().ok_or_else(|| EngineError::MissingRow {
			entity: entity.name().to_string(),
			field: field.to_string(),
			key: pk.to_string(),
		})?;

		Ok(row.into_iter().next().flatten().unwrap_or(Value::Undefined))
	}

	/// Reloads the loaded attributes of `entity`. Fetched values replace
	/// loaded ones without going through local writes.
	#[instrument(name = "engine::refresh", level = "debug", skip(self, entity), fields(entity = %entity.def().name()))]
	pub(crate) fn refresh(&self, entity: &mut Entity) -> crate::Result<()> {
		let def = entity.def().clone();
		let pk_name = def.primary_key().name.clone();
		let Some(pk) = entity.pk().cloned() else {
			return Err(EngineError::MissingRow {
				entity: def.name().to_string(),
				field: pk_name,
				key: "<unsaved>".to_string(),
			}
			.into());
		};

		let loaded = |name: &str| entity.slot(name).is_some_and(Slot::is_loaded);
		let stored: Vec<&str> = def.concrete_fields().map(|f| f.name.as_str()).filter(|&n| loaded(n)).collect();
		let virtuals: Vec<&str> = def.virtual_columns().map(|c| c.name()).filter(|&n| loaded(n)).collect();

		let mut query = Query::new(def.clone());
		query.add_filter(&self.inner.catalog, &pk_name, BinaryOp::Eq, pk.clone())?;
		query.add_immediate_loading(stored);
		if virtuals.is_empty() {
			query.clear_virtual_columns()?;
		} else {
			query.add_virtual_columns(virtuals)?;
		}

		let compiled = self.compile(&query)?;
		let row = self.execute(&compiled)?.into_iter().next().ok_or_else(|| EngineError::MissingRow {
			entity: def.name().to_string(),
			field: pk_name.clone(),
			key: pk.to_string(),
		})?;

		apply_row(&def, entity, &compiled.columns, row);
		Ok(())
	}

	pub(crate) fn materialize(&self, def: &Arc<EntityDef>, columns: &[OutputColumn], row: Row) -> Entity {
		let mut entity = Entity::new(def.clone());
		entity.attach(self.clone());
		apply_row(def, &mut entity, columns, row);
		entity
	}
}

fn apply_row(def: &EntityDef, entity: &mut Entity, columns: &[OutputColumn], row: Row) {
	for (column, cell) in columns.iter().zip(row) {
		match column.kind {
			OutputKind::Stored => entity.set_slot(&column.name, Slot::Loaded(cell.unwrap_or(Value::Undefined))),
			OutputKind::Virtual => {
				if let Some(def) = def.virtual_column(&column.name) {
					VirtualAttribute::new(def.clone()).populate(entity, cell);
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use lume_catalog::test_utils::order_catalog;

	use super::*;
	use crate::test_utils::create_test_database;

	fn table_info(db: &Database, table: &str) -> Vec<(String, bool)> {
		let connection = db.inner.connection.lock();
		let mut statement = connection.prepare(&format!("PRAGMA table_info({})", quote_name(table))).unwrap();
		statement
			.query_map([], |row| Ok((row.get::<_, String>(1)?, row.get::<_, bool>(3)?)))
			.unwrap()
			.collect::<rusqlite::Result<Vec<_>>>()
			.unwrap()
	}

	fn column_names(db: &Database, table: &str) -> Vec<String> {
		table_info(db, table).into_iter().map(|(name, _)| name).collect()
	}

	#[test]
	fn test_schema_stores_concrete_fields_only() {
		let db = create_test_database(order_catalog());

		assert_eq!(column_names(&db, "orders"), vec!["id", "subtotal", "customer", "customer_code"]);
		assert_eq!(column_names(&db, "customer"), vec!["id", "handle", "name"]);

		for entity in db.catalog().entities() {
			let concrete: Vec<String> = entity.concrete_fields().map(|f| f.name.clone()).collect();
			assert_eq!(column_names(&db, entity.table()), concrete);
		}
	}

	#[test]
	fn test_schema_nullability() {
		let db = create_test_database(order_catalog());

		assert_eq!(
			table_info(&db, "customer"),
			vec![("id".to_string(), false), ("handle".to_string(), true), ("name".to_string(), false)]
		);
	}
}
