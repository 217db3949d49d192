// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{
	fmt::{Debug, Formatter},
	sync::Arc,
};

use indexmap::IndexMap;
use lume_catalog::{CatalogError, EntityDef, FieldKind, Record, RecordMut};
use lume_type::Value;
use tracing::trace;

use crate::{Database, error::EngineError, vcol::VirtualAttribute};

/// Per-instance state of one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
	Unset,
	/// The query chose not to compute a virtual column. Not a value.
	Deferred,
	Loaded(Value),
}

impl Slot {
	pub fn is_loaded(&self) -> bool {
		matches!(self, Slot::Loaded(_))
	}
}

/// One row of an entity type, either materialized from a query or built by
/// the caller and not yet saved.
#[derive(Clone)]
pub struct Entity {
	def: Arc<EntityDef>,
	slots: IndexMap<String, Slot>,
	db: Option<Database>,
	parent: Option<Box<Entity>>,
}

impl Entity {
	pub fn new(def: Arc<EntityDef>) -> Self {
		let slots = def.fields().iter().map(|f| (f.name.clone(), Slot::Unset)).collect();
		Self {
			def,
			slots,
			db: None,
			parent: None,
		}
	}

	/// Links the parent part of a multi-table inheritance chain. Virtual
	/// columns already loaded on the parent are adopted instead of being
	/// computed again.
	pub fn with_parent(mut self, parent: Entity) -> Self {
		self.parent = Some(Box::new(parent));
		self
	}

	pub fn attach(&mut self, db: Database) {
		self.db = Some(db);
	}

	pub fn def(&self) -> &Arc<EntityDef> {
		&self.def
	}

	pub fn database(&self) -> Option<&Database> {
		self.db.as_ref()
	}

	pub fn parent(&self) -> Option<&Entity> {
		self.parent.as_deref()
	}

	/// The primary key, once the instance has been saved or loaded.
	pub fn pk(&self) -> Option<&Value> {
		match self.slots.get(&self.def.primary_key().name) {
			Some(Slot::Loaded(value)) if !value.is_undefined() => Some(value),
			_ => None,
		}
	}

	pub fn slot(&self, name: &str) -> Option<&Slot> {
		self.slots.get(name)
	}

	pub(crate) fn set_slot(&mut self, name: &str, slot: Slot) {
		if let Some(existing) = self.slots.get_mut(name) {
			*existing = slot;
		}
	}

	/// Reads an attribute, loading it on first access when the query that
	/// produced this instance did not.
	pub fn get(&mut self, name: &str) -> crate::Result<Value> {
		let field = self.def.field(name).ok_or_else(|| self.field_not_found(name))?;

		if let FieldKind::Virtual(column) = &field.kind {
			let column = column.clone();
			return VirtualAttribute::new(column).get(self);
		}

		if let Some(Slot::Loaded(value)) = self.slots.get(name) {
			return Ok(value.clone());
		}

		let (Some(pk), Some(db)) = (self.pk(), self.db.as_ref()) else {
			return Ok(Value::Undefined);
		};

		trace!(entity = %self.def.name(), field = %name, "loading deferred field");
		let value = db.fetch_field(&self.def, pk, name)?;
		self.set_slot(name, Slot::Loaded(value.clone()));
		Ok(value)
	}

	/// Assigns an attribute. Virtual columns route the value through their
	/// local write, and fail when they have none.
	pub fn set(&mut self, name: &str, value: impl Into<Value>) -> crate::Result<()> {
		let value = value.into();
		let field = self.def.field(name).ok_or_else(|| self.field_not_found(name))?;

		if let FieldKind::Virtual(column) = &field.kind {
			let column = column.clone();
			return VirtualAttribute::new(column).set(self, value);
		}

		self.set_slot(name, Slot::Loaded(value));
		Ok(())
	}

	/// Stored fields this instance has not loaded. Virtual columns are never
	/// listed.
	pub fn deferred_fields(&self) -> Vec<&str> {
		self.def
			.concrete_fields()
			.filter(|f| !self.slots.get(&f.name).is_some_and(Slot::is_loaded))
			.map(|f| f.name.as_str())
			.collect()
	}

	/// Reloads every loaded attribute from the database.
	pub fn refresh(&mut self) -> crate::Result<()> {
		let Some(db) = self.db.clone() else {
			return Err(EngineError::MissingRow {
				entity: self.def.name().to_string(),
				field: self.def.primary_key().name.clone(),
				key: "<detached>".to_string(),
			}
			.into());
		};
		db.refresh(self)
	}

	fn field_not_found(&self, name: &str) -> lume_type::Error {
		CatalogError::FieldNotFound {
			entity: self.def.name().to_string(),
			field: name.to_string(),
		}
		.into()
	}
}

impl Record for Entity {
	fn entity(&self) -> &EntityDef {
		&self.def
	}

	fn value(&self, field: &str) -> Option<&Value> {
		match self.slots.get(field) {
			Some(Slot::Loaded(value)) => Some(value),
			_ => None,
		}
	}
}

impl RecordMut for Entity {
	fn set_value(&mut self, field: &str, value: Value) {
		self.set_slot(field, Slot::Loaded(value));
	}
}

impl Debug for Entity {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Entity")
			.field("entity", &self.def.name())
			.field("slots", &self.slots)
			.field("attached", &self.db.is_some())
			.field("parent", &self.parent)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use lume_catalog::test_utils::order_catalog;

	use super::*;

	fn order() -> Entity {
		Entity::new(order_catalog().entity("order").unwrap())
	}

	#[test]
	fn test_new_entity_is_unset() {
		let entity = order();
		assert!(entity.pk().is_none());
		assert_eq!(entity.slot("total"), Some(&Slot::Unset));
		assert_eq!(entity.slot("nope"), None);
	}

	#[test]
	fn test_stored_field_roundtrip() {
		let mut entity = order();
		entity.set("subtotal", 12.5).unwrap();
		assert_eq!(entity.get("subtotal").unwrap(), Value::Float8(12.5));
		assert_eq!(entity.value("subtotal"), Some(&Value::Float8(12.5)));
	}

	#[test]
	fn test_unset_stored_field_on_new_instance_is_undefined() {
		let mut entity = order();
		assert_eq!(entity.get("subtotal").unwrap(), Value::Undefined);
	}

	#[test]
	fn test_unknown_field() {
		let mut entity = order();
		assert_eq!(entity.get("nope").unwrap_err().code(), "CATALOG_003");
		assert_eq!(entity.set("nope", 1).unwrap_err().code(), "CATALOG_003");
	}

	#[test]
	fn test_deferred_fields_skip_virtual_columns() {
		let mut entity = order();
		entity.set("id", 1).unwrap();
		entity.set("subtotal", 3.0).unwrap();

		assert_eq!(entity.deferred_fields(), vec!["customer", "customer_code"]);
	}

	#[test]
	fn test_refresh_detached_fails() {
		let mut entity = order();
		entity.set("id", 1).unwrap();
		assert_eq!(entity.refresh().unwrap_err().code(), "VC_002");
	}
}
