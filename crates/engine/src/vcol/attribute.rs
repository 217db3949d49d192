// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use lume_catalog::{Record, RecordMut, VirtualColumnDef};
use lume_type::Value;
use tracing::{instrument, trace};

use crate::{
	entity::{Entity, Slot},
	error::EngineError,
};

/// Reads and writes one virtual column on entity instances.
///
/// There are two ways a value gets into the slot. Callers go through
/// [`set`](Self::set), which routes the value through the column's local
/// write. Query results go through [`populate`](Self::populate), which
/// records what the database returned and never calls the local write.
pub struct VirtualAttribute {
	def: Arc<VirtualColumnDef>,
}

impl VirtualAttribute {
	pub fn new(def: Arc<VirtualColumnDef>) -> Self {
		Self {
			def,
		}
	}

	pub fn def(&self) -> &Arc<VirtualColumnDef> {
		&self.def
	}

	/// Returns the loaded value, computing it at most once per instance.
	#[instrument(name = "vcol::get", level = "trace", skip(self, entity), fields(column = %self.def.name()))]
	pub fn get(&self, entity: &mut Entity) -> crate::Result<Value> {
		let name = self.def.name();

		if let Some(Slot::Loaded(value)) = entity.slot(name) {
			return Ok(value.clone());
		}

		let value = match inherited(entity, name) {
			Some(value) => {
				trace!("adopted value from parent");
				value
			}
			None => self.compute(entity)?,
		};

		entity.set_slot(name, Slot::Loaded(value.clone()));
		Ok(value)
	}

	fn compute(&self, entity: &Entity) -> crate::Result<Value> {
		if let Some(compute) = self.def.local_compute() {
			trace!("local compute");
			let record: &dyn Record = entity;
			return compute(record);
		}

		let missing = || EngineError::MissingRow {
			entity: entity.def().name().to_string(),
			field: self.def.name().to_string(),
			key: entity.pk().map(|pk| pk.to_string()).unwrap_or_else(|| "<unsaved>".to_string()),
		};

		let (Some(pk), Some(db)) = (entity.pk(), entity.database()) else {
			return Err(missing().into());
		};

		trace!(%pk, "fetching from database");
		db.fetch_field(entity.def(), pk, self.def.name())
	}

	/// Assignment by a caller. Unsaved instances always go through the local
	/// write; saved ones skip it when the value is unchanged.
	pub fn set(&self, entity: &mut Entity, value: Value) -> crate::Result<()> {
		let name = self.def.name();

		if entity.pk().is_some() {
			if let Some(Slot::Loaded(current)) = entity.slot(name) {
				if *current == value {
					return Ok(());
				}
			}
		}

		let Some(write) = self.def.local_write() else {
			return Err(EngineError::ReadOnly {
				entity: entity.def().name().to_string(),
				field: name.to_string(),
			}
			.into());
		};

		let record: &mut dyn RecordMut = &mut *entity;
		write(record, &value)?;
		entity.set_slot(name, Slot::Loaded(value));
		Ok(())
	}

	/// Records a value produced by a query. `None` means the query deferred
	/// the column; it never replaces a loaded value.
	pub fn populate(&self, entity: &mut Entity, value: Option<Value>) {
		let name = self.def.name();

		if let Some(Slot::Loaded(current)) = entity.slot(name) {
			match &value {
				None => return,
				Some(value) if value == current => return,
				Some(_) => {}
			}
		}

		let slot = match value {
			Some(value) => Slot::Loaded(value),
			None => Slot::Deferred,
		};
		entity.set_slot(name, slot);
	}
}

fn inherited(entity: &Entity, name: &str) -> Option<Value> {
	let mut parent = entity.parent();
	while let Some(current) = parent {
		if let Some(Slot::Loaded(value)) = current.slot(name) {
			return Some(value.clone());
		}
		parent = current.parent();
	}
	None
}

#[cfg(test)]
mod tests {
	use std::sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	};

	use lume_catalog::{
		Catalog, VirtualColumn,
		test_utils::{build_catalog, customer_entity, customer_code_column, order_discounted_column, order_entity},
	};
	use lume_type::Expr;

	use super::*;

	fn catalog_with_total(total: VirtualColumn) -> Catalog {
		build_catalog(customer_entity(customer_code_column()), order_entity(total, order_discounted_column()))
	}

	fn attribute(catalog: &Catalog) -> (Entity, VirtualAttribute) {
		let order = catalog.entity("order").unwrap();
		let def = order.virtual_column("total").unwrap().clone();
		(Entity::new(order), VirtualAttribute::new(def))
	}

	fn total_column() -> VirtualColumn {
		VirtualColumn::new(Expr::field("subtotal") * Expr::constant(1.1))
	}

	#[test]
	fn test_compute_runs_once() {
		let calls = Arc::new(AtomicUsize::new(0));
		let counter = calls.clone();
		let catalog = catalog_with_total(total_column().compute(move |record| {
			counter.fetch_add(1, Ordering::SeqCst);
			let subtotal = record.value("subtotal").and_then(Value::as_f64).unwrap_or_default();
			Ok(Value::Float8(subtotal * 2.0))
		}));
		let (mut entity, attr) = attribute(&catalog);
		entity.set("subtotal", 5.0).unwrap();

		assert_eq!(attr.get(&mut entity).unwrap(), Value::Float8(10.0));
		assert_eq!(attr.get(&mut entity).unwrap(), Value::Float8(10.0));
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_deferred_slot_is_computed_on_read() {
		let catalog = catalog_with_total(total_column().compute(|_| Ok(Value::Float8(1.0))));
		let (mut entity, attr) = attribute(&catalog);
		entity.set("id", 1).unwrap();

		attr.populate(&mut entity, None);
		assert_eq!(entity.slot("total"), Some(&Slot::Deferred));

		assert_eq!(attr.get(&mut entity).unwrap(), Value::Float8(1.0));
		assert_eq!(entity.slot("total"), Some(&Slot::Loaded(Value::Float8(1.0))));
	}

	#[test]
	fn test_populate_does_not_call_write() {
		let writes = Arc::new(AtomicUsize::new(0));
		let counter = writes.clone();
		let catalog = catalog_with_total(total_column().write(move |_, _| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}));
		let (mut entity, attr) = attribute(&catalog);
		entity.set("id", 1).unwrap();

		attr.populate(&mut entity, Some(Value::Float8(11.0)));
		attr.populate(&mut entity, Some(Value::Float8(11.0)));
		attr.populate(&mut entity, Some(Value::Float8(12.0)));

		assert_eq!(writes.load(Ordering::SeqCst), 0);
		assert_eq!(entity.slot("total"), Some(&Slot::Loaded(Value::Float8(12.0))));
	}

	#[test]
	fn test_deferred_marker_never_replaces_value() {
		let catalog = catalog_with_total(total_column());
		let (mut entity, attr) = attribute(&catalog);
		entity.set("id", 1).unwrap();

		attr.populate(&mut entity, Some(Value::Float8(11.0)));
		attr.populate(&mut entity, None);

		assert_eq!(entity.slot("total"), Some(&Slot::Loaded(Value::Float8(11.0))));
	}

	#[test]
	fn test_read_only_on_new_instance() {
		let catalog = catalog_with_total(total_column());
		let (mut entity, attr) = attribute(&catalog);

		let err = attr.set(&mut entity, Value::Float8(3.0)).unwrap_err();
		assert_eq!(err.code(), "VC_001");
		assert_eq!(entity.slot("total"), Some(&Slot::Unset));
	}

	#[test]
	fn test_read_only_allows_unchanged_value() {
		let catalog = catalog_with_total(total_column());
		let (mut entity, attr) = attribute(&catalog);
		entity.set("id", 1).unwrap();
		attr.populate(&mut entity, Some(Value::Float8(11.0)));

		attr.set(&mut entity, Value::Float8(11.0)).unwrap();
		assert_eq!(attr.set(&mut entity, Value::Float8(12.0)).unwrap_err().code(), "VC_001");
	}

	#[test]
	fn test_write_on_new_instance_updates_record() {
		let catalog = catalog_with_total(total_column().write(|record, value| {
			let total = value.as_f64().unwrap_or_default();
			record.set_value("subtotal", Value::Float8(total / 1.1));
			Ok(())
		}));
		let (mut entity, attr) = attribute(&catalog);

		attr.set(&mut entity, Value::Float8(11.0)).unwrap();

		let subtotal = entity.get("subtotal").unwrap().as_f64().unwrap();
		assert!((subtotal - 10.0).abs() < 1e-9);
		assert_eq!(entity.slot("total"), Some(&Slot::Loaded(Value::Float8(11.0))));
	}

	#[test]
	fn test_nan_always_counts_as_a_change() {
		let writes = Arc::new(AtomicUsize::new(0));
		let counter = writes.clone();
		let catalog = catalog_with_total(total_column().write(move |_, _| {
			counter.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}));
		let (mut entity, attr) = attribute(&catalog);
		entity.set("id", 1).unwrap();
		attr.populate(&mut entity, Some(Value::Float8(f64::NAN)));

		attr.set(&mut entity, Value::Float8(f64::NAN)).unwrap();
		assert_eq!(writes.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_value_adopted_from_parent() {
		let catalog = catalog_with_total(total_column());
		let (mut parent, attr) = attribute(&catalog);
		parent.set("id", 1).unwrap();
		attr.populate(&mut parent, Some(Value::Float8(4.0)));

		let (child, _) = attribute(&catalog);
		let mut child = child.with_parent(parent);

		assert_eq!(attr.get(&mut child).unwrap(), Value::Float8(4.0));
	}

	#[test]
	fn test_missing_database_is_missing_row() {
		let catalog = catalog_with_total(total_column());
		let (mut entity, attr) = attribute(&catalog);
		entity.set("id", 7).unwrap();

		let err = attr.get(&mut entity).unwrap_err();
		assert_eq!(err.code(), "VC_002");
	}
}
