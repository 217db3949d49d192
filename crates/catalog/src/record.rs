// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lume_type::Value;

use crate::EntityDef;

/// Read access to an entity instance, handed to a virtual column's local
/// compute function.
pub trait Record {
	fn entity(&self) -> &EntityDef;

	/// The loaded value of a field. `None` when the field was not fetched or
	/// not computed yet.
	fn value(&self, field: &str) -> Option<&Value>;
}

/// Write access to an entity instance, handed to a virtual column's local
/// write function.
///
/// `set_value` stores a raw value without going through the virtual column
/// protocol.
pub trait RecordMut: Record {
	fn set_value(&mut self, field: &str, value: Value);
}
