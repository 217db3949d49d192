// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Exclusion filters applied wherever the host enumerates fields that must
//! exist physically. Both filters preserve order and are idempotent.

use crate::FieldDef;

/// Fields with a physical column: what DDL, inserts and updates may touch.
pub fn concrete_fields<'a>(fields: impl IntoIterator<Item = &'a FieldDef>) -> impl Iterator<Item = &'a FieldDef> {
	fields.into_iter().filter(|f| f.is_concrete())
}

/// Drops virtual columns from a schema-diff field list, so they never show
/// up as added, removed or altered fields.
pub fn without_virtual_fields(fields: impl IntoIterator<Item = FieldDef>) -> Vec<FieldDef> {
	fields.into_iter().filter(|f| !f.is_virtual()).collect()
}
