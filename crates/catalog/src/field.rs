// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use lume_type::Type;

use crate::VirtualColumnDef;

#[derive(Debug, Clone)]
pub struct FieldDef {
	pub name: String,
	pub ty: Type,
	pub nullable: bool,
	pub kind: FieldKind,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
	Stored,
	ForeignKey(ForeignKey),
	Virtual(Arc<VirtualColumnDef>),
}

/// The field a foreign key points at. `target_field` may be a virtual column
/// of the target entity, in which case joins need a replacement condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
	pub target: String,
	pub target_field: String,
}

impl FieldDef {
	pub fn is_virtual(&self) -> bool {
		matches!(self.kind, FieldKind::Virtual(_))
	}

	/// Whether the field is backed by a physical column.
	pub fn is_concrete(&self) -> bool {
		!self.is_virtual()
	}

	pub fn virtual_column(&self) -> Option<&Arc<VirtualColumnDef>> {
		match &self.kind {
			FieldKind::Virtual(column) => Some(column),
			_ => None,
		}
	}

	pub fn foreign_key(&self) -> Option<&ForeignKey> {
		match &self.kind {
			FieldKind::ForeignKey(fk) => Some(fk),
			_ => None,
		}
	}

	/// Compares what a schema diff cares about: type, nullability and
	/// relation target.
	pub fn same_storage(&self, other: &FieldDef) -> bool {
		if self.ty != other.ty || self.nullable != other.nullable {
			return false;
		}
		match (&self.kind, &other.kind) {
			(FieldKind::Stored, FieldKind::Stored) => true,
			(FieldKind::ForeignKey(l), FieldKind::ForeignKey(r)) => l == r,
			(FieldKind::Virtual(_), FieldKind::Virtual(_)) => true,
			_ => false,
		}
	}
}
