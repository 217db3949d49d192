// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use indexmap::IndexMap;

use crate::{Catalog, EntityDef, FieldDef};

#[derive(Debug, Clone)]
pub struct ModelState {
	pub name: String,
	pub table: String,
	pub fields: Vec<FieldDef>,
}

impl ModelState {
	pub fn from_entity(entity: &EntityDef) -> Self {
		Self {
			name: entity.name().to_string(),
			table: entity.table().to_string(),
			fields: entity.fields().to_vec(),
		}
	}

	pub fn field(&self, name: &str) -> Option<&FieldDef> {
		self.fields.iter().find(|f| f.name == name)
	}

	pub fn field_keys(&self) -> Vec<&str> {
		self.fields.iter().map(|f| f.name.as_str()).collect()
	}
}

#[derive(Debug, Clone, Default)]
pub struct ProjectState {
	pub models: IndexMap<String, ModelState>,
}

impl ProjectState {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_catalog(catalog: &Catalog) -> Self {
		Self {
			models: catalog
				.entities()
				.map(|entity| (entity.name().to_string(), ModelState::from_entity(entity)))
				.collect(),
		}
	}
}
