// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use tracing::{debug, instrument};

use crate::{
	filter,
	migration::{ModelState, ProjectState},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChange {
	CreateModel {
		model: String,
		fields: Vec<String>,
	},
	DeleteModel {
		model: String,
	},
	AddField {
		model: String,
		field: String,
	},
	RemoveField {
		model: String,
		field: String,
	},
	AlterField {
		model: String,
		field: String,
	},
}

pub struct MigrationAutodetector {
	from_state: ProjectState,
	to_state: ProjectState,
}

impl MigrationAutodetector {
	/// Both states lose their virtual columns here, before any comparison.
	pub fn new(from_state: ProjectState, to_state: ProjectState) -> Self {
		Self {
			from_state: strip_virtual_fields(from_state),
			to_state: strip_virtual_fields(to_state),
		}
	}

	pub fn from_state(&self) -> &ProjectState {
		&self.from_state
	}

	pub fn to_state(&self) -> &ProjectState {
		&self.to_state
	}

	#[instrument(name = "catalog::migration::changes", level = "debug", skip(self))]
	pub fn changes(&self) -> Vec<SchemaChange> {
		let mut changes = Vec::new();

		for (name, new) in &self.to_state.models {
			match self.from_state.models.get(name) {
				None => changes.push(SchemaChange::CreateModel {
					model: name.clone(),
					fields: new.fields.iter().map(|f| f.name.clone()).collect(),
				}),
				Some(old) => diff_fields(old, new, &mut changes),
			}
		}

		for name in self.from_state.models.keys() {
			if !self.to_state.models.contains_key(name) {
				changes.push(SchemaChange::DeleteModel {
					model: name.clone(),
				});
			}
		}

		debug!(changes = changes.len(), "schema diff computed");
		changes
	}
}

fn strip_virtual_fields(mut state: ProjectState) -> ProjectState {
	for model in state.models.values_mut() {
		model.fields = filter::without_virtual_fields(std::mem::take(&mut model.fields));
	}
	state
}

fn diff_fields(old: &ModelState, new: &ModelState, changes: &mut Vec<SchemaChange>) {
	for field in &new.fields {
		match old.field(&field.name) {
			None => changes.push(SchemaChange::AddField {
				model: new.name.clone(),
				field: field.name.clone(),
			}),
			Some(previous) if !previous.same_storage(field) => changes.push(SchemaChange::AlterField {
				model: new.name.clone(),
				field: field.name.clone(),
			}),
			Some(_) => {}
		}
	}
	for field in &old.fields {
		if new.field(&field.name).is_none() {
			changes.push(SchemaChange::RemoveField {
				model: new.name.clone(),
				field: field.name.clone(),
			});
		}
	}
}
