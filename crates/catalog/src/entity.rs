// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use indexmap::IndexMap;
use lume_type::Type;

use crate::{
	VirtualColumn, VirtualColumnDef,
	error::CatalogError,
	field::{FieldDef, FieldKind, ForeignKey},
	filter,
};

/// Metadata of an entity type: its table, primary key, stored fields and the
/// ordered registry of its virtual columns.
#[derive(Debug)]
pub struct EntityDef {
	name: String,
	table: String,
	primary_key: usize,
	fields: Vec<FieldDef>,
	virtual_columns: IndexMap<String, Arc<VirtualColumnDef>>,
}

impl EntityDef {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn table(&self) -> &str {
		&self.table
	}

	pub fn primary_key(&self) -> &FieldDef {
		&self.fields[self.primary_key]
	}

	pub fn field(&self, name: &str) -> Option<&FieldDef> {
		self.fields.iter().find(|f| f.name == name)
	}

	/// All declared fields, virtual columns included, in declaration order.
	pub fn fields(&self) -> &[FieldDef] {
		&self.fields
	}

	/// Fields backed by a physical column.
	pub fn concrete_fields(&self) -> impl Iterator<Item = &FieldDef> {
		filter::concrete_fields(&self.fields)
	}

	pub fn virtual_columns(&self) -> impl Iterator<Item = &Arc<VirtualColumnDef>> {
		self.virtual_columns.values()
	}

	pub fn virtual_column(&self, name: &str) -> Option<&Arc<VirtualColumnDef>> {
		self.virtual_columns.get(name)
	}

	pub fn is_virtual(&self, name: &str) -> bool {
		self.virtual_columns.contains_key(name)
	}
}

pub struct EntityBuilder {
	name: String,
	table: Option<String>,
	primary_key: Option<String>,
	fields: Vec<PendingField>,
}

enum PendingField {
	Concrete(FieldDef),
	Virtual {
		name: String,
		ty: Type,
		column: VirtualColumn,
	},
}

impl PendingField {
	fn name(&self) -> &str {
		match self {
			PendingField::Concrete(field) => &field.name,
			PendingField::Virtual {
				name,
				..
			} => name,
		}
	}
}

impl EntityBuilder {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			table: None,
			primary_key: None,
			fields: Vec::new(),
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Table name. Default: the entity name
	pub fn table(mut self, table: impl Into<String>) -> Self {
		self.table = Some(table.into());
		self
	}

	pub fn primary_key(mut self, name: impl Into<String>, ty: Type) -> Self {
		let name = name.into();
		self.primary_key = Some(name.clone());
		self.concrete(name, ty, false, FieldKind::Stored)
	}

	pub fn field(self, name: impl Into<String>, ty: Type) -> Self {
		self.concrete(name.into(), ty, false, FieldKind::Stored)
	}

	pub fn nullable_field(self, name: impl Into<String>, ty: Type) -> Self {
		self.concrete(name.into(), ty, true, FieldKind::Stored)
	}

	pub fn foreign_key(
		self,
		name: impl Into<String>,
		ty: Type,
		target: impl Into<String>,
		target_field: impl Into<String>,
	) -> Self {
		let kind = FieldKind::ForeignKey(ForeignKey {
			target: target.into(),
			target_field: target_field.into(),
		});
		self.concrete(name.into(), ty, true, kind)
	}

	pub fn virtual_column(mut self, name: impl Into<String>, ty: Type, column: VirtualColumn) -> Self {
		self.fields.push(PendingField::Virtual {
			name: name.into(),
			ty,
			column,
		});
		self
	}

	fn concrete(mut self, name: String, ty: Type, nullable: bool, kind: FieldKind) -> Self {
		self.fields.push(PendingField::Concrete(FieldDef {
			name,
			ty,
			nullable,
			kind,
		}));
		self
	}

	pub(crate) fn build(self) -> Result<EntityDef, CatalogError> {
		let table = self.table.unwrap_or_else(|| self.name.clone());

		let mut fields = Vec::with_capacity(self.fields.len());
		let mut virtual_columns = IndexMap::new();

		for pending in self.fields {
			if fields.iter().any(|f: &FieldDef| f.name == pending.name()) {
				return Err(CatalogError::DuplicateField {
					entity: self.name,
					field: pending.name().to_string(),
				});
			}

			let field = match pending {
				PendingField::Concrete(field) => field,
				PendingField::Virtual {
					name,
					ty,
					column,
				} => {
					let def = Arc::new(column.into_def(&self.name, &name, ty));
					virtual_columns.insert(name.clone(), def.clone());
					FieldDef {
						name,
						ty,
						nullable: true,
						kind: FieldKind::Virtual(def),
					}
				}
			};
			fields.push(field);
		}

		let primary_key = self
			.primary_key
			.and_then(|pk| fields.iter().position(|f| f.name == pk))
			.ok_or_else(|| CatalogError::MissingPrimaryKey {
				entity: self.name.clone(),
			})?;

		Ok(EntityDef {
			name: self.name,
			table,
			primary_key,
			fields,
			virtual_columns,
		})
	}
}
