// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, instrument};

use crate::{EntityBuilder, EntityDef, error::CatalogError};

/// Registry of entity types, in registration order.
#[derive(Debug, Default)]
pub struct Catalog {
	entities: IndexMap<String, Arc<EntityDef>>,
}

impl Catalog {
	pub fn new() -> Self {
		Self::default()
	}

	#[instrument(name = "catalog::entity::register", level = "debug", skip(self, builder), fields(entity = builder.name()))]
	pub fn register(&mut self, builder: EntityBuilder) -> crate::Result<Arc<EntityDef>> {
		if self.entities.contains_key(builder.name()) {
			return Err(CatalogError::DuplicateEntity {
				entity: builder.name().to_string(),
			}
			.into());
		}

		let entity = builder.build()?;

		for field in entity.fields() {
			let Some(fk) = field.foreign_key() else {
				continue;
			};
			let target = if fk.target == entity.name() {
				Some(&entity)
			} else {
				self.entities.get(&fk.target).map(|e| e.as_ref())
			};
			let Some(target) = target else {
				return Err(CatalogError::EntityNotFound {
					entity: fk.target.clone(),
				}
				.into());
			};
			if target.field(&fk.target_field).is_none() {
				return Err(CatalogError::FieldNotFound {
					entity: fk.target.clone(),
					field: fk.target_field.clone(),
				}
				.into());
			}
		}

		debug!(
			fields = entity.fields().len(),
			virtual_columns = entity.virtual_columns().count(),
			"entity registered"
		);

		let entity = Arc::new(entity);
		self.entities.insert(entity.name().to_string(), entity.clone());
		Ok(entity)
	}

	pub fn entity(&self, name: &str) -> crate::Result<Arc<EntityDef>> {
		self.find_entity(name).ok_or_else(|| {
			CatalogError::EntityNotFound {
				entity: name.to_string(),
			}
			.into()
		})
	}

	pub fn find_entity(&self, name: &str) -> Option<Arc<EntityDef>> {
		self.entities.get(name).cloned()
	}

	pub fn entities(&self) -> impl Iterator<Item = &Arc<EntityDef>> {
		self.entities.values()
	}
}
