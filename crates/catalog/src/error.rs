// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lume_type::{Diagnostic, Error, IntoDiagnostic};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
	#[error("field `{field}` is declared twice on entity `{entity}`")]
	DuplicateField {
		entity: String,
		field: String,
	},

	#[error("entity `{entity}` not found")]
	EntityNotFound {
		entity: String,
	},

	#[error("field `{field}` not found on entity `{entity}`")]
	FieldNotFound {
		entity: String,
		field: String,
	},

	#[error("entity `{entity}` declares no primary key")]
	MissingPrimaryKey {
		entity: String,
	},

	#[error("entity `{entity}` is already registered")]
	DuplicateEntity {
		entity: String,
	},
}

impl IntoDiagnostic for CatalogError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		match self {
			CatalogError::DuplicateField {
				entity,
				field,
			} => Diagnostic {
				code: "CATALOG_001".to_string(),
				message,
				subject: Some(format!("{entity}.{field}")),
				label: Some("field name already taken".to_string()),
				help: Some("stored fields and virtual columns share one namespace per entity".to_string()),
				notes: vec![],
			},

			CatalogError::EntityNotFound {
				entity,
			} => Diagnostic {
				code: "CATALOG_002".to_string(),
				message,
				subject: Some(entity),
				label: None,
				help: Some("register the entity before referencing it".to_string()),
				notes: vec!["foreign keys may only target entities registered earlier, or the entity itself"
					.to_string()],
			},

			CatalogError::FieldNotFound {
				entity,
				field,
			} => Diagnostic {
				code: "CATALOG_003".to_string(),
				message,
				subject: Some(format!("{entity}.{field}")),
				label: Some("unknown field".to_string()),
				help: Some("check for typos in the field name".to_string()),
				notes: vec![],
			},

			CatalogError::MissingPrimaryKey {
				entity,
			} => Diagnostic {
				code: "CATALOG_004".to_string(),
				message,
				subject: Some(entity),
				label: None,
				help: Some("declare a primary key with `EntityBuilder::primary_key`".to_string()),
				notes: vec!["virtual columns are fetched and written back by primary key".to_string()],
			},

			CatalogError::DuplicateEntity {
				entity,
			} => Diagnostic {
				code: "CATALOG_005".to_string(),
				message,
				subject: Some(entity),
				label: None,
				help: None,
				notes: vec![],
			},
		}
	}
}

impl From<CatalogError> for Error {
	fn from(err: CatalogError) -> Self {
		Error(err.into_diagnostic())
	}
}
