// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lume_type::{Diagnostic, Error, IntoDiagnostic, Type};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
	#[error("sqlite: {0}")]
	Sqlite(#[from] rusqlite::Error),

	#[error("cannot convert column `{column}` to {expected}: found {found}")]
	Conversion {
		column: String,
		expected: Type,
		found: String,
	},

	#[error("invalid configuration: {reason}")]
	Config {
		reason: String,
	},

	#[error("no `{entity}` with primary key {key}")]
	DoesNotExist {
		entity: String,
		key: String,
	},

	#[error("virtual column `{entity}.{field}` is read-only")]
	ReadOnly {
		entity: String,
		field: String,
	},

	#[error("cannot load `{entity}.{field}`: no row with primary key {key}")]
	MissingRow {
		entity: String,
		field: String,
		key: String,
	},
}

impl IntoDiagnostic for EngineError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		match self {
			EngineError::Sqlite(err) => Diagnostic {
				code: "ENGINE_001".to_string(),
				message,
				subject: None,
				label: None,
				help: None,
				notes: vec![format!("{err:?}")],
			},

			EngineError::Conversion {
				column,
				..
			} => Diagnostic {
				code: "ENGINE_002".to_string(),
				message,
				subject: Some(column),
				label: Some("unexpected storage class".to_string()),
				help: Some("check that the table was created from the current entity definition".to_string()),
				notes: vec![],
			},

			EngineError::Config {
				..
			} => Diagnostic {
				code: "ENGINE_003".to_string(),
				message,
				subject: None,
				label: None,
				help: Some("see `SqliteConfig` for the accepted keys".to_string()),
				notes: vec![],
			},

			EngineError::DoesNotExist {
				entity,
				..
			} => Diagnostic {
				code: "ENGINE_004".to_string(),
				message,
				subject: Some(entity),
				label: Some("query matched no rows".to_string()),
				help: None,
				notes: vec![],
			},

			EngineError::ReadOnly {
				entity,
				field,
			} => Diagnostic {
				code: "VC_001".to_string(),
				message,
				subject: Some(format!("{entity}.{field}")),
				label: Some("no local write declared".to_string()),
				help: Some("declare the column with `VirtualColumn::write` to accept assignments".to_string()),
				notes: vec![],
			},

			EngineError::MissingRow {
				entity,
				field,
				..
			} => Diagnostic {
				code: "VC_002".to_string(),
				message,
				subject: Some(format!("{entity}.{field}")),
				label: Some("the row is gone or the instance was never saved".to_string()),
				help: Some("save the instance first, or declare a local compute for the column".to_string()),
				notes: vec![],
			},
		}
	}
}

impl From<EngineError> for Error {
	fn from(err: EngineError) -> Self {
		Error(err.into_diagnostic())
	}
}
