// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use lume_type::{Diagnostic, Error, IntoDiagnostic};

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
	#[error("cannot resolve `{path}` on entity `{entity}`")]
	UnknownField {
		entity: String,
		path: String,
	},

	#[error("`{field}` on entity `{entity}` is not a relation")]
	NotARelation {
		entity: String,
		field: String,
	},

	#[error("cannot call {operation} after the query was flattened with values()")]
	Flattened {
		operation: &'static str,
	},

	#[error("cannot compile virtual column `{field}` against alias `{alias}`")]
	UnsupportedQueryShape {
		alias: String,
		field: String,
	},

	#[error("virtual column `{entity}.{field}` refers to itself")]
	RecursiveExpression {
		entity: String,
		field: String,
	},

	#[error("`{name}` is not a virtual column of entity `{entity}`")]
	NotAVirtualColumn {
		entity: String,
		name: String,
	},

	#[error("virtual column `{entity}.{field}` has no physical column")]
	MissingColumnCompiler {
		entity: String,
		field: String,
	},
}

impl IntoDiagnostic for QueryError {
	fn into_diagnostic(self) -> Diagnostic {
		let message = self.to_string();
		match self {
			QueryError::UnknownField {
				entity,
				path,
			} => Diagnostic {
				code: "QUERY_001".to_string(),
				message,
				subject: Some(format!("{entity}.{path}")),
				label: Some("this field does not exist in the current context".to_string()),
				help: Some("check for typos; related fields are addressed as `relation__field`".to_string()),
				notes: vec![],
			},

			QueryError::NotARelation {
				entity,
				field,
			} => Diagnostic {
				code: "QUERY_002".to_string(),
				message,
				subject: Some(format!("{entity}.{field}")),
				label: Some("only foreign keys can be traversed".to_string()),
				help: None,
				notes: vec![],
			},

			QueryError::Flattened {
				operation,
			} => Diagnostic {
				code: "QUERY_003".to_string(),
				message,
				subject: Some(operation.to_string()),
				label: Some("query already returns value tuples".to_string()),
				help: Some(format!("call {operation} before values()")),
				notes: vec![
					"a flattened query no longer materializes entities, so virtual columns cannot be requested or removed"
						.to_string(),
				],
			},

			QueryError::UnsupportedQueryShape {
				alias,
				field,
			} => Diagnostic {
				code: "QUERY_004".to_string(),
				message,
				subject: Some(format!("{alias}.{field}")),
				label: Some("alias is neither the base table nor a join".to_string()),
				help: None,
				notes: vec!["virtual columns compile against the base table or a joined table only".to_string()],
			},

			QueryError::RecursiveExpression {
				entity,
				field,
			} => Diagnostic {
				code: "QUERY_005".to_string(),
				message,
				subject: Some(format!("{entity}.{field}")),
				label: Some("expression cycle".to_string()),
				help: Some("break the cycle between the virtual column expressions".to_string()),
				notes: vec![],
			},

			QueryError::NotAVirtualColumn {
				entity,
				name,
			} => Diagnostic {
				code: "QUERY_006".to_string(),
				message,
				subject: Some(format!("{entity}.{name}")),
				label: None,
				help: Some("use only()/defer() for stored fields".to_string()),
				notes: vec![],
			},

			QueryError::MissingColumnCompiler {
				entity,
				field,
			} => Diagnostic {
				code: "QUERY_007".to_string(),
				message,
				subject: Some(format!("{entity}.{field}")),
				label: None,
				help: Some("register a column compiler hook for virtual columns".to_string()),
				notes: vec![],
			},
		}
	}
}

impl From<QueryError> for Error {
	fn from(err: QueryError) -> Self {
		Error(err.into_diagnostic())
	}
}
