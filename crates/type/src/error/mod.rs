// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

mod diagnostic;

pub use diagnostic::Diagnostic;

/// The unified error type of the lume crates. Every crate-local error enum
/// converts into it through [`IntoDiagnostic`].
#[derive(Debug, Clone, PartialEq)]
pub struct Error(pub Diagnostic);

impl Error {
	pub fn diagnostic(self) -> Diagnostic {
		self.0
	}

	pub fn code(&self) -> &str {
		&self.0.code
	}
}

impl Display for Error {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0.render())
	}
}

impl std::error::Error for Error {}

pub trait IntoDiagnostic {
	fn into_diagnostic(self) -> Diagnostic;
}

impl IntoDiagnostic for Diagnostic {
	fn into_diagnostic(self) -> Diagnostic {
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_exposes_code_and_rendered_message() {
		let err = Error(Diagnostic {
			code: "QUERY_001".to_string(),
			message: "unknown field `order.missing`".to_string(),
			subject: Some("order.missing".to_string()),
			label: None,
			help: None,
			notes: vec![],
		});
		assert_eq!(err.code(), "QUERY_001");
		assert!(err.to_string().starts_with("Error QUERY_001\n"));
		assert!(err.to_string().contains("--> order.missing"));
	}
}
