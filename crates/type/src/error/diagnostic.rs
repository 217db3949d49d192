// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::Write;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
	pub code: String,
	pub message: String,
	/// The virtual column, field or entity the diagnostic is about.
	pub subject: Option<String>,
	pub label: Option<String>,
	pub help: Option<String>,
	pub notes: Vec<String>,
}

impl Diagnostic {
	pub fn render(&self) -> String {
		let mut out = String::new();
		let _ = writeln!(out, "Error {}", self.code);
		let _ = writeln!(out, "  {}", self.message);
		if let Some(subject) = &self.subject {
			match &self.label {
				Some(label) => {
					let _ = writeln!(out, "  --> {subject}: {label}");
				}
				None => {
					let _ = writeln!(out, "  --> {subject}");
				}
			}
		}
		if let Some(help) = &self.help {
			let _ = writeln!(out, "  help: {help}");
		}
		for note in &self.notes {
			let _ = writeln!(out, "  note: {note}");
		}
		out
	}
}
