// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DbPath {
	Memory,
	File(PathBuf),
}

/// Connection settings for [`Database::open`](crate::Database::open).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
	pub path: DbPath,
	#[serde(with = "millis")]
	pub busy_timeout: Duration,
	pub foreign_keys: bool,
}

impl Default for SqliteConfig {
	fn default() -> Self {
		Self {
			path: DbPath::Memory,
			busy_timeout: Duration::from_millis(5000),
			foreign_keys: true,
		}
	}
}

impl SqliteConfig {
	pub fn in_memory() -> Self {
		Self::default()
	}

	pub fn file(path: impl Into<PathBuf>) -> Self {
		Self::default().path(DbPath::File(path.into()))
	}

	pub fn path(mut self, path: DbPath) -> Self {
		self.path = path;
		self
	}

	pub fn busy_timeout(mut self, timeout: Duration) -> Self {
		self.busy_timeout = timeout;
		self
	}

	pub fn foreign_keys(mut self, enabled: bool) -> Self {
		self.foreign_keys = enabled;
		self
	}

	/// Parses a config such as `{"path": {"file": "app.db"}, "busy_timeout": 250}`.
	/// Missing keys take their defaults.
	pub fn from_json(json: &str) -> crate::Result<Self> {
		serde_json::from_str(json).map_err(|e| {
			EngineError::Config {
				reason: e.to_string(),
			}
			.into()
		})
	}
}

mod millis {
	use std::time::Duration;

	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u64(duration.as_millis() as u64)
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
		Ok(Duration::from_millis(u64::deserialize(deserializer)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default() {
		let config = SqliteConfig::default();
		assert_eq!(config.path, DbPath::Memory);
		assert_eq!(config.busy_timeout, Duration::from_millis(5000));
		assert!(config.foreign_keys);
	}

	#[test]
	fn test_setters() {
		let config = SqliteConfig::file("lume.db").busy_timeout(Duration::from_millis(10)).foreign_keys(false);
		assert_eq!(config.path, DbPath::File(PathBuf::from("lume.db")));
		assert_eq!(config.busy_timeout, Duration::from_millis(10));
		assert!(!config.foreign_keys);
	}

	#[test]
	fn test_from_json() {
		let config = SqliteConfig::from_json(r#"{"path": {"file": "app.db"}, "busy_timeout": 250}"#).unwrap();
		assert_eq!(config.path, DbPath::File(PathBuf::from("app.db")));
		assert_eq!(config.busy_timeout, Duration::from_millis(250));
		assert!(config.foreign_keys);

		let config = SqliteConfig::from_json(r#"{"path": "memory"}"#).unwrap();
		assert_eq!(config.path, DbPath::Memory);
	}

	#[test]
	fn test_from_json_invalid() {
		let err = SqliteConfig::from_json(r#"{"busy_timeout": "soon"}"#).unwrap_err();
		assert_eq!(err.code(), "ENGINE_003");
	}
}
