// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Conversions between SQLite cells and [`Value`].

use lume_sql::{OutputColumn, OutputKind};
use lume_type::{DEFERRED_SENTINEL, Type, Value};
use rusqlite::types::{Value as SqlValue, ValueRef};

use crate::error::EngineError;

/// Decodes one cell of a result row.
///
/// Returns `None` for a virtual column that came back as the deferred
/// sentinel. Stored columns never take that path, whatever their content.
pub fn decode(cell: ValueRef<'_>, column: &OutputColumn) -> crate::Result<Option<Value>> {
	if column.kind == OutputKind::Virtual {
		if let ValueRef::Text(text) = cell {
			if text == DEFERRED_SENTINEL.as_bytes() {
				return Ok(None);
			}
		}
	}

	decode_value(cell, &column.name, column.ty).map(Some)
}

pub fn decode_value(cell: ValueRef<'_>, column: &str, ty: Type) -> crate::Result<Value> {
	let value = match (ty, cell) {
		(_, ValueRef::Null) => Value::Undefined,
		(Type::Boolean, ValueRef::Integer(v)) => Value::Boolean(v != 0),
		(Type::Int8, ValueRef::Integer(v)) => Value::Int8(v),
		(Type::Float8, ValueRef::Real(v)) => Value::Float8(v),
		(Type::Float8, ValueRef::Integer(v)) => Value::Float8(v as f64),
		(Type::Utf8, ValueRef::Text(bytes)) => match std::str::from_utf8(bytes) {
			Ok(text) => Value::Utf8(text.to_string()),
			Err(_) => return Err(conversion_error(column, ty, "invalid utf-8")),
		},
		(_, other) => return Err(conversion_error(column, ty, storage_class(other))),
	};
	Ok(value)
}

pub fn to_sql(value: &Value) -> SqlValue {
	match value {
		Value::Undefined => SqlValue::Null,
		Value::Boolean(v) => SqlValue::Integer(*v as i64),
		Value::Int8(v) => SqlValue::Integer(*v),
		Value::Float8(v) => SqlValue::Real(*v),
		Value::Utf8(v) => SqlValue::Text(v.clone()),
	}
}

/// Column type used in `CREATE TABLE`.
pub fn column_type(ty: Type) -> &'static str {
	match ty {
		Type::Boolean | Type::Int8 => "INTEGER",
		Type::Float8 => "REAL",
		Type::Utf8 => "TEXT",
	}
}

fn storage_class(cell: ValueRef<'_>) -> &'static str {
	match cell {
		ValueRef::Null => "NULL",
		ValueRef::Integer(_) => "INTEGER",
		ValueRef::Real(_) => "REAL",
		ValueRef::Text(_) => "TEXT",
		ValueRef::Blob(_) => "BLOB",
	}
}

fn conversion_error(column: &str, expected: Type, found: &str) -> lume_type::Error {
	EngineError::Conversion {
		column: column.to_string(),
		expected,
		found: found.to_string(),
	}
	.into()
}
