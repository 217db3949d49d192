// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Query object and SQLite compiler.
//!
//! The compiler knows nothing about virtual columns. It renders stored
//! columns and structural join conditions itself and defers to the
//! [`hook`] traits for everything else.

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod compile;
pub mod emit;
pub mod error;
pub mod hook;
pub mod query;

pub use compile::{CompiledQuery, OutputColumn, OutputKind, SqlCompiler};
pub use emit::{ExprEmitter, Scope, Sql, qualified, quote_name};
pub use error::QueryError;
pub use hook::{ColumnCompiler, Hooks, JoinConditionCompiler, ProjectionResolver};
pub use lume_type::Result;
pub use query::{
	BaseTable, ColumnRef, DeferredLoading, Filter, Join, JoinKind, OrderBy, ProjectionRequest, Query, TableRef,
	ValuePath,
};
