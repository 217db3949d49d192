// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub mod error;
pub mod expression;
pub mod value;

pub use error::{Diagnostic, Error, IntoDiagnostic};
pub use expression::Expr;
pub use value::{Type, Value};

pub type Result<T> = std::result::Result<T, Error>;

/// Marker emitted in place of a virtual column that was intentionally not
/// computed. Row decoding turns it into a deferred slot, never into a value.
pub const DEFERRED_SENTINEL: &str = "__lume_deferred__";
