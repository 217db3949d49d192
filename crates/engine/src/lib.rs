// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! SQLite execution for lume entities.
//!
//! [`Database`] owns the connection and the catalog, [`QuerySet`] builds and
//! runs queries, and [`Entity`] holds one materialized row. Virtual columns
//! are handled by [`vcol`].

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use config::{DbPath, SqliteConfig};
pub use database::{Database, Row};
pub use entity::{Entity, Slot};
pub use error::EngineError;
pub use lume_type::Result;
pub use queryset::QuerySet;

mod config;
pub mod convert;
mod database;
mod entity;
pub mod error;
mod queryset;
pub mod test_utils;
pub mod vcol;
