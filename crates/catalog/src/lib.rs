// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

#![cfg_attr(not(debug_assertions), deny(warnings))]

pub use catalog::Catalog;
pub use entity::{EntityBuilder, EntityDef};
pub use error::CatalogError;
pub use field::{FieldDef, FieldKind, ForeignKey};
pub use lume_type::Result;
pub use record::{Record, RecordMut};
pub use virtual_column::{LocalCompute, LocalWrite, VirtualColumn, VirtualColumnDef};

mod catalog;
mod entity;
pub mod error;
mod field;
pub mod filter;
pub mod migration;
mod record;
pub mod test_utils;
mod virtual_column;
