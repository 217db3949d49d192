// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Schema diffing between two project states.
//!
//! Virtual columns have no storage, so the autodetector strips them from both
//! states before comparing. A virtual column can be added, removed or changed
//! without producing a schema change.

mod autodetector;
mod state;

pub use autodetector::{MigrationAutodetector, SchemaChange};
pub use state::{ModelState, ProjectState};
