// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Warehouse integration for Tabletalk.
//!
//! Three layers: [`DataApiClient`] speaks the asynchronous data-API wire
//! protocol, [`StatementExecutor`] adds polling and tabular rendering on a
//! fixed connection target, and [`QueryRunner`] drives the self-correcting
//! execute/repair cycle on top of both.

pub mod api;
pub mod executor;
pub mod extract;
pub mod runner;
mod wire;

pub use api::DataApiClient;
pub use executor::{render_table, StatementExecutor};
pub use extract::extract_sql;
pub use runner::{QueryRunner, RepairContext};
