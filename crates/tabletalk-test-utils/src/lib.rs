// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Tabletalk: deterministic fakes for the completion
//! service and the warehouse data API.

pub mod mock_provider;
pub mod scripted_warehouse;

pub use mock_provider::{MockCompletion, MockConversation, ScriptedCompletion, ScriptedTurn};
pub use scripted_warehouse::{result_set, ScriptedStatement, ScriptedWarehouse};
