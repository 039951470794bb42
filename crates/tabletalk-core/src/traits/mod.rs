// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! External collaborators (the completion service and the warehouse data
//! API) are specified only via these traits, so tests can substitute fakes
//! and the transports remain swappable.

pub mod provider;
pub mod warehouse;

pub use provider::{CompletionProvider, ConversationModel};
pub use warehouse::WarehouseApi;
