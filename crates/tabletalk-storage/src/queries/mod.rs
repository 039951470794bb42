// SPDX-FileCopyrightText: 2026 Tabletalk Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query operations over the session store tables.

pub mod checkpoints;
pub mod messages;
