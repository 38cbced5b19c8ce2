// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`sigma-mesh-core`)
//!
//! Read-only HTTP surface over [`crate::application::status::StatusService`].
//! No endpoint mutates mesh state.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Health check, mesh snapshot and single-agent lookup |

pub mod api;
