// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Σ-Mesh Rust SDK
//!
//! Typed client for the read-only mesh status API.

pub mod client;
pub mod types;

pub use client::{ClientError, MeshClient};
pub use types::*;
