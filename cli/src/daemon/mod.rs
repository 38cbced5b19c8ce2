// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Daemon mode implementation
//!
//! Handles:
//! - Registry seeding and the heartbeat pulse
//! - Agent signal ingestion (local heartbeats, optional TCP listener)
//! - The HTTP status API
//! - Graceful shutdown

pub mod server;

pub use server::{start_daemon, MeshRuntime};

/// Base URL of a running daemon. `host` may already carry a scheme.
pub fn base_url(host: &str, port: u16) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        format!("{}:{}", host, port)
    } else {
        format!("http://{}:{}", host, port)
    }
}
