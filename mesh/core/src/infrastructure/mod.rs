// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Infrastructure Layer
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`registry`] | `InMemoryAgentRegistry` (read-copy/publish) |
//! | [`event_bus`] | `EventBus` over a tokio broadcast channel |
//! | [`metrics`] | Prometheus exporter and mesh gauges |
//! | [`signal_listener`] | NDJSON agent signal listener over TCP |

pub mod registry;
pub mod event_bus;
pub mod metrics;
pub mod signal_listener;
