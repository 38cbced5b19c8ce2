// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Σ-Mesh Domain Layer
//!
//! Pure domain types for the agent mesh. No I/O dependencies.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`agent`] | `Agent`, `AgentId`, `AgentKind`, `AgentStatus`, `AgentEndpoint`, `AgentUpdate` |
//! | [`pathway`] | `PathwayGraph`, `GraphIntegrityWarning`, `RouteError` |
//! | [`heartbeat`] | `HeartbeatPolicy` |
//! | [`coherence`] | field coherence aggregation |
//! | [`snapshot`] | `MeshSnapshot`, `AgentStatusView` |
//! | [`registry`] | `AgentRegistry` trait, `RegistryView`, `RegistryError` |
//! | [`events`] | `MeshEvent` |
//! | [`signal`] | `AgentSignal` |
//! | [`clock`] | `Clock`, `SystemClock`, `FixedClock` |
//! | [`mesh_config`] | `MeshConfigManifest` |
//! | [`organisms`] | the default eight-organism mesh |

pub mod agent;
pub mod pathway;
pub mod heartbeat;
pub mod coherence;
pub mod snapshot;
pub mod registry;
pub mod events;
pub mod signal;
pub mod clock;
pub mod mesh_config;
pub mod organisms;
