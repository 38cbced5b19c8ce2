// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `sigma-mesh-core`: Σ-Mesh Status Core
//!
//! Models the fixed set of cooperating agents ("organisms") of a Σ-mesh, the
//! directed pathways between them, their heartbeat-driven status and the
//! mesh-wide field coherence.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `Agent`, `AgentEndpoint`, `PathwayGraph`, `HeartbeatPolicy`, `MeshSnapshot`, `AgentRegistry` |
//! | [`application`] | Application | `StatusService`, `MeshGovernor`, heartbeat pulse |
//! | [`infrastructure`] | Infrastructure | `InMemoryAgentRegistry`, `EventBus`, metrics |
//! | [`presentation`] | Presentation | Axum HTTP router |

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
