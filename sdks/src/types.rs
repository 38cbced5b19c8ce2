// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

pub use sigma_mesh_core::domain::agent::{Agent, AgentEndpoint, AgentId, AgentKind, AgentStatus};
pub use sigma_mesh_core::domain::pathway::GraphIntegrityWarning;
pub use sigma_mesh_core::domain::snapshot::{AgentStatusView, MeshSnapshot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub uptime_seconds: u64,
}
