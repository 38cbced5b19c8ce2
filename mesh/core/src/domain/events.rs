// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::{AgentId, AgentKind, AgentStatus};

/// Mesh lifecycle and liveness events, published on the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeshEvent {
    AgentRegistered {
        agent_id: AgentId,
        kind: AgentKind,
        registered_at: DateTime<Utc>,
    },
    HeartbeatReceived {
        agent_id: AgentId,
        received_at: DateTime<Utc>,
    },
    /// Effective status changed, either through an explicit signal or
    /// because the heartbeat pulse observed staleness.
    StatusChanged {
        agent_id: AgentId,
        from: AgentStatus,
        to: AgentStatus,
        changed_at: DateTime<Utc>,
    },
    FaultRaised {
        agent_id: AgentId,
        raised_at: DateTime<Utc>,
    },
    FaultCleared {
        agent_id: AgentId,
        restored: AgentStatus,
        cleared_at: DateTime<Utc>,
    },
    CoherenceUpdated {
        agent_id: AgentId,
        coherence: f64,
        updated_at: DateTime<Utc>,
    },
}

impl MeshEvent {
    pub fn agent_id(&self) -> &AgentId {
        match self {
            MeshEvent::AgentRegistered { agent_id, .. }
            | MeshEvent::HeartbeatReceived { agent_id, .. }
            | MeshEvent::StatusChanged { agent_id, .. }
            | MeshEvent::FaultRaised { agent_id, .. }
            | MeshEvent::FaultCleared { agent_id, .. }
            | MeshEvent::CoherenceUpdated { agent_id, .. } => agent_id,
        }
    }
}
