// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

use crate::domain::agent::{AgentId, AgentStatus};

/// One report from an agent about itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentSignal {
    Heartbeat { agent_id: AgentId },
    Activity { agent_id: AgentId, status: AgentStatus },
    Fault { agent_id: AgentId },
    ClearFault { agent_id: AgentId },
    Coherence { agent_id: AgentId, value: f64 },
}

impl AgentSignal {
    pub fn agent_id(&self) -> &AgentId {
        match self {
            AgentSignal::Heartbeat { agent_id }
            | AgentSignal::Activity { agent_id, .. }
            | AgentSignal::Fault { agent_id }
            | AgentSignal::ClearFault { agent_id }
            | AgentSignal::Coherence { agent_id, .. } => agent_id,
        }
    }
}
