// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! The default eight-organism Σ-mesh, used when configuration declares no
//! agents.

use crate::domain::agent::{AgentEndpoint, AgentKind, AgentStatus};
use crate::domain::mesh_config::{AgentSeed, HeartbeatSource};

fn seed(
    id: &str,
    kind: AgentKind,
    status: AgentStatus,
    coherence: f64,
    pathways_in: &[&str],
    pathways_out: &[&str],
) -> AgentSeed {
    AgentSeed {
        id: id.into(),
        kind,
        status,
        coherence,
        pathways_in: pathways_in.iter().copied().map(AgentEndpoint::parse).collect(),
        pathways_out: pathways_out.iter().copied().map(AgentEndpoint::parse).collect(),
        heartbeat: HeartbeatSource::Local,
    }
}

pub fn default_mesh() -> Vec<AgentSeed> {
    use AgentStatus::{Active, Idle};

    vec![
        seed(
            "CodingAgent.v1",
            AgentKind::Worker,
            Active,
            0.87,
            &["PlannerAgent.v1"],
            &["IOAgent.v1", "GovernorAgent.v1"],
        ),
        seed(
            "PlannerAgent.v1",
            AgentKind::Cognitive,
            Active,
            0.92,
            &["User", "GovernorAgent.v1"],
            &["CodingAgent.v1", "WorldModelAgent.v1", "QuantumAgent.v1"],
        ),
        seed(
            "WorldModelAgent.v1",
            AgentKind::Integrator,
            Active,
            0.85,
            &["PlannerAgent.v1", "MemoryAgent.v1"],
            &["GovernorAgent.v1"],
        ),
        seed(
            "QuantumAgent.v1",
            AgentKind::Hardware,
            Active,
            0.78,
            &["PlannerAgent.v1"],
            &["WorldModelAgent.v1", "GovernorAgent.v1"],
        ),
        seed(
            "GovernorAgent.v1",
            AgentKind::Orchestrator,
            Active,
            0.94,
            &["WorldModelAgent.v1", "QuantumAgent.v1"],
            &["PlannerAgent.v1", "CodingAgent.v1", "User"],
        ),
        seed(
            "SafetyAgent.v1",
            AgentKind::Sentinel,
            Active,
            0.96,
            &["*"],
            &["GovernorAgent.v1"],
        ),
        seed(
            "MemoryAgent.v1",
            AgentKind::Retrieval,
            Idle,
            0.71,
            &["PlannerAgent.v1", "CodingAgent.v1"],
            &["WorldModelAgent.v1"],
        ),
        seed(
            "IOAgent.v1",
            AgentKind::Io,
            Idle,
            0.82,
            &["CodingAgent.v1"],
            &["User", "MemoryAgent.v1"],
        ),
    ]
}
