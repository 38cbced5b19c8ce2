// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Mesh Snapshot
//!
//! A [`MeshSnapshot`] is the ephemeral, whole-mesh status returned to
//! collaborators. It is assembled from exactly one [`RegistryView`], so the
//! agent records, `active_agents` and `field_coherence` always describe the
//! same point in time. Snapshots are never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::agent::{Agent, AgentId, AgentStatus};
use crate::domain::coherence::field_coherence;
use crate::domain::heartbeat::HeartbeatPolicy;
use crate::domain::pathway::{GraphIntegrityWarning, PathwayGraph};
use crate::domain::registry::RegistryView;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub field_coherence: f64,
    pub lambda_phi: f64,
    pub total_agents: usize,
    pub active_agents: usize,
    pub heartbeat_interval_ms: u64,
    /// Agent records carrying their *effective* status.
    pub agents: BTreeMap<AgentId, Agent>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<GraphIntegrityWarning>,
}

/// Single-agent lookup result with the mesh-level summary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatusView {
    pub agent: Agent,
    pub mesh_coherence: f64,
    pub lambda_phi: f64,
    pub timestamp: DateTime<Utc>,
}

impl MeshSnapshot {
    /// Build a snapshot from one registry view at instant `now`.
    ///
    /// Pure: identical inputs always produce an identical snapshot.
    pub fn assemble(
        view: &RegistryView,
        policy: &HeartbeatPolicy,
        lambda_phi: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let agents: BTreeMap<AgentId, Agent> = view
            .agents
            .iter()
            .map(|(id, agent)| {
                let mut effective = agent.clone();
                effective.status = policy.classify(agent.status, agent.last_heartbeat, now);
                (id.clone(), effective)
            })
            .collect();

        let active_agents = agents
            .values()
            .filter(|agent| agent.status == AgentStatus::Active)
            .count();

        let warnings = PathwayGraph::build(view.agents.values()).validate();

        Self {
            field_coherence: field_coherence(agents.values().map(|agent| agent.coherence)),
            lambda_phi,
            total_agents: agents.len(),
            active_agents,
            heartbeat_interval_ms: policy.interval_ms,
            agents,
            timestamp: now,
            warnings,
        }
    }

    /// Extract one agent together with the mesh-level summary fields.
    pub fn agent_view(&self, id: &AgentId) -> Option<AgentStatusView> {
        self.agents.get(id).map(|agent| AgentStatusView {
            agent: agent.clone(),
            mesh_coherence: self.field_coherence,
            lambda_phi: self.lambda_phi,
            timestamp: self.timestamp,
        })
    }

    pub fn effective_statuses(&self) -> BTreeMap<AgentId, AgentStatus> {
        self.agents
            .iter()
            .map(|(id, agent)| (id.clone(), agent.status))
            .collect()
    }

    pub fn graph(&self) -> PathwayGraph {
        PathwayGraph::build(self.agents.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentKind, LAMBDA_PHI};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn view(agents: Vec<Agent>) -> RegistryView {
        RegistryView {
            version: 1,
            agents: Arc::new(agents.into_iter().map(|a| (a.id.clone(), a)).collect()),
        }
    }

    #[test]
    fn test_active_count_uses_effective_status() {
        let fresh = now();
        let stale = now() - Duration::seconds(5);
        let snapshot = MeshSnapshot::assemble(
            &view(vec![
                Agent::new("A.v1", AgentKind::Worker)
                    .with_status(AgentStatus::Active)
                    .with_last_heartbeat(fresh),
                Agent::new("B.v1", AgentKind::Worker)
                    .with_status(AgentStatus::Active)
                    .with_last_heartbeat(stale),
                Agent::new("C.v1", AgentKind::Worker)
                    .with_status(AgentStatus::Idle)
                    .with_last_heartbeat(fresh),
            ]),
            &HeartbeatPolicy::default(),
            LAMBDA_PHI,
            now(),
        );

        assert_eq!(snapshot.total_agents, 3);
        assert_eq!(snapshot.active_agents, 1);
        assert_eq!(snapshot.agents[&AgentId::from("B.v1")].status, AgentStatus::Disconnected);
    }

    #[test]
    fn test_empty_registry() {
        let snapshot = MeshSnapshot::assemble(
            &RegistryView::empty(),
            &HeartbeatPolicy::default(),
            LAMBDA_PHI,
            now(),
        );
        assert_eq!(snapshot.field_coherence, 0.0);
        assert_eq!(snapshot.total_agents, 0);
        assert_eq!(snapshot.active_agents, 0);
    }

    #[test]
    fn test_wire_format() {
        let snapshot = MeshSnapshot::assemble(
            &view(vec![Agent::new("A.v1", AgentKind::Io)
                .with_status(AgentStatus::Idle)
                .with_coherence(0.5)
                .with_last_heartbeat(now())
                .with_pathways_out(["User"])]),
            &HeartbeatPolicy::default(),
            LAMBDA_PHI,
            now(),
        );
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["lambda_phi"], 2.176435e-8);
        assert_eq!(json["heartbeat_interval_ms"], 220);
        assert_eq!(json["timestamp"], "2026-03-01T12:00:00Z");
        assert_eq!(json["agents"]["A.v1"]["kind"], "io_organism");
        assert_eq!(json["agents"]["A.v1"]["status"], "idle");
        assert_eq!(json["agents"]["A.v1"]["pathways_out"][0], "User");
        assert!(json.get("warnings").is_none());
    }

    #[test]
    fn test_integrity_warnings_do_not_fail_snapshot() {
        let snapshot = MeshSnapshot::assemble(
            &view(vec![Agent::new("A.v1", AgentKind::Worker)
                .with_status(AgentStatus::Active)
                .with_last_heartbeat(now())
                .with_pathways_in(["Ghost.v9"])]),
            &HeartbeatPolicy::default(),
            LAMBDA_PHI,
            now(),
        );
        assert_eq!(snapshot.warnings.len(), 1);
        assert_eq!(snapshot.active_agents, 1);
    }
}
