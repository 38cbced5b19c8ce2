// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Status Service
//!
//! Orchestrates registry, heartbeat policy, pathway validation and coherence
//! aggregation into a [`MeshSnapshot`]. This is the only component with an
//! external surface; the HTTP layer in `crate::presentation` is a thin
//! adapter over it.
//!
//! Single-agent lookups deliberately reuse the full snapshot, so the
//! `mesh_coherence` they return is always consistent with the agent record
//! next to it.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::agent::AgentId;
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::heartbeat::HeartbeatPolicy;
use crate::domain::registry::{AgentRegistry, RegistryError};
use crate::domain::snapshot::{AgentStatusView, MeshSnapshot};

#[async_trait]
pub trait StatusService: Send + Sync {
    /// Whole-mesh snapshot. Fails only when the registry cannot be read.
    async fn get_mesh_status(&self) -> Result<MeshSnapshot, StatusError>;

    /// One agent plus the mesh-level summary fields.
    async fn get_agent_status(&self, id: &AgentId) -> Result<AgentStatusView, StatusError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StatusError {
    #[error("Agent not found: {0}")]
    NotFound(AgentId),

    #[error("Mesh registry unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RegistryError> for StatusError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => StatusError::NotFound(id),
            RegistryError::Unavailable(reason) => StatusError::Unavailable(reason),
            other => StatusError::Internal(other.to_string()),
        }
    }
}

pub struct StandardStatusService {
    registry: Arc<dyn AgentRegistry>,
    policy: HeartbeatPolicy,
    lambda_phi: f64,
    clock: Arc<dyn Clock>,
}

impl StandardStatusService {
    pub fn new(registry: Arc<dyn AgentRegistry>, policy: HeartbeatPolicy, lambda_phi: f64) -> Self {
        Self {
            registry,
            policy,
            lambda_phi,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &HeartbeatPolicy {
        &self.policy
    }
}

#[async_trait]
impl StatusService for StandardStatusService {
    async fn get_mesh_status(&self) -> Result<MeshSnapshot, StatusError> {
        let view = self.registry.view().await?;
        let snapshot = MeshSnapshot::assemble(&view, &self.policy, self.lambda_phi, self.clock.now());

        for warning in &snapshot.warnings {
            warn!("GraphIntegrity: {}", warning);
        }
        debug!(
            version = view.version,
            total = snapshot.total_agents,
            active = snapshot.active_agents,
            field_coherence = snapshot.field_coherence,
            "Assembled mesh snapshot"
        );

        Ok(snapshot)
    }

    async fn get_agent_status(&self, id: &AgentId) -> Result<AgentStatusView, StatusError> {
        let snapshot = self.get_mesh_status().await?;
        snapshot
            .agent_view(id)
            .ok_or_else(|| StatusError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{Agent, AgentKind, AgentStatus, AgentUpdate, LAMBDA_PHI};
    use crate::domain::clock::FixedClock;
    use crate::domain::mesh_config::MeshConfigSpec;
    use crate::infrastructure::registry::InMemoryAgentRegistry;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn service() -> (Arc<InMemoryAgentRegistry>, Arc<FixedClock>, StandardStatusService) {
        let agents = MeshConfigSpec::default().seed_agents(start());
        let registry = Arc::new(InMemoryAgentRegistry::with_agents(agents).unwrap());
        let clock = Arc::new(FixedClock::new(start()));
        let service =
            StandardStatusService::new(registry.clone(), HeartbeatPolicy::default(), LAMBDA_PHI)
                .with_clock(clock.clone());
        (registry, clock, service)
    }

    #[tokio::test]
    async fn test_default_mesh_snapshot() {
        let (_, _, service) = service();
        let snapshot = service.get_mesh_status().await.unwrap();

        assert_eq!(snapshot.total_agents, 8);
        assert_eq!(snapshot.active_agents, 6);
        assert!((snapshot.field_coherence - 0.85625).abs() < 1e-9);
        assert_eq!(snapshot.lambda_phi, LAMBDA_PHI);
        assert_eq!(snapshot.heartbeat_interval_ms, 220);
        assert!(snapshot.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_stale_agents_report_disconnected() {
        let (registry, clock, service) = service();
        clock.advance(Duration::milliseconds(661));
        registry
            .apply(&"PlannerAgent.v1".into(), AgentUpdate::Heartbeat { at: clock.now() })
            .await
            .unwrap();

        let snapshot = service.get_mesh_status().await.unwrap();
        assert_eq!(snapshot.active_agents, 1);
        assert_eq!(
            snapshot.agents[&AgentId::from("CodingAgent.v1")].status,
            AgentStatus::Disconnected
        );
        assert_eq!(
            snapshot.agents[&AgentId::from("PlannerAgent.v1")].status,
            AgentStatus::Active
        );
    }

    #[tokio::test]
    async fn test_agent_lookup() {
        let (_, _, service) = service();
        let view = service.get_agent_status(&"SafetyAgent.v1".into()).await.unwrap();
        assert_eq!(view.agent.kind, AgentKind::Sentinel);
        assert_eq!(view.timestamp, start());

        let err = service
            .get_agent_status(&"GhostAgent.v9".into())
            .await
            .unwrap_err();
        assert!(matches!(err, StatusError::NotFound(_)));
        assert!(err.to_string().contains("GhostAgent.v9"));
    }

    #[tokio::test]
    async fn test_unavailable_registry() {
        let (registry, _, service) = service();
        registry.shutdown();
        assert!(matches!(
            service.get_mesh_status().await,
            Err(StatusError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_error_agent_survives_fresh_heartbeat() {
        let registry = Arc::new(InMemoryAgentRegistry::new());
        registry
            .register(Agent::new("A.v1", AgentKind::Worker).with_last_heartbeat(start()))
            .await
            .unwrap();
        registry.apply(&"A.v1".into(), AgentUpdate::Fault).await.unwrap();
        registry
            .apply(&"A.v1".into(), AgentUpdate::Heartbeat { at: start() + Duration::seconds(1) })
            .await
            .unwrap();

        let service = StandardStatusService::new(registry, HeartbeatPolicy::default(), LAMBDA_PHI)
            .with_clock(Arc::new(FixedClock::new(start() + Duration::seconds(1))));
        let view = service.get_agent_status(&"A.v1".into()).await.unwrap();
        assert_eq!(view.agent.status, AgentStatus::Error);
    }
}
