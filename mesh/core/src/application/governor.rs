// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Mesh governor: the write side of the mesh.
//!
//! Every mutation of an agent record (registration, heartbeat receipt,
//! activity signals, faults, coherence reports) goes through the registry's
//! explicit update operations here, and each accepted mutation is published
//! on the [`EventBus`]. Effective status transitions are published by the
//! heartbeat pulse, not here.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::agent::{Agent, AgentId, AgentStatus, AgentUpdate};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::events::MeshEvent;
use crate::domain::pathway::{PathwayGraph, RouteError};
use crate::domain::registry::{AgentRegistry, RegistryError};
use crate::infrastructure::event_bus::EventBus;

#[derive(Debug, thiserror::Error)]
pub enum GovernorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Route(#[from] RouteError),
}

pub struct MeshGovernor {
    registry: Arc<dyn AgentRegistry>,
    events: EventBus,
    clock: Arc<dyn Clock>,
}

impl MeshGovernor {
    pub fn new(registry: Arc<dyn AgentRegistry>, events: EventBus) -> Self {
        Self {
            registry,
            events,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn register_agent(&self, agent: Agent) -> Result<(), RegistryError> {
        let agent_id = agent.id.clone();
        let kind = agent.kind.clone();
        self.registry.register(agent).await?;

        info!(agent_id = %agent_id, kind = %kind, "Agent registered in mesh");
        self.events.publish(MeshEvent::AgentRegistered {
            agent_id,
            kind,
            registered_at: self.clock.now(),
        });
        Ok(())
    }

    pub async fn record_heartbeat(&self, id: &AgentId) -> Result<Agent, RegistryError> {
        let at = self.clock.now();
        let agent = self.registry.apply(id, AgentUpdate::Heartbeat { at }).await?;
        self.events.publish(MeshEvent::HeartbeatReceived {
            agent_id: id.clone(),
            received_at: at,
        });
        Ok(agent)
    }

    /// Work assignment/completion signal: `active`, `idle` or `processing`.
    pub async fn report_activity(
        &self,
        id: &AgentId,
        status: AgentStatus,
    ) -> Result<Agent, RegistryError> {
        self.registry.apply(id, AgentUpdate::Activity { status }).await
    }

    pub async fn raise_fault(&self, id: &AgentId) -> Result<Agent, RegistryError> {
        let agent = self.registry.apply(id, AgentUpdate::Fault).await?;
        warn!(agent_id = %id, "Agent fault raised");
        self.events.publish(MeshEvent::FaultRaised {
            agent_id: id.clone(),
            raised_at: self.clock.now(),
        });
        Ok(agent)
    }

    pub async fn clear_fault(&self, id: &AgentId) -> Result<Agent, RegistryError> {
        let agent = self.registry.apply(id, AgentUpdate::ClearFault).await?;
        info!(agent_id = %id, restored = %agent.status, "Agent fault cleared");
        self.events.publish(MeshEvent::FaultCleared {
            agent_id: id.clone(),
            restored: agent.status,
            cleared_at: self.clock.now(),
        });
        Ok(agent)
    }

    pub async fn update_coherence(&self, id: &AgentId, value: f64) -> Result<Agent, RegistryError> {
        let agent = self
            .registry
            .apply(id, AgentUpdate::Coherence { value })
            .await?;
        self.events.publish(MeshEvent::CoherenceUpdated {
            agent_id: id.clone(),
            coherence: agent.coherence,
            updated_at: self.clock.now(),
        });
        Ok(agent)
    }

    /// Check that `source` may hand work to `target` over a declared
    /// pathway.
    pub async fn validate_route(&self, source: &AgentId, target: &AgentId) -> Result<(), GovernorError> {
        let view = self.registry.view().await?;
        PathwayGraph::build(view.agents.values()).validate_route(source, target)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentKind;
    use crate::domain::clock::FixedClock;
    use crate::domain::mesh_config::MeshConfigSpec;
    use crate::infrastructure::registry::InMemoryAgentRegistry;
    use chrono::{Duration, TimeZone, Utc};

    fn governor() -> (MeshGovernor, EventBus, Arc<FixedClock>) {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let registry = Arc::new(
            InMemoryAgentRegistry::with_agents(MeshConfigSpec::default().seed_agents(start)).unwrap(),
        );
        let events = EventBus::with_default_capacity();
        let clock = Arc::new(FixedClock::new(start));
        let governor = MeshGovernor::new(registry, events.clone()).with_clock(clock.clone());
        (governor, events, clock)
    }

    #[tokio::test]
    async fn test_heartbeat_publishes_event() {
        let (governor, events, clock) = governor();
        let mut receiver = events.subscribe();
        clock.advance(Duration::milliseconds(100));

        let agent = governor.record_heartbeat(&"IOAgent.v1".into()).await.unwrap();
        assert_eq!(agent.last_heartbeat, clock.now());
        assert_eq!(
            receiver.try_recv().unwrap(),
            MeshEvent::HeartbeatReceived {
                agent_id: "IOAgent.v1".into(),
                received_at: clock.now(),
            }
        );
    }

    #[tokio::test]
    async fn test_fault_round_trip() {
        let (governor, events, _) = governor();
        let mut receiver = events.subscribe();
        let id: AgentId = "MemoryAgent.v1".into();

        assert_eq!(governor.raise_fault(&id).await.unwrap().status, AgentStatus::Error);
        assert!(governor.report_activity(&id, AgentStatus::Active).await.is_err());

        let restored = governor.clear_fault(&id).await.unwrap();
        assert_eq!(restored.status, AgentStatus::Idle);

        assert!(matches!(receiver.try_recv().unwrap(), MeshEvent::FaultRaised { .. }));
        assert!(matches!(
            receiver.try_recv().unwrap(),
            MeshEvent::FaultCleared { restored: AgentStatus::Idle, .. }
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates() {
        let (governor, _, _) = governor();
        let err = governor
            .register_agent(Agent::new("CodingAgent.v1", AgentKind::Worker))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(_)));

        governor
            .register_agent(Agent::new("VisionAgent.v1", AgentKind::Other("vision_organism".into())))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_coherence_update_is_clamped() {
        let (governor, _, _) = governor();
        let agent = governor
            .update_coherence(&"QuantumAgent.v1".into(), 1.4)
            .await
            .unwrap();
        assert_eq!(agent.coherence, 1.0);
    }

    #[tokio::test]
    async fn test_route_validation() {
        let (governor, _, _) = governor();
        governor
            .validate_route(&"PlannerAgent.v1".into(), &"CodingAgent.v1".into())
            .await
            .unwrap();
        governor
            .validate_route(&"IOAgent.v1".into(), &"SafetyAgent.v1".into())
            .await
            .unwrap_err();
        assert!(matches!(
            governor
                .validate_route(&"CodingAgent.v1".into(), &"PlannerAgent.v1".into())
                .await,
            Err(GovernorError::Route(RouteError::NotDeclared { .. }))
        ));
    }
}
