// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-memory agent registry.
//!
//! Read-copy/publish scheme: the registry holds an `Arc` to an immutable
//! agent map. Readers clone the `Arc` and never block writers for longer than
//! a pointer copy. Writers serialize on a dedicated lock, copy the current
//! map, apply their change and publish a new `Arc` with an incremented
//! version, so a reader only ever sees fully applied updates.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::domain::agent::{Agent, AgentId, AgentUpdate};
use crate::domain::registry::{AgentRegistry, RegistryError, RegistryView};

pub struct InMemoryAgentRegistry {
    current: RwLock<RegistryView>,
    writer: Mutex<()>,
    closed: AtomicBool,
}

impl InMemoryAgentRegistry {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(RegistryView::empty()),
            writer: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    /// Registry pre-populated with `agents`. Later duplicates are rejected.
    pub fn with_agents(agents: impl IntoIterator<Item = Agent>) -> Result<Self, RegistryError> {
        let registry = Self::new();
        {
            let _guard = registry.writer.lock();
            let mut map = BTreeMap::new();
            for agent in agents {
                if map.contains_key(&agent.id) {
                    return Err(RegistryError::AlreadyRegistered(agent.id));
                }
                map.insert(agent.id.clone(), agent);
            }
            *registry.current.write() = RegistryView {
                version: 1,
                agents: Arc::new(map),
            };
        }
        Ok(registry)
    }

    /// Stop serving reads and writes. Subsequent calls fail with
    /// `Unavailable`.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        debug!("Agent registry shut down");
    }

    fn ensure_open(&self) -> Result<(), RegistryError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RegistryError::Unavailable("registry has been shut down".to_string()));
        }
        Ok(())
    }

    fn publish(&self, version: u64, agents: BTreeMap<AgentId, Agent>) {
        *self.current.write() = RegistryView {
            version: version + 1,
            agents: Arc::new(agents),
        };
    }
}

impl Default for InMemoryAgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AgentRegistry for InMemoryAgentRegistry {
    async fn view(&self) -> Result<RegistryView, RegistryError> {
        self.ensure_open()?;
        Ok(self.current.read().clone())
    }

    async fn register(&self, agent: Agent) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let _guard = self.writer.lock();
        let base = self.current.read().clone();
        if base.agents.contains_key(&agent.id) {
            return Err(RegistryError::AlreadyRegistered(agent.id));
        }

        let mut agents = (*base.agents).clone();
        debug!(agent_id = %agent.id, "Registering agent");
        agents.insert(agent.id.clone(), agent);
        self.publish(base.version, agents);
        Ok(())
    }

    async fn apply(&self, id: &AgentId, update: AgentUpdate) -> Result<Agent, RegistryError> {
        self.ensure_open()?;
        let _guard = self.writer.lock();
        let base = self.current.read().clone();
        let mut agent = base
            .agents
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))?;

        agent
            .apply(&update)
            .map_err(|reason| RegistryError::InvalidTransition {
                id: id.clone(),
                reason,
            })?;

        if base.agents.get(id) == Some(&agent) {
            return Ok(agent);
        }

        let mut agents = (*base.agents).clone();
        agents.insert(id.clone(), agent.clone());
        self.publish(base.version, agents);
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::{AgentKind, AgentStatus};

    fn registry() -> InMemoryAgentRegistry {
        InMemoryAgentRegistry::with_agents([
            Agent::new("B.v1", AgentKind::Worker).with_status(AgentStatus::Active),
            Agent::new("A.v1", AgentKind::Io),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let ids: Vec<_> = registry()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.id.0)
            .collect();
        assert_eq!(ids, vec!["A.v1", "B.v1"]);
    }

    #[tokio::test]
    async fn test_get_missing_agent() {
        let err = registry().get(&"GhostAgent.v9".into()).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(ref id) if id.as_str() == "GhostAgent.v9"));
        assert_eq!(err.to_string(), "Agent not found: GhostAgent.v9");
    }

    #[tokio::test]
    async fn test_duplicate_registration_is_rejected() {
        let registry = registry();
        let err = registry
            .register(Agent::new("A.v1", AgentKind::Io))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRegistered(_)));

        assert!(InMemoryAgentRegistry::with_agents([
            Agent::new("A.v1", AgentKind::Io),
            Agent::new("A.v1", AgentKind::Io),
        ])
        .is_err());
    }

    #[tokio::test]
    async fn test_views_are_immutable_versions() {
        let registry = registry();
        let before = registry.view().await.unwrap();

        registry
            .apply(&"A.v1".into(), AgentUpdate::Fault)
            .await
            .unwrap();
        let after = registry.view().await.unwrap();

        assert_eq!(after.version, before.version + 1);
        assert_eq!(before.agents[&AgentId::from("A.v1")].status, AgentStatus::Idle);
        assert_eq!(after.agents[&AgentId::from("A.v1")].status, AgentStatus::Error);
    }

    #[tokio::test]
    async fn test_noop_update_does_not_publish() {
        let registry = registry();
        let before = registry.view().await.unwrap().version;
        registry
            .apply(&"B.v1".into(), AgentUpdate::Activity { status: AgentStatus::Active })
            .await
            .unwrap();
        assert_eq!(registry.view().await.unwrap().version, before);
    }

    #[tokio::test]
    async fn test_rejected_transition() {
        let registry = registry();
        registry.apply(&"B.v1".into(), AgentUpdate::Fault).await.unwrap();
        let err = registry
            .apply(&"B.v1".into(), AgentUpdate::Activity { status: AgentStatus::Idle })
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_makes_registry_unavailable() {
        let registry = registry();
        registry.shutdown();
        assert!(matches!(registry.view().await, Err(RegistryError::Unavailable(_))));
        assert!(matches!(registry.list().await, Err(RegistryError::Unavailable(_))));
    }
}
