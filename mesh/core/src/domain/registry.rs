// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Registry Interface
//!
//! The registry is the sole owner of agent records and the only shared
//! mutable resource of the mesh. Everything else reads a [`RegistryView`],
//! an immutable point-in-time version of the whole agent set.
//!
//! | Trait | Implementations |
//! |-------|----------------|
//! | `AgentRegistry` | `InMemoryAgentRegistry` |
//!
//! Implementations must apply each [`AgentUpdate`] atomically per agent and
//! must never expose a view containing a partially applied update.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::agent::{Agent, AgentId, AgentUpdate, TransitionError};

/// Immutable, versioned view of every registered agent in identifier order.
#[derive(Debug, Clone)]
pub struct RegistryView {
    /// Incremented on every published write.
    pub version: u64,
    pub agents: Arc<BTreeMap<AgentId, Agent>>,
}

impl RegistryView {
    pub fn empty() -> Self {
        Self {
            version: 0,
            agents: Arc::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[async_trait]
pub trait AgentRegistry: Send + Sync {
    /// Current point-in-time view of the whole registry.
    async fn view(&self) -> Result<RegistryView, RegistryError>;

    /// All agents, ordered by identifier.
    async fn list(&self) -> Result<Vec<Agent>, RegistryError> {
        Ok(self.view().await?.agents.values().cloned().collect())
    }

    /// Find agent by ID
    async fn get(&self, id: &AgentId) -> Result<Agent, RegistryError> {
        self.view()
            .await?
            .agents
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    /// Register a new agent. Fails if the id is already taken.
    async fn register(&self, agent: Agent) -> Result<(), RegistryError>;

    /// Apply an update to one agent and return the updated record.
    async fn apply(&self, id: &AgentId, update: AgentUpdate) -> Result<Agent, RegistryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Agent not found: {0}")]
    NotFound(AgentId),

    #[error("Agent already registered: {0}")]
    AlreadyRegistered(AgentId),

    #[error("Rejected update for {id}: {reason}")]
    InvalidTransition { id: AgentId, reason: TransitionError },

    #[error("Agent registry unavailable: {0}")]
    Unavailable(String),
}
