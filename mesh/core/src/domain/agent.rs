// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Agent Aggregate
//!
//! An [`Agent`] is one organism of the mesh: an identifier, a role tag, a
//! reported status, a coherence score and the pathways it declares.
//!
//! ## Status state machine
//!
//! ```text
//!            Activity(active|idle|processing)
//!   active ⇄ idle ⇄ processing ──Fault──▶ error ──ClearFault──▶ last reported
//!      ▲                                   (sticky, heartbeats ignored)
//!      └──── Heartbeat ──── disconnected
//! ```
//!
//! `disconnected` is normally an *effective* status derived by
//! [`HeartbeatPolicy`](crate::domain::heartbeat::HeartbeatPolicy) from the
//! heartbeat age. It is only stored when an agent is registered in that
//! state, in which case the next heartbeat restores the last reported status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::coherence::sanitize;

/// Mesh-identity scaling factor echoed verbatim in all telemetry (s⁻¹).
pub const LAMBDA_PHI: f64 = 2.176435e-8;

/// Unique agent identifier, conventionally `"<Name>.v<N>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Role tag classifying an organism's function within the mesh.
///
/// Open enumeration: unknown tags survive a serialization round-trip as
/// [`AgentKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentKind {
    Worker,
    Cognitive,
    Integrator,
    Hardware,
    Orchestrator,
    Sentinel,
    Retrieval,
    Io,
    Other(String),
}

impl AgentKind {
    pub fn as_str(&self) -> &str {
        match self {
            AgentKind::Worker => "worker_organism",
            AgentKind::Cognitive => "cognitive_organism",
            AgentKind::Integrator => "integrator_organism",
            AgentKind::Hardware => "hardware_organism",
            AgentKind::Orchestrator => "orchestrator_organism",
            AgentKind::Sentinel => "sentinel_organism",
            AgentKind::Retrieval => "retrieval_organism",
            AgentKind::Io => "io_organism",
            AgentKind::Other(tag) => tag,
        }
    }
}

impl From<String> for AgentKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "worker_organism" => AgentKind::Worker,
            "cognitive_organism" => AgentKind::Cognitive,
            "integrator_organism" => AgentKind::Integrator,
            "hardware_organism" => AgentKind::Hardware,
            "orchestrator_organism" => AgentKind::Orchestrator,
            "sentinel_organism" => AgentKind::Sentinel,
            "retrieval_organism" => AgentKind::Retrieval,
            "io_organism" => AgentKind::Io,
            _ => AgentKind::Other(tag),
        }
    }
}

impl From<AgentKind> for String {
    fn from(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Active,
    Idle,
    Processing,
    Error,
    Disconnected,
}

impl AgentStatus {
    /// Statuses an agent reports through activity signals.
    pub fn is_activity(self) -> bool {
        matches!(self, AgentStatus::Active | AgentStatus::Idle | AgentStatus::Processing)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentStatus::Active => "active",
            AgentStatus::Idle => "idle",
            AgentStatus::Processing => "processing",
            AgentStatus::Error => "error",
            AgentStatus::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One end of a pathway.
///
/// On the wire an endpoint is a bare string: `"User"` is the external user,
/// `"*"` is every other agent in the mesh, anything else is an agent id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentEndpoint {
    Agent(AgentId),
    ExternalUser,
    Wildcard,
}

impl AgentEndpoint {
    pub const USER: &'static str = "User";
    pub const WILDCARD: &'static str = "*";

    pub fn parse(raw: &str) -> Self {
        match raw {
            Self::USER => AgentEndpoint::ExternalUser,
            Self::WILDCARD => AgentEndpoint::Wildcard,
            id => AgentEndpoint::Agent(AgentId::new(id)),
        }
    }

    pub fn agent(id: impl Into<String>) -> Self {
        AgentEndpoint::Agent(AgentId::new(id))
    }

    /// The agent id, when this endpoint names a single agent.
    pub fn agent_id(&self) -> Option<&AgentId> {
        match self {
            AgentEndpoint::Agent(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        !matches!(self, AgentEndpoint::Agent(_))
    }
}

impl From<String> for AgentEndpoint {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            Self::USER => AgentEndpoint::ExternalUser,
            Self::WILDCARD => AgentEndpoint::Wildcard,
            _ => AgentEndpoint::Agent(AgentId(raw)),
        }
    }
}

impl From<AgentEndpoint> for String {
    fn from(endpoint: AgentEndpoint) -> Self {
        match endpoint {
            AgentEndpoint::Agent(id) => id.0,
            AgentEndpoint::ExternalUser => AgentEndpoint::USER.to_string(),
            AgentEndpoint::Wildcard => AgentEndpoint::WILDCARD.to_string(),
        }
    }
}

impl From<&str> for AgentEndpoint {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for AgentEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentEndpoint::Agent(id) => f.write_str(id.as_str()),
            AgentEndpoint::ExternalUser => f.write_str(Self::USER),
            AgentEndpoint::Wildcard => f.write_str(Self::WILDCARD),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
    pub status: AgentStatus,
    /// Signal quality in `[0, 1]`.
    pub coherence: f64,
    pub last_heartbeat: DateTime<Utc>,
    pub pathways_in: Vec<AgentEndpoint>,
    pub pathways_out: Vec<AgentEndpoint>,
    /// Last activity status, restored when a fault is cleared or a
    /// disconnected agent heartbeats again.
    #[serde(skip)]
    last_reported: Option<AgentStatus>,
}

/// Explicit update signals accepted by an agent record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentUpdate {
    Heartbeat { at: DateTime<Utc> },
    /// Work assignment/completion: `active`, `idle` or `processing`.
    Activity { status: AgentStatus },
    Fault,
    ClearFault,
    Coherence { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("'{0}' is not an activity status")]
    NotAnActivity(AgentStatus),

    #[error("agent is in error; clear the fault first")]
    FaultLatched,
}

impl Agent {
    pub fn new(id: impl Into<AgentId>, kind: AgentKind) -> Self {
        Self {
            id: id.into(),
            kind,
            status: AgentStatus::Idle,
            coherence: 0.0,
            last_heartbeat: Utc::now(),
            pathways_in: Vec::new(),
            pathways_out: Vec::new(),
            last_reported: Some(AgentStatus::Idle),
        }
    }

    pub fn with_status(mut self, status: AgentStatus) -> Self {
        self.status = status;
        if status.is_activity() {
            self.last_reported = Some(status);
        }
        self
    }

    pub fn with_coherence(mut self, coherence: f64) -> Self {
        self.coherence = sanitize(coherence);
        self
    }

    pub fn with_last_heartbeat(mut self, at: DateTime<Utc>) -> Self {
        self.last_heartbeat = at;
        self
    }

    pub fn with_pathways_in<I, E>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<AgentEndpoint>,
    {
        self.pathways_in = dedup(endpoints.into_iter().map(Into::into));
        self
    }

    pub fn with_pathways_out<I, E>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<AgentEndpoint>,
    {
        self.pathways_out = dedup(endpoints.into_iter().map(Into::into));
        self
    }

    /// Status to fall back to when leaving `error` or `disconnected`.
    pub fn last_reported(&self) -> AgentStatus {
        self.last_reported
            .or_else(|| Some(self.status).filter(|s| s.is_activity()))
            .unwrap_or(AgentStatus::Idle)
    }

    /// Apply an update signal. Idempotent: re-applying the same update
    /// leaves the record unchanged.
    pub fn apply(&mut self, update: &AgentUpdate) -> Result<(), TransitionError> {
        match update {
            AgentUpdate::Heartbeat { at } => {
                if *at > self.last_heartbeat {
                    self.last_heartbeat = *at;
                }
                if self.status == AgentStatus::Disconnected {
                    self.status = self.last_reported();
                }
            }
            AgentUpdate::Activity { status } => {
                if !status.is_activity() {
                    return Err(TransitionError::NotAnActivity(*status));
                }
                if self.status == AgentStatus::Error {
                    return Err(TransitionError::FaultLatched);
                }
                self.status = *status;
                self.last_reported = Some(*status);
            }
            AgentUpdate::Fault => {
                if self.status.is_activity() {
                    self.last_reported = Some(self.status);
                }
                self.status = AgentStatus::Error;
            }
            AgentUpdate::ClearFault => {
                if self.status == AgentStatus::Error {
                    self.status = self.last_reported();
                }
            }
            AgentUpdate::Coherence { value } => {
                self.coherence = sanitize(*value);
            }
        }
        Ok(())
    }
}

fn dedup(endpoints: impl Iterator<Item = AgentEndpoint>) -> Vec<AgentEndpoint> {
    let mut out: Vec<AgentEndpoint> = Vec::new();
    for endpoint in endpoints {
        if !out.contains(&endpoint) {
            out.push(endpoint);
        }
    }
    out
}
