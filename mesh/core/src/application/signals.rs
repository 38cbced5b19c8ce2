// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Signals - the ingestion path into the governor
//!
//! Agents report liveness and work state as [`AgentSignal`]s over an mpsc
//! channel. [`SignalIngestor`] drains the channel and applies each signal
//! through [`MeshGovernor`]. [`LocalHeartbeat`] feeds the same channel for
//! agents hosted inside the daemon, so their heartbeats stay fresh without
//! any outside reporter.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Keeps registry writes off the read-only HTTP surface

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::governor::MeshGovernor;
use crate::domain::agent::{Agent, AgentId};
use crate::domain::registry::RegistryError;

pub use crate::domain::signal::AgentSignal;

pub const DEFAULT_SIGNAL_CAPACITY: usize = 1024;

pub fn signal_channel(capacity: usize) -> (mpsc::Sender<AgentSignal>, mpsc::Receiver<AgentSignal>) {
    mpsc::channel(capacity)
}

/// Apply one signal through the governor.
pub async fn apply_signal(governor: &MeshGovernor, signal: AgentSignal) -> Result<Agent, RegistryError> {
    match signal {
        AgentSignal::Heartbeat { agent_id } => governor.record_heartbeat(&agent_id).await,
        AgentSignal::Activity { agent_id, status } => {
            governor.report_activity(&agent_id, status).await
        }
        AgentSignal::Fault { agent_id } => governor.raise_fault(&agent_id).await,
        AgentSignal::ClearFault { agent_id } => governor.clear_fault(&agent_id).await,
        AgentSignal::Coherence { agent_id, value } => {
            governor.update_coherence(&agent_id, value).await
        }
    }
}

/// Background task draining the signal channel into the governor.
pub struct SignalIngestor {
    governor: Arc<MeshGovernor>,
    receiver: mpsc::Receiver<AgentSignal>,
    shutdown_token: CancellationToken,
}

impl SignalIngestor {
    pub fn new(governor: Arc<MeshGovernor>, receiver: mpsc::Receiver<AgentSignal>) -> Self {
        Self {
            governor,
            receiver,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(mut self) {
        info!("Starting agent signal ingestor");

        loop {
            tokio::select! {
                signal = self.receiver.recv() => {
                    let Some(signal) = signal else {
                        debug!("All signal senders dropped");
                        break;
                    };
                    let agent_id = signal.agent_id().clone();
                    if let Err(e) = apply_signal(&self.governor, signal).await {
                        warn!(agent_id = %agent_id, "Rejected agent signal: {}", e);
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping signal ingestor");
                    break;
                }
            }
        }

        info!("Agent signal ingestor stopped");
    }
}

/// Heartbeats the agents hosted inside the daemon once per interval.
pub struct LocalHeartbeat {
    sender: mpsc::Sender<AgentSignal>,
    agent_ids: Vec<AgentId>,
    interval: Duration,
    shutdown_token: CancellationToken,
}

impl LocalHeartbeat {
    pub fn new(sender: mpsc::Sender<AgentSignal>, agent_ids: Vec<AgentId>, interval: Duration) -> Self {
        Self {
            sender,
            agent_ids,
            interval,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        if self.agent_ids.is_empty() {
            info!("No locally hosted agents, local heartbeat idle");
            return;
        }

        info!(
            agents = self.agent_ids.len(),
            interval_ms = self.interval.as_millis() as u64,
            "Starting local heartbeat"
        );

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        'outer: loop {
            tokio::select! {
                _ = tick.tick() => {
                    for agent_id in &self.agent_ids {
                        let signal = AgentSignal::Heartbeat { agent_id: agent_id.clone() };
                        if self.sender.send(signal).await.is_err() {
                            warn!("Signal channel closed, stopping local heartbeat");
                            break 'outer;
                        }
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping local heartbeat");
                    break;
                }
            }
        }

        info!("Local heartbeat stopped");
    }
}
