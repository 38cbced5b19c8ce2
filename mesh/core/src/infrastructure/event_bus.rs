// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus Implementation - Pub/Sub for Mesh Events
//
// Provides in-memory event streaming using tokio broadcast channels.
// Events are not persisted; a slow subscriber that falls behind the channel
// capacity loses the oldest events and is told how many it missed.

use crate::domain::agent::AgentId;
use crate::domain::events::MeshEvent;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Event bus for publishing and subscribing to mesh events
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<MeshEvent>>,
}

impl EventBus {
    /// Create a new event bus buffering up to `capacity` events per
    /// subscriber
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Create event bus with default capacity (1000)
    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    /// Publish an event to all subscribers
    pub fn publish(&self, event: MeshEvent) {
        debug!("Publishing event: {:?}", event);

        let receiver_count = self.sender.send(event).unwrap_or(0);
        if receiver_count == 0 {
            debug!("No subscribers listening to event");
        }
    }

    /// Subscribe to all mesh events
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            agent_id: None,
        }
    }

    /// Subscribe to events of a single agent
    pub fn subscribe_agent(&self, agent_id: AgentId) -> EventReceiver {
        EventReceiver {
            receiver: self.sender.subscribe(),
            agent_id: Some(agent_id),
        }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Receiver for mesh events, optionally filtered to one agent
pub struct EventReceiver {
    receiver: broadcast::Receiver<MeshEvent>,
    agent_id: Option<AgentId>,
}

impl EventReceiver {
    /// Receive the next matching event (waits until one is available)
    pub async fn recv(&mut self) -> Result<MeshEvent, EventBusError> {
        loop {
            let event = self.receiver.recv().await.map_err(|e| match e {
                broadcast::error::RecvError::Closed => EventBusError::Closed,
                broadcast::error::RecvError::Lagged(n) => {
                    warn!("Event receiver lagged by {} events", n);
                    EventBusError::Lagged(n)
                }
            })?;

            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Try to receive a matching event without waiting
    pub fn try_recv(&mut self) -> Result<MeshEvent, EventBusError> {
        loop {
            let event = self.receiver.try_recv().map_err(|e| match e {
                broadcast::error::TryRecvError::Empty => EventBusError::Empty,
                broadcast::error::TryRecvError::Closed => EventBusError::Closed,
                broadcast::error::TryRecvError::Lagged(n) => {
                    warn!("Event receiver lagged by {} events", n);
                    EventBusError::Lagged(n)
                }
            })?;

            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    fn matches(&self, event: &MeshEvent) -> bool {
        self.agent_id
            .as_ref()
            .map_or(true, |id| event.agent_id() == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EventBusError {
    #[error("Event bus closed")]
    Closed,

    #[error("Receiver lagged by {0} events")]
    Lagged(u64),

    #[error("No events available")]
    Empty,
}
