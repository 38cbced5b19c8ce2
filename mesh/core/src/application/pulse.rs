// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Heartbeat Pulse - background liveness sweep
//!
//! Ticks at the mesh heartbeat interval, assembles a snapshot, and publishes
//! a `StatusChanged` event for every agent whose effective status differs
//! from the previous tick. Staleness is never written back to the registry;
//! `disconnected` only exists in snapshots.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Turns time-derived status changes into events and gauges

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::status::StatusService;
use crate::domain::agent::{AgentId, AgentStatus};
use crate::domain::events::MeshEvent;
use crate::domain::snapshot::MeshSnapshot;
use crate::infrastructure::event_bus::EventBus;
use crate::infrastructure::metrics;

pub struct HeartbeatPulse {
    status: Arc<dyn StatusService>,
    events: EventBus,
    interval: Duration,
    shutdown_token: CancellationToken,
}

impl HeartbeatPulse {
    pub fn new(status: Arc<dyn StatusService>, events: EventBus, interval: Duration) -> Self {
        Self {
            status,
            events,
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
        info!(interval_ms = self.interval.as_millis() as u64, "Starting heartbeat pulse");

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut previous: Option<BTreeMap<AgentId, AgentStatus>> = None;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    match self.status.get_mesh_status().await {
                        Ok(snapshot) => {
                            previous = Some(self.observe(previous.as_ref(), &snapshot));
                        }
                        Err(e) => {
                            warn!("Heartbeat pulse could not read mesh status: {}", e);
                        }
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping heartbeat pulse");
                    break;
                }
            }
        }

        info!("Heartbeat pulse stopped");
    }

    /// Publish transitions relative to `previous` and return the statuses
    /// to compare against on the next tick.
    fn observe(
        &self,
        previous: Option<&BTreeMap<AgentId, AgentStatus>>,
        snapshot: &MeshSnapshot,
    ) -> BTreeMap<AgentId, AgentStatus> {
        let current = snapshot.effective_statuses();
        metrics::record_snapshot(snapshot);

        if let Some(previous) = previous {
            for event in diff_statuses(previous, &current, snapshot.timestamp) {
                if let MeshEvent::StatusChanged { agent_id, from, to, .. } = &event {
                    metrics::record_transition(*to);
                    if *to == AgentStatus::Disconnected {
                        warn!(agent_id = %agent_id, from = %from, "Agent heartbeat went stale");
                    } else {
                        debug!(agent_id = %agent_id, from = %from, to = %to, "Agent status changed");
                    }
                }
                self.events.publish(event);
            }
        }

        current
    }
}

/// Status transitions between two ticks. Agents that appear for the first
/// time in `next` produce no event; registration is announced separately.
pub fn diff_statuses(
    previous: &BTreeMap<AgentId, AgentStatus>,
    next: &BTreeMap<AgentId, AgentStatus>,
    at: DateTime<Utc>,
) -> Vec<MeshEvent> {
    next.iter()
        .filter_map(|(id, &to)| {
            let &from = previous.get(id)?;
            (from != to).then(|| MeshEvent::StatusChanged {
                agent_id: id.clone(),
                from,
                to,
                changed_at: at,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::status::StandardStatusService;
    use crate::domain::agent::LAMBDA_PHI;
    use crate::domain::clock::FixedClock;
    use crate::domain::heartbeat::HeartbeatPolicy;
    use crate::domain::mesh_config::MeshConfigSpec;
    use crate::infrastructure::registry::InMemoryAgentRegistry;
    use chrono::TimeZone;

    fn statuses(entries: &[(&str, AgentStatus)]) -> BTreeMap<AgentId, AgentStatus> {
        entries
            .iter()
            .map(|(id, status)| (AgentId::from(*id), *status))
            .collect()
    }

    #[test]
    fn test_diff_reports_only_changes() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let previous = statuses(&[("A", AgentStatus::Active), ("B", AgentStatus::Idle)]);
        let next = statuses(&[
            ("A", AgentStatus::Disconnected),
            ("B", AgentStatus::Idle),
            ("C", AgentStatus::Active),
        ]);

        let events = diff_statuses(&previous, &next, at);
        assert_eq!(
            events,
            vec![MeshEvent::StatusChanged {
                agent_id: "A".into(),
                from: AgentStatus::Active,
                to: AgentStatus::Disconnected,
                changed_at: at,
            }]
        );
    }

    #[tokio::test]
    async fn test_observe_publishes_staleness() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let registry = Arc::new(
            InMemoryAgentRegistry::with_agents(MeshConfigSpec::default().seed_agents(start)).unwrap(),
        );
        let clock = Arc::new(FixedClock::new(start));
        let status: Arc<dyn StatusService> = Arc::new(
            StandardStatusService::new(registry, HeartbeatPolicy::default(), LAMBDA_PHI)
                .with_clock(clock.clone()),
        );
        let events = EventBus::with_default_capacity();
        let mut receiver = events.subscribe_agent("IOAgent.v1".into());
        let pulse = HeartbeatPulse::new(status.clone(), events, Duration::from_millis(220));

        let first = pulse.observe(None, &status.get_mesh_status().await.unwrap());
        assert!(receiver.try_recv().is_err());

        clock.advance(chrono::Duration::seconds(1));
        pulse.observe(Some(&first), &status.get_mesh_status().await.unwrap());
        assert!(matches!(
            receiver.try_recv().unwrap(),
            MeshEvent::StatusChanged {
                from: AgentStatus::Idle,
                to: AgentStatus::Disconnected,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_pulse_stops_on_cancel() {
        let status: Arc<dyn StatusService> = Arc::new(StandardStatusService::new(
            Arc::new(InMemoryAgentRegistry::new()),
            HeartbeatPolicy::default(),
            LAMBDA_PHI,
        ));
        let pulse = HeartbeatPulse::new(status, EventBus::default(), Duration::from_millis(10));
        let token = pulse.shutdown_token();
        let handle = pulse.start();

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("pulse did not stop")
            .unwrap();
    }
}
