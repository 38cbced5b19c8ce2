// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Heartbeat liveness classification.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::agent::AgentStatus;

pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 220;
pub const DEFAULT_STALE_MULTIPLIER: u32 = 3;

/// Mesh-wide liveness policy: an agent whose last heartbeat is older than
/// `stale_multiplier × interval_ms` is considered disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatPolicy {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default = "default_stale_multiplier")]
    pub stale_multiplier: u32,
}

impl HeartbeatPolicy {
    pub fn new(interval_ms: u64, stale_multiplier: u32) -> Self {
        Self {
            interval_ms,
            stale_multiplier,
        }
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval_ms)
    }

    /// Maximum heartbeat age before an agent counts as stale.
    pub fn stale_after(&self) -> Duration {
        let millis = self
            .interval_ms
            .saturating_mul(u64::from(self.stale_multiplier))
            .min(i64::MAX as u64);
        Duration::milliseconds(millis as i64)
    }

    /// Heartbeats stamped in the future count as fresh.
    pub fn is_stale(&self, last_heartbeat: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last_heartbeat) > self.stale_after()
    }

    /// Effective status of an agent at `now`.
    ///
    /// `error` is never overridden; otherwise a stale heartbeat forces
    /// `disconnected`, and a fresh one leaves the stored status unchanged.
    pub fn classify(
        &self,
        status: AgentStatus,
        last_heartbeat: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AgentStatus {
        match status {
            AgentStatus::Error => AgentStatus::Error,
            _ if self.is_stale(last_heartbeat, now) => AgentStatus::Disconnected,
            stored => stored,
        }
    }
}

impl Default for HeartbeatPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_STALE_MULTIPLIER)
    }
}

fn default_interval_ms() -> u64 {
    DEFAULT_HEARTBEAT_INTERVAL_MS
}

fn default_stale_multiplier() -> u32 {
    DEFAULT_STALE_MULTIPLIER
}
