// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod status;
pub mod governor;
pub mod pulse;
pub mod signals;

pub use status::{StandardStatusService, StatusError, StatusService};
pub use governor::{GovernorError, MeshGovernor};
pub use pulse::{diff_statuses, HeartbeatPulse};
pub use signals::{apply_signal, signal_channel, AgentSignal, LocalHeartbeat, SignalIngestor};
