// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Prometheus metrics for mesh telemetry.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `sigma_mesh_field_coherence` | gauge | |
//! | `sigma_mesh_active_agents` | gauge | |
//! | `sigma_mesh_total_agents` | gauge | |
//! | `sigma_mesh_agent_coherence` | gauge | `agent_id` |
//! | `sigma_mesh_status_transitions_total` | counter | `to` |

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::domain::agent::AgentStatus;
use crate::domain::snapshot::MeshSnapshot;

/// Install the global recorder and its scrape listener. Must be called from
/// within a tokio runtime.
pub fn install_prometheus_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("Failed to install Prometheus exporter on {}", addr))?;
    tracing::info!("Prometheus metrics listening on {}", addr);
    Ok(())
}

pub fn record_snapshot(snapshot: &MeshSnapshot) {
    ::metrics::gauge!("sigma_mesh_field_coherence").set(snapshot.field_coherence);
    ::metrics::gauge!("sigma_mesh_active_agents").set(snapshot.active_agents as f64);
    ::metrics::gauge!("sigma_mesh_total_agents").set(snapshot.total_agents as f64);
    for (id, agent) in &snapshot.agents {
        ::metrics::gauge!("sigma_mesh_agent_coherence", "agent_id" => id.to_string())
            .set(agent.coherence);
    }
}

pub fn record_transition(to: AgentStatus) {
    ::metrics::counter!("sigma_mesh_status_transitions_total", "to" => to.as_str()).increment(1);
}
