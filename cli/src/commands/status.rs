// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `sigma status`: print the whole-mesh snapshot

use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};

use sigma_mesh_sdk::{AgentStatus, MeshClient, MeshSnapshot};

pub async fn execute(base_url: &str, json: bool) -> Result<()> {
    let client = MeshClient::new(base_url);
    let snapshot = client
        .mesh_status()
        .await
        .with_context(|| format!("Failed to query mesh status from {}", base_url))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn print_snapshot(snapshot: &MeshSnapshot) {
    println!("{}", "Σ-Mesh Status".bold());
    println!("  Field coherence: {:.5}", snapshot.field_coherence);
    println!("  Lambda phi:      {:e}", snapshot.lambda_phi);
    println!(
        "  Active agents:   {}/{}",
        snapshot.active_agents, snapshot.total_agents
    );
    println!("  Heartbeat:       {} ms", snapshot.heartbeat_interval_ms);
    println!("  Timestamp:       {}", snapshot.timestamp.to_rfc3339());
    println!();

    println!(
        "{:<22} {:<24} {:<14} {:>9}",
        "AGENT".bold(),
        "KIND".bold(),
        "STATUS".bold(),
        "COHERENCE".bold()
    );
    for agent in snapshot.agents.values() {
        println!(
            "{:<22} {:<24} {:<14} {:>9.2}",
            agent.id.as_str(),
            agent.kind.as_str(),
            paint(agent.status),
            agent.coherence
        );
    }

    if !snapshot.warnings.is_empty() {
        println!();
        println!("{}", "Graph integrity warnings:".yellow().bold());
        for warning in &snapshot.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }
}

pub(crate) fn paint(status: AgentStatus) -> ColoredString {
    match status {
        AgentStatus::Active => status.as_str().green(),
        AgentStatus::Idle => status.as_str().normal(),
        AgentStatus::Processing => status.as_str().cyan(),
        AgentStatus::Error => status.as_str().red(),
        AgentStatus::Disconnected => status.as_str().dimmed(),
    }
}
