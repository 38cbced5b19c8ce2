// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `sigma agent <ID>`: print one agent with the mesh summary

use anyhow::Result;
use colored::Colorize;

use sigma_mesh_sdk::{AgentStatusView, ClientError, MeshClient};

use super::status::paint;

pub async fn execute(base_url: &str, agent_id: &str, json: bool) -> Result<()> {
    let client = MeshClient::new(base_url);
    let view = match client.agent_status(agent_id).await {
        Ok(view) => view,
        Err(ClientError::AgentNotFound(id)) => {
            anyhow::bail!("Agent not found: {}", id);
        }
        Err(e) => return Err(anyhow::Error::new(e).context("Failed to query agent status")),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view);
    }
    Ok(())
}

fn print_view(view: &AgentStatusView) {
    let agent = &view.agent;
    let join = |endpoints: &[sigma_mesh_sdk::AgentEndpoint]| {
        endpoints
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("{}", agent.id.as_str().bold());
    println!("  Kind:           {}", agent.kind);
    println!("  Status:         {}", paint(agent.status));
    println!("  Coherence:      {:.2}", agent.coherence);
    println!("  Last heartbeat: {}", agent.last_heartbeat.to_rfc3339());
    println!("  Pathways in:    {}", join(&agent.pathways_in));
    println!("  Pathways out:   {}", join(&agent.pathways_out));
    println!();
    println!("  Mesh coherence: {:.5}", view.mesh_coherence);
    println!("  Lambda phi:     {:e}", view.lambda_phi);
}
