// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `sigma serve`: run the status daemon in the foreground

use anyhow::Result;

use sigma_mesh_core::domain::mesh_config::MeshConfigManifest;

use crate::daemon::start_daemon;

/// `host` and `port` override the configured network settings when given.
pub async fn execute(
    config: MeshConfigManifest,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let host = host.unwrap_or_else(|| config.spec.network.bind_address.clone());
    let port = port.unwrap_or(config.spec.network.port);

    start_daemon(config, host, port).await
}
