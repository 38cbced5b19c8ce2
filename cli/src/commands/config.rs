// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use sigma_mesh_core::domain::mesh_config::{MeshConfigManifest, CONFIG_PATH_ENV};
use sigma_mesh_core::domain::organisms;

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./sigma-mesh.yaml)
        #[arg(short, long, default_value = "./sigma-mesh.yaml")]
        output: PathBuf,

        /// Spell out the default organism mesh under spec.agents
        #[arg(long)]
        agents: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override)),
        ConfigCommand::Generate { output, agents } => generate(&output, agents),
    }
}

fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = MeshConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./sigma-mesh.yaml");
        println!("  4. ~/.sigma-mesh/config.yaml");
        println!("  5. /etc/sigma-mesh/config.yaml");
        println!();
    }

    let spec = &config.spec;
    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Mesh:".bold());
    println!("  Name: {}", config.metadata.name);
    println!("  Lambda phi: {:e}", spec.lambda_phi);
    println!();

    println!("{}", "Heartbeat:".bold());
    println!("  Interval: {} ms", spec.heartbeat.interval_ms);
    println!(
        "  Stale after: {} missed intervals ({} ms)",
        spec.heartbeat.stale_multiplier,
        spec.heartbeat.stale_after().num_milliseconds()
    );
    println!();

    println!("{}", "Network:".bold());
    println!("  HTTP: {}:{}", spec.network.bind_address, spec.network.port);
    match spec.network.signal_port {
        Some(port) => println!("  Signals: {}:{}", spec.network.bind_address, port),
        None => println!("  Signals: {}", "disabled".dimmed()),
    }
    if spec.observability.metrics.enabled {
        println!("  Metrics: {}:{}", spec.network.bind_address, spec.observability.metrics.port);
    } else {
        println!("  Metrics: {}", "disabled".dimmed());
    }
    println!();

    println!("{}", "Agents:".bold());
    if spec.agents.is_empty() {
        println!("  {}", "(default organism mesh)".dimmed());
    }
    for seed in &spec.agents {
        let heartbeat = if seed.heartbeat.is_local() { "local" } else { "external" };
        println!(
            "  {} ({}, {}, {} heartbeat)",
            seed.id.as_str().bold(),
            seed.kind,
            seed.status,
            heartbeat
        );
    }
    println!();

    Ok(())
}

fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = MeshConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config
        .validate()
        .context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: &Path, with_agents: bool) -> Result<()> {
    let mut config = MeshConfigManifest::default();
    if with_agents {
        config.spec.agents = organisms::default_mesh();
    }

    config
        .to_yaml_file(output)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sigma-mesh.yaml");

        generate(&path, true).unwrap();
        let config = MeshConfigManifest::from_yaml_file(&path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.spec.agents.len(), 8);

        validate(Some(path)).unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_kind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(
            &path,
            "apiVersion: sigma-mesh/v1\nkind: NodeConfig\nmetadata:\n  name: test\nspec: {}\n",
        )
        .unwrap();

        assert!(validate(Some(path)).is_err());
    }
}
