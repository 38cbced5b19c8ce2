// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Σ-Mesh CLI
//!
//! The `sigma` binary runs the mesh status daemon and queries it.
//!
//! ## Commands
//!
//! - `sigma serve` - Run the status daemon in the foreground
//! - `sigma status` - Print the whole-mesh snapshot
//! - `sigma agent <ID>` - Print one agent
//! - `sigma config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::SubscriberInitExt;

use sigma_mesh::commands::{self, ConfigCommand};
use sigma_mesh::daemon::base_url;
use sigma_mesh_core::domain::mesh_config::{LogFormat, MeshConfigManifest};

/// Σ-Mesh status service
#[derive(Parser)]
#[command(name = "sigma")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "SIGMA_MESH_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// HTTP API port (default: spec.network.port, 8000)
    #[arg(long, global = true, env = "SIGMA_MESH_PORT")]
    port: Option<u16>,

    /// HTTP API host (default: spec.network.bind_address, 127.0.0.1)
    #[arg(long, global = true, env = "SIGMA_MESH_HOST")]
    host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "SIGMA_MESH_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the mesh status daemon
    #[command(name = "serve")]
    Serve,

    /// Show the whole-mesh status
    #[command(name = "status")]
    Status {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one agent
    #[command(name = "agent")]
    Agent {
        /// Agent ID, e.g. CodingAgent.v1
        #[arg(value_name = "AGENT_ID")]
        agent_id: String,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config discovery logs through a bootstrap subscriber; the configured
    // level and format take over once the file is read.
    let bootstrap = subscriber(
        cli.log_level.as_deref().unwrap_or("info"),
        LogFormat::Compact,
        std::io::stdout,
    )?;
    let config = load_config(&cli, bootstrap)?;

    let logging = config
        .as_ref()
        .map(|c| c.spec.observability.logging.clone())
        .unwrap_or_default();
    subscriber(
        cli.log_level.as_deref().unwrap_or(&logging.level),
        logging.format,
        std::io::stdout,
    )?
    .try_init()
    .context("Failed to install log subscriber")?;

    match cli.command {
        Commands::Serve => {
            commands::serve::execute(config.unwrap_or_default(), cli.host, cli.port).await
        }
        Commands::Status { json } => {
            let url = target(&config, cli.host, cli.port);
            commands::status::execute(&url, json).await
        }
        Commands::Agent { agent_id, json } => {
            let url = target(&config, cli.host, cli.port);
            commands::agent::execute(&url, &agent_id, json).await
        }
        Commands::Config { command } => commands::config::handle_command(command, cli.config).await,
    }
}

/// Load configuration while `bootstrap` collects the loader's logs.
///
/// A missing or malformed file is fatal, except for `config` subcommands,
/// which report it themselves.
fn load_config(cli: &Cli, bootstrap: BoxedSubscriber) -> Result<Option<MeshConfigManifest>> {
    let loaded = tracing::subscriber::with_default(bootstrap, || {
        MeshConfigManifest::load_or_default(cli.config.clone())
    });

    match loaded {
        Ok(config) => Ok(Some(config)),
        Err(_) if matches!(cli.command, Commands::Config { .. }) => Ok(None),
        Err(e) => Err(e.context("Failed to load configuration")),
    }
}

/// Daemon URL from flags, then configuration, then defaults.
fn target(config: &Option<MeshConfigManifest>, host: Option<String>, port: Option<u16>) -> String {
    let network = config.as_ref().map(|c| c.spec.network.clone()).unwrap_or_default();
    base_url(
        &host.unwrap_or(network.bind_address),
        port.unwrap_or(network.port),
    )
}

type BoxedSubscriber = Box<dyn tracing::Subscriber + Send + Sync>;

/// Build the tracing subscriber for logging. `RUST_LOG` takes precedence
/// over `level`.
fn subscriber<W>(level: &str, format: LogFormat, writer: W) -> Result<BoxedSubscriber>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    Ok(match format {
        LogFormat::Compact => Box::new(builder.compact().finish()),
        LogFormat::Json => Box::new(builder.json().finish()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_command_parses() {
        let cli = Cli::try_parse_from(["sigma", "--port", "9000", "agent", "SafetyAgent.v1", "--json"])
            .unwrap();
        assert_eq!(cli.port, Some(9000));
        assert!(matches!(
            cli.command,
            Commands::Agent { ref agent_id, json: true } if agent_id == "SafetyAgent.v1"
        ));
    }

    #[test]
    fn test_target_defaults() {
        assert_eq!(target(&None, None, None), "http://127.0.0.1:8000");
        assert_eq!(
            target(&None, Some("mesh.internal".into()), Some(80)),
            "http://mesh.internal:80"
        );
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn quiet() -> BoxedSubscriber {
        subscriber("off", LogFormat::Compact, std::io::sink).unwrap()
    }

    #[test]
    fn test_explicit_bad_config_is_fatal() {
        let missing = "/nonexistent/sigma-mesh.yaml";

        let cli = Cli::try_parse_from(["sigma", "--config", missing, "status"]).unwrap();
        let err = load_config(&cli, quiet()).unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));

        let cli = Cli::try_parse_from(["sigma", "--config", missing, "agent", "IOAgent.v1"]).unwrap();
        assert!(load_config(&cli, quiet()).is_err());

        let cli = Cli::try_parse_from(["sigma", "--config", missing, "config", "validate"]).unwrap();
        assert!(load_config(&cli, quiet()).unwrap().is_none());
    }

    #[test]
    fn test_explicit_config_is_used_for_target() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sigma-mesh.yaml");
        let mut manifest = MeshConfigManifest::default();
        manifest.spec.network.port = 9300;
        manifest.to_yaml_file(&path).unwrap();

        let cli = Cli::try_parse_from(["sigma", "--config", path.to_str().unwrap(), "status"]).unwrap();
        let config = load_config(&cli, quiet()).unwrap();
        assert_eq!(target(&config, None, None), "http://127.0.0.1:9300");
    }

    #[test]
    fn test_config_loader_logs_reach_bootstrap_subscriber() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sigma-mesh.yaml");
        MeshConfigManifest::default().to_yaml_file(&path).unwrap();

        let captured = Captured::default();
        let sink = captured.clone();
        let bootstrap = subscriber("info", LogFormat::Compact, move || sink.clone()).unwrap();

        let cli = Cli::try_parse_from(["sigma", "--config", path.to_str().unwrap(), "status"]).unwrap();
        assert!(load_config(&cli, bootstrap).unwrap().is_some());

        let logs = String::from_utf8(captured.0.lock().clone()).unwrap();
        assert!(logs.contains("Loading configuration from explicit path"), "{logs}");
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
