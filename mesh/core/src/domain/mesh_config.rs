// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Mesh Configuration Types
//
// Defines the configuration schema for a Σ-mesh status node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Heartbeat policy and lambda phi constant
// - Seed agents registered at startup
// - Network and observability settings

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::agent::{Agent, AgentEndpoint, AgentId, AgentKind, AgentStatus, LAMBDA_PHI};
use crate::domain::heartbeat::HeartbeatPolicy;
use crate::domain::organisms;

pub const API_VERSION: &str = "sigma-mesh/v1";
pub const KIND: &str = "MeshConfig";
pub const CONFIG_PATH_ENV: &str = "SIGMA_MESH_CONFIG_PATH";

/// Top-level Kubernetes-style mesh configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfigManifest {
    /// API version (must be "sigma-mesh/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "MeshConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: MeshConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable mesh name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfigSpec {
    /// Liveness-check cadence shared by every agent in the mesh
    #[serde(default)]
    pub heartbeat: HeartbeatPolicy,

    /// Fixed per deployment, echoed verbatim in telemetry
    #[serde(default = "default_lambda_phi")]
    pub lambda_phi: f64,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Agents registered at startup. Empty means the default organism mesh.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentSeed>,
}

/// Agent record as declared in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSeed {
    pub id: AgentId,
    pub kind: AgentKind,
    #[serde(default = "default_seed_status")]
    pub status: AgentStatus,
    pub coherence: f64,
    #[serde(default)]
    pub pathways_in: Vec<AgentEndpoint>,
    #[serde(default)]
    pub pathways_out: Vec<AgentEndpoint>,
    #[serde(default, skip_serializing_if = "HeartbeatSource::is_local")]
    pub heartbeat: HeartbeatSource,
}

/// Who keeps a seeded agent's heartbeat fresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatSource {
    /// The agent runs inside the daemon, which heartbeats it every interval.
    #[default]
    Local,
    /// The agent reports its own heartbeats over the signal listener.
    External,
}

impl HeartbeatSource {
    pub fn is_local(&self) -> bool {
        matches!(self, HeartbeatSource::Local)
    }
}

impl AgentSeed {
    /// Materialize the seed as an agent whose last heartbeat is `now`.
    pub fn into_agent(self, now: DateTime<Utc>) -> Agent {
        Agent::new(self.id, self.kind)
            .with_status(self.status)
            .with_coherence(self.coherence)
            .with_last_heartbeat(now)
            .with_pathways_in(self.pathways_in)
            .with_pathways_out(self.pathways_out)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Port of the newline-delimited JSON agent signal listener. Unset
    /// disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal_port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Port of the Prometheus scrape listener
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_lambda_phi() -> f64 {
    LAMBDA_PHI
}

fn default_seed_status() -> AgentStatus {
    AgentStatus::Idle
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_metrics_port() -> u16 {
    9091
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
            signal_port: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_metrics_port(),
        }
    }
}

impl Default for MeshConfigSpec {
    fn default() -> Self {
        Self {
            heartbeat: HeartbeatPolicy::default(),
            lambda_phi: LAMBDA_PHI,
            network: NetworkConfig::default(),
            observability: ObservabilityConfig::default(),
            agents: Vec::new(),
        }
    }
}

impl Default for MeshConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "sigma-mesh".to_string(),
                version: None,
                labels: None,
            },
            spec: MeshConfigSpec::default(),
        }
    }
}

impl MeshConfigSpec {
    /// Seed agents, falling back to the default organism mesh.
    pub fn seed_agents(&self, now: DateTime<Utc>) -> Vec<Agent> {
        self.seeds()
            .into_iter()
            .map(|seed| seed.into_agent(now))
            .collect()
    }

    /// Seed agents the daemon heartbeats itself.
    pub fn local_agent_ids(&self) -> Vec<AgentId> {
        self.seeds()
            .into_iter()
            .filter(|seed| seed.heartbeat.is_local())
            .map(|seed| seed.id)
            .collect()
    }

    fn seeds(&self) -> Vec<AgentSeed> {
        if self.agents.is_empty() {
            organisms::default_mesh()
        } else {
            self.agents.clone()
        }
    }
}

impl MeshConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. SIGMA_MESH_CONFIG_PATH environment variable
    /// 2. ./sigma-mesh.yaml (working directory)
    /// 3. ~/.sigma-mesh/config.yaml (user home)
    /// 4. /etc/sigma-mesh/config.yaml (Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./sigma-mesh.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".sigma-mesh").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/sigma-mesh/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`; invalid values are logged and
    /// ignored.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("SIGMA_MESH_HEARTBEAT_INTERVAL_MS") {
            match val.trim().parse::<u64>() {
                Ok(ms) => {
                    tracing::info!("Environment override: SIGMA_MESH_HEARTBEAT_INTERVAL_MS={}", ms);
                    self.spec.heartbeat.interval_ms = ms;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for SIGMA_MESH_HEARTBEAT_INTERVAL_MS: '{}'. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("SIGMA_MESH_STALE_MULTIPLIER") {
            match val.trim().parse::<u32>() {
                Ok(k) => {
                    tracing::info!("Environment override: SIGMA_MESH_STALE_MULTIPLIER={}", k);
                    self.spec.heartbeat.stale_multiplier = k;
                }
                Err(_) => tracing::warn!(
                    "Invalid value for SIGMA_MESH_STALE_MULTIPLIER: '{}'. Ignoring.",
                    val
                ),
            }
        }

        if let Some(val) = lookup("SIGMA_MESH_PORT") {
            match val.trim().parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: SIGMA_MESH_PORT={}", port);
                    self.spec.network.port = port;
                }
                Err(_) => tracing::warn!("Invalid value for SIGMA_MESH_PORT: '{}'. Ignoring.", val),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.heartbeat.interval_ms == 0 {
            anyhow::bail!("spec.heartbeat.interval_ms must be greater than zero");
        }

        if self.spec.heartbeat.stale_multiplier == 0 {
            anyhow::bail!("spec.heartbeat.stale_multiplier must be at least 1");
        }

        if !self.spec.lambda_phi.is_finite() {
            anyhow::bail!("spec.lambda_phi must be a finite number");
        }

        if let Some(signal_port) = self.spec.network.signal_port {
            if signal_port == self.spec.network.port {
                anyhow::bail!("spec.network.signal_port must differ from spec.network.port");
            }
            if self.spec.observability.metrics.enabled
                && signal_port == self.spec.observability.metrics.port
            {
                anyhow::bail!(
                    "spec.network.signal_port must differ from spec.observability.metrics.port"
                );
            }
        }

        let mut seen = HashSet::new();
        for seed in &self.spec.agents {
            if seed.id.as_str().is_empty() {
                anyhow::bail!("Agent id cannot be empty");
            }
            if !seen.insert(&seed.id) {
                anyhow::bail!("Duplicate agent id in spec.agents: {}", seed.id);
            }
            if !(0.0..=1.0).contains(&seed.coherence) {
                anyhow::bail!(
                    "Coherence of {} must be within [0, 1], got {}",
                    seed.id,
                    seed.coherence
                );
            }
        }

        Ok(())
    }
}
