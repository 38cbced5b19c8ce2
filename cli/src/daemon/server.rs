// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server for daemon mode

use anyhow::{Context, Result};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use sigma_mesh_core::application::governor::MeshGovernor;
use sigma_mesh_core::application::pulse::HeartbeatPulse;
use sigma_mesh_core::application::signals::{
    signal_channel, AgentSignal, LocalHeartbeat, SignalIngestor, DEFAULT_SIGNAL_CAPACITY,
};
use sigma_mesh_core::application::status::{StandardStatusService, StatusService};
use sigma_mesh_core::domain::mesh_config::{MeshConfigManifest, MeshConfigSpec};
use sigma_mesh_core::infrastructure::event_bus::{EventBus, EventBusError};
use sigma_mesh_core::infrastructure::metrics::install_prometheus_exporter;
use sigma_mesh_core::infrastructure::registry::InMemoryAgentRegistry;
use sigma_mesh_core::infrastructure::signal_listener::SignalListener;
use sigma_mesh_core::presentation::api::app;

/// The seeded mesh and its background tasks: event log, signal ingestor,
/// local heartbeat, optional signal listener and heartbeat pulse.
pub struct MeshRuntime {
    registry: Arc<InMemoryAgentRegistry>,
    status_service: Arc<dyn StatusService>,
    signals: mpsc::Sender<AgentSignal>,
    signal_addr: Option<SocketAddr>,
    shutdown_tokens: Vec<CancellationToken>,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
    event_log: JoinHandle<()>,
}

impl MeshRuntime {
    /// Seed the registry through the governor and start the background
    /// tasks. The signal listener binds `bind_address` when
    /// `spec.network.signal_port` is set.
    pub async fn start(spec: &MeshConfigSpec, bind_address: &str) -> Result<Self> {
        let registry = Arc::new(InMemoryAgentRegistry::new());
        let events = EventBus::with_default_capacity();
        let governor = Arc::new(MeshGovernor::new(registry.clone(), events.clone()));

        // Subscribe before seeding so registrations are logged too.
        let event_log = spawn_event_log(&events);

        for agent in spec.seed_agents(Utc::now()) {
            let agent_id = agent.id.clone();
            governor
                .register_agent(agent)
                .await
                .with_context(|| format!("Failed to register seed agent {}", agent_id))?;
        }

        let mut shutdown_tokens = Vec::new();
        let mut tasks = Vec::new();

        let (signals, receiver) = signal_channel(DEFAULT_SIGNAL_CAPACITY);
        let ingestor = SignalIngestor::new(governor, receiver);
        shutdown_tokens.push(ingestor.shutdown_token());
        tasks.push(("signal ingestor", ingestor.start()));

        let local = LocalHeartbeat::new(
            signals.clone(),
            spec.local_agent_ids(),
            spec.heartbeat.interval(),
        );
        shutdown_tokens.push(local.shutdown_token());
        tasks.push(("local heartbeat", local.start()));

        let mut signal_addr = None;
        if let Some(port) = spec.network.signal_port {
            let addr = format!("{}:{}", bind_address, port);
            let listener = SignalListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind signal listener to {}", addr))?;
            signal_addr = Some(listener.local_addr()?);
            let token = CancellationToken::new();
            shutdown_tokens.push(token.clone());
            tasks.push(("signal listener", listener.start(signals.clone(), token)));
        }

        let status_service: Arc<dyn StatusService> = Arc::new(StandardStatusService::new(
            registry.clone(),
            spec.heartbeat,
            spec.lambda_phi,
        ));

        let pulse = HeartbeatPulse::new(status_service.clone(), events, spec.heartbeat.interval());
        shutdown_tokens.push(pulse.shutdown_token());
        tasks.push(("heartbeat pulse", pulse.start()));

        Ok(Self {
            registry,
            status_service,
            signals,
            signal_addr,
            shutdown_tokens,
            tasks,
            event_log,
        })
    }

    pub fn status_service(&self) -> Arc<dyn StatusService> {
        self.status_service.clone()
    }

    /// Sender for in-process agents reporting into the mesh.
    pub fn signals(&self) -> mpsc::Sender<AgentSignal> {
        self.signals.clone()
    }

    /// Bound address of the signal listener, if enabled.
    pub fn signal_addr(&self) -> Option<SocketAddr> {
        self.signal_addr
    }

    /// Stop every background task and close the registry.
    pub async fn shutdown(self) {
        for token in &self.shutdown_tokens {
            token.cancel();
        }
        for (name, handle) in self.tasks {
            if let Err(e) = handle.await {
                warn!("{} task ended abnormally: {}", name, e);
            }
        }
        self.event_log.abort();
        self.registry.shutdown();
    }
}

pub async fn start_daemon(config: MeshConfigManifest, host: String, port: u16) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;
    let spec = &config.spec;

    info!(
        mesh = %config.metadata.name,
        interval_ms = spec.heartbeat.interval_ms,
        stale_multiplier = spec.heartbeat.stale_multiplier,
        "Starting Σ-mesh status daemon"
    );

    if spec.observability.metrics.enabled {
        let addr: SocketAddr = format!(
            "{}:{}",
            spec.network.bind_address, spec.observability.metrics.port
        )
        .parse()
        .context("Invalid metrics listen address")?;
        install_prometheus_exporter(addr)?;
    }

    let runtime = MeshRuntime::start(spec, &spec.network.bind_address).await?;

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Daemon listening on {}", addr);

    let served = axum::serve(listener, app(runtime.status_service()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed");

    runtime.shutdown().await;

    info!("Daemon shutting down");
    served
}

fn spawn_event_log(events: &EventBus) -> JoinHandle<()> {
    let mut receiver = events.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(event) => debug!(agent_id = %event.agent_id(), ?event, "Mesh event"),
                Err(EventBusError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigma_mesh_core::domain::agent::{AgentId, AgentKind, AgentStatus};
    use sigma_mesh_core::domain::mesh_config::{AgentSeed, HeartbeatSource};
    use sigma_mesh_sdk::MeshClient;
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpStream;

    /// Serve `runtime` on an ephemeral port and return a client for it.
    async fn serve(runtime: &MeshRuntime) -> (MeshClient, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = app(runtime.status_service());
        let server = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (MeshClient::new(format!("http://{}", addr)), server)
    }

    fn fast_spec() -> MeshConfigSpec {
        let mut spec = MeshConfigSpec::default();
        spec.heartbeat.interval_ms = 50;
        spec
    }

    fn seed(id: &str, heartbeat: HeartbeatSource) -> AgentSeed {
        AgentSeed {
            id: AgentId::new(id),
            kind: AgentKind::Worker,
            status: AgentStatus::Active,
            coherence: 0.5,
            pathways_in: Vec::new(),
            pathways_out: Vec::new(),
            heartbeat,
        }
    }

    #[tokio::test]
    async fn test_served_mesh_stays_live_past_stale_window() {
        let spec = fast_spec();
        let runtime = MeshRuntime::start(&spec, "127.0.0.1").await.unwrap();
        let (client, server) = serve(&runtime).await;

        // Four stale windows (K × interval = 150 ms).
        tokio::time::sleep(Duration::from_millis(600)).await;

        let snapshot = client.mesh_status().await.unwrap();
        assert_eq!(snapshot.total_agents, 8);
        assert_eq!(snapshot.active_agents, 6);
        assert!(snapshot
            .agents
            .values()
            .all(|agent| agent.status != AgentStatus::Disconnected));

        server.abort();
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_external_agent_reports_over_signal_listener() {
        let mut spec = fast_spec();
        spec.network.signal_port = Some(0);
        spec.agents = vec![
            seed("Local.v1", HeartbeatSource::Local),
            seed("Remote.v1", HeartbeatSource::External),
        ];
        let runtime = MeshRuntime::start(&spec, "127.0.0.1").await.unwrap();
        let (client, server) = serve(&runtime).await;

        tokio::time::sleep(Duration::from_millis(400)).await;
        let remote = client.agent_status("Remote.v1").await.unwrap();
        assert_eq!(remote.agent.status, AgentStatus::Disconnected);
        let local = client.agent_status("Local.v1").await.unwrap();
        assert_eq!(local.agent.status, AgentStatus::Active);

        let mut stream = TcpStream::connect(runtime.signal_addr().unwrap()).await.unwrap();
        stream
            .write_all(b"{\"type\":\"heartbeat\",\"agent_id\":\"Remote.v1\"}\n")
            .await
            .unwrap();

        let mut status = AgentStatus::Disconnected;
        for _ in 0..20 {
            status = client.agent_status("Remote.v1").await.unwrap().agent.status;
            if status == AgentStatus::Active {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(status, AgentStatus::Active);

        server.abort();
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_fault_signal_is_sticky_in_served_mesh() {
        let runtime = MeshRuntime::start(&fast_spec(), "127.0.0.1").await.unwrap();
        let (client, server) = serve(&runtime).await;

        runtime
            .signals()
            .send(AgentSignal::Fault { agent_id: AgentId::new("QuantumAgent.v1") })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let snapshot = client.mesh_status().await.unwrap();
        assert_eq!(snapshot.agents[&AgentId::new("QuantumAgent.v1")].status, AgentStatus::Error);
        assert_eq!(snapshot.active_agents, 5);

        server.abort();
        runtime.shutdown().await;
    }
}
