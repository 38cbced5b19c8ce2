// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! TCP listener for agents hosted outside the daemon.
//!
//! Each connection carries newline-delimited JSON [`AgentSignal`]s, e.g.
//! `{"type":"heartbeat","agent_id":"IOAgent.v1"}`. Malformed lines are
//! logged and skipped; the connection stays open.

use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::signal::AgentSignal;

pub struct SignalListener {
    listener: TcpListener,
}

impl SignalListener {
    pub async fn bind(addr: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown_token` is cancelled.
    pub fn start(
        self,
        sender: mpsc::Sender<AgentSignal>,
        shutdown_token: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Ok(addr) = self.listener.local_addr() {
                info!("Agent signal listener on {}", addr);
            }

            loop {
                tokio::select! {
                    accepted = self.listener.accept() => match accepted {
                        Ok((stream, peer)) => {
                            debug!(%peer, "Signal connection opened");
                            tokio::spawn(read_signals(
                                stream,
                                sender.clone(),
                                shutdown_token.child_token(),
                            ));
                        }
                        Err(e) => warn!("Failed to accept signal connection: {}", e),
                    },
                    _ = shutdown_token.cancelled() => {
                        info!("Shutdown signal received, stopping signal listener");
                        break;
                    }
                }
            }
        })
    }
}

async fn read_signals<R>(
    reader: R,
    sender: mpsc::Sender<AgentSignal>,
    shutdown_token: CancellationToken,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = shutdown_token.cancelled() => break,
        };

        match line {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match serde_json::from_str::<AgentSignal>(&line) {
                Ok(signal) => {
                    if sender.send(signal).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Ignoring malformed agent signal: {}", e),
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Signal connection failed: {}", e);
                break;
            }
        }
    }
}
