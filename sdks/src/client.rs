// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::types::{AgentStatusView, HealthStatus, MeshSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Mesh API returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Client for the Σ-mesh status API.
#[derive(Debug, Clone)]
pub struct MeshClient {
    base_url: String,
    client: Client,
}

impl MeshClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    /// Fetch the whole-mesh snapshot.
    pub async fn mesh_status(&self) -> Result<MeshSnapshot, ClientError> {
        let url = format!("{}/api/agents/status", self.base_url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    /// Fetch one agent with the mesh-level summary fields.
    pub async fn agent_status(&self, agent_id: &str) -> Result<AgentStatusView, ClientError> {
        let url = self.endpoint(&["api", "agents", "status", agent_id])?;
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::AgentNotFound(agent_id.to_string()));
        }
        decode(response).await
    }

    /// Base URL plus `segments`, each percent-encoded as a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v["error"].as_str().map(str::to_string))
            .unwrap_or(body);
        return Err(ClientError::Api { status, message });
    }
    Ok(response.json().await?)
}
