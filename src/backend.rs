use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::action::ActionRequest;

/// Connection establishment is bounded; a connected request is awaited
/// to completion because assistant generations are legitimately slow.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Failure classes for one backend call. Anything the transport cannot
/// classify more precisely is a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("backend unreachable")]
    NetworkUnreachable,
    #[error("backend returned HTTP {0}")]
    HttpStatus(u16),
    #[error("malformed backend response")]
    Protocol,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .expect("failed to build http client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST one action request to the chat endpoint and return the
    /// assistant's reply text. No retries, no cancellation: the call
    /// runs to completion or failure.
    pub async fn send(&self, request: &ActionRequest) -> Result<String, SendError> {
        let url = format!("{}/chat", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| classify(request.action.as_str(), err))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                action = request.action.as_str(),
                status = status.as_u16(),
                "backend returned error status"
            );
            return Err(SendError::HttpStatus(status.as_u16()));
        }

        let body: ChatResponse = response.json().await.map_err(|err| {
            tracing::warn!(
                action = request.action.as_str(),
                "unparseable backend response: {err}"
            );
            SendError::Protocol
        })?;

        Ok(body.response)
    }

    /// Probe the backend's health endpoint. Used once at startup for
    /// the header status indicator; never gates an action.
    pub async fn health(&self) -> Result<(), SendError> {
        let url = format!("{}/health", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| classify("HEALTH", err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SendError::HttpStatus(status.as_u16()));
        }
        Ok(())
    }
}

/// Connection-level failures (refused, DNS, connect timeout) mean the
/// backend is not there; everything else on the request path is a
/// protocol error.
fn classify(action: &str, err: reqwest::Error) -> SendError {
    tracing::warn!(action, "request failed: {err}");
    if err.is_connect() || err.is_timeout() {
        SendError::NetworkUnreachable
    } else {
        SendError::Protocol
    }
}
