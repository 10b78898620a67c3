//! Client for invoking the Strategy Resolution Agent remotely
//!
//! Error bodies returned by the agent are decoded into [`ClientError::Api`]
//! so callers can branch on the machine-readable code.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use crate::contracts::*;
use crate::error::AgentError;
use crate::handler::{ApiError, ApiResponse};
use deploy_strategy_core::{RawWorkloadProfile, ReloadOutcome};

/// Strategy Resolution Agent client
pub struct StrategyResolutionClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl StrategyResolutionClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve a profile into a plan
    pub async fn resolve(
        &self,
        profile: RawWorkloadProfile,
        requested_by: Option<String>,
    ) -> Result<ClientResponse<ResolutionOutput>, ClientError> {
        let request = ResolveRequest {
            profile,
            requested_by,
            ..Default::default()
        };
        self.post_json("/api/v1/strategy/resolve", &request).await
    }

    /// Every rule evaluated against the profile
    pub async fn explain(
        &self,
        profile: RawWorkloadProfile,
    ) -> Result<ClientResponse<ExplainOutput>, ClientError> {
        self.post_json("/api/v1/strategy/explain", &ResolveRequest::new(profile))
            .await
    }

    pub async fn catalog_info(&self) -> Result<CatalogInfo, ClientError> {
        let url = format!("{}/api/v1/catalog", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        decode(response).await
    }

    /// Ask the agent to re-read its catalog file
    pub async fn reload(&self) -> Result<ClientResponse<ReloadOutcome>, ClientError> {
        let url = format!("{}/api/v1/catalog/reload", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        decode::<ApiResponse<ReloadOutcome>>(response)
            .await
            .map(ClientResponse::from)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<ClientResponse<T>, ClientError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        decode::<ApiResponse<T>>(response)
            .await
            .map(ClientResponse::from)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    Err(match serde_json::from_str::<ApiError>(&text) {
        Ok(body) => ClientError::Api {
            status: status.as_u16(),
            code: body.error,
            message: body.message,
        },
        Err(_) => ClientError::Server {
            status: status.as_u16(),
            message: text,
        },
    })
}

/// Client response
#[derive(Debug)]
pub struct ClientResponse<T> {
    pub success: bool,
    pub data: T,
    pub request_id: uuid::Uuid,
}

impl<T> From<ApiResponse<T>> for ClientResponse<T> {
    fn from(response: ApiResponse<T>) -> Self {
        Self {
            success: response.success,
            data: response.data,
            request_id: response.request_id,
        }
    }
}

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Structured error returned by the agent
    #[error("{code} ({status}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
}

impl From<ClientError> for AgentError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Api { code, message, .. } => AgentError::Remote { code, message },
            other => AgentError::internal(other.to_string()),
        }
    }
}

impl ClientError {
    /// True when the agent found no rule for the profile
    pub fn is_no_match(&self) -> bool {
        matches!(self, ClientError::Api { status, .. } if *status == StatusCode::NOT_FOUND.as_u16())
    }
}
