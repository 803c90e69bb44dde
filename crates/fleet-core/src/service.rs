//! Client for the remote battle service: agent registration and the
//! per-agent rate-limit status query.

use crate::config::FleetConfig;
use crate::error::{FleetError, Result};
use crate::manifest::{AgentRecord, Credentials};
use crate::persona::Persona;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const REGISTER_TIMEOUT: Duration = Duration::from_secs(30);
const STATUS_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote returned status {0}")]
    Status(u16),

    #[error("response is missing {0}")]
    Missing(&'static str),

    #[error("cannot build request URL from {0}")]
    Url(String),
}

#[derive(Debug, Error)]
#[error("registration of agent {index} failed: {cause}")]
pub struct RegistrationError {
    pub index: usize,
    #[source]
    pub cause: RemoteError,
}

// ---------------------------------------------------------------------------
// FleetService
// ---------------------------------------------------------------------------

/// The two remote calls the scheduler depends on.
#[async_trait]
pub trait FleetService: Send + Sync {
    /// Create one agent on the remote side and return its record for `index`.
    async fn register(&self, index: usize) -> std::result::Result<AgentRecord, RegistrationError>;

    /// Remaining actions the remote side currently allows for this agent.
    async fn actions_remaining(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<u32, RemoteError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    auto: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    lobster_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Registered {
    agent_id: Option<String>,
    api_key: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AgentStatus {
    fights_remaining: Option<i64>,
}

// ---------------------------------------------------------------------------
// HttpFleetService
// ---------------------------------------------------------------------------

pub struct HttpFleetService {
    http: reqwest::Client,
    base_url: Url,
    named_registration: bool,
}

impl HttpFleetService {
    pub fn new(config: &FleetConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url())
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| {
                FleetError::InvalidConfig(format!("api_url is not a base URL: {}", config.api_url))
            })?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("fleet/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            named_registration: config.named_registration,
        })
    }

    /// `base_url` with `segments` appended, each percent-encoded as a single
    /// path segment.
    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, RemoteError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::Url(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn try_register(&self, index: usize) -> std::result::Result<AgentRecord, RemoteError> {
        let persona = Persona::for_index(index);
        let body = if self.named_registration {
            RegisterRequest {
                auto: true,
                name: Some(&persona.name),
                lobster_type: Some(persona.lobster_type.to_uppercase()),
            }
        } else {
            RegisterRequest {
                auto: true,
                name: None,
                lobster_type: None,
            }
        };

        let resp = self
            .http
            .post(self.endpoint(&["agents", "register"])?)
            .json(&body)
            .timeout(REGISTER_TIMEOUT)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(RemoteError::Status(resp.status().as_u16()));
        }

        let envelope: Envelope<Registered> = resp.json().await?;
        let data = envelope.data.ok_or(RemoteError::Missing("data"))?;
        let agent_id = data
            .agent_id
            .filter(|s| !s.is_empty())
            .ok_or(RemoteError::Missing("agent_id"))?;
        let api_key = data
            .api_key
            .filter(|s| !s.is_empty())
            .ok_or(RemoteError::Missing("api_key"))?;
        let name = data.name.unwrap_or(persona.name);

        Ok(AgentRecord::new(
            index,
            Credentials::new(agent_id, api_key),
            name,
            Utc::now(),
        ))
    }
}

#[async_trait]
impl FleetService for HttpFleetService {
    async fn register(&self, index: usize) -> std::result::Result<AgentRecord, RegistrationError> {
        self.try_register(index)
            .await
            .map_err(|cause| RegistrationError { index, cause })
    }

    async fn actions_remaining(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<u32, RemoteError> {
        let resp = self
            .http
            .get(self.endpoint(&["agents", credentials.agent_id.as_str(), "status"])?)
            .bearer_auth(&credentials.credential)
            .timeout(STATUS_TIMEOUT)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(RemoteError::Status(resp.status().as_u16()));
        }

        let envelope: Envelope<AgentStatus> = resp.json().await?;
        let remaining = envelope
            .data
            .and_then(|d| d.fights_remaining)
            .unwrap_or(0)
            .clamp(0, i64::from(u32::MAX));
        Ok(remaining as u32)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
