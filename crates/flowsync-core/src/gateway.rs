//! Remote gateway: fetch and push flow documents over HTTP.
//!
//! The bot platform serves one flow per bot:
//!
//! - `GET {base_url}/{bot_id}` → `{"data": {"name", "gmt_modified", "flow_settings"}}`
//! - `POST {base_url}/{bot_id}/setting` with the flow settings as the JSON body
//!   and an `X-Basis-Modified` header declaring the version the edit started
//!   from, so the server can answer 409 when it holds something newer
//!
//! `gmt_modified` is server-assigned (`YYYY-MM-DD HH:MM:SS`, UTC) and is the
//! only timestamp the sync engine ever compares against.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use flowsync_types::models::{format_gmt_modified, parse_gmt_modified};

use crate::error::{SyncError, SyncResult};

/// A flow as the remote service currently holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFlow {
    /// Bot display name as the server knows it.
    pub name: String,
    /// Server-assigned modification timestamp.
    pub modified_at: DateTime<Utc>,
    /// The flow settings document.
    pub settings: serde_json::Value,
}

/// Remote side of the sync, as consumed by the Puller and Pusher.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    /// Fetch the current flow for a bot.
    async fn fetch(&self, bot_id: &str) -> SyncResult<RemoteFlow>;

    /// Push flow settings for a bot, declaring the basis version the local
    /// edit started from. The server compares the basis against its own
    /// state and answers with a conflict when it holds something newer.
    async fn push(
        &self,
        bot_id: &str,
        settings: &serde_json::Value,
        basis_modified_at: DateTime<Utc>,
    ) -> SyncResult<()>;
}

#[derive(Deserialize)]
struct FetchResponse {
    data: Option<FetchPayload>,
}

#[derive(Deserialize)]
struct FetchPayload {
    name: String,
    gmt_modified: String,
    flow_settings: serde_json::Value,
}

/// HTTP implementation of [`RemoteGateway`] with bearer authentication.
pub struct HttpGateway {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpGateway {
    /// Build a gateway. Every request carries `timeout`.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

#[async_trait]
impl RemoteGateway for HttpGateway {
    async fn fetch(&self, bot_id: &str) -> SyncResult<RemoteFlow> {
        let url = format!("{}/{}", self.base_url, bot_id);
        let resp = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => {
                return Err(SyncError::NotFound { entity_id: bot_id.to_string() });
            }
            // 429 falls through to error_for_status below: transient.
            StatusCode::TOO_MANY_REQUESTS => {}
            status if status.is_client_error() => {
                let message = resp.text().await.unwrap_or_default();
                return Err(SyncError::Rejected {
                    entity_id: bot_id.to_string(),
                    status: status.as_u16(),
                    message,
                });
            }
            _ => {}
        }
        // 429 and 5xx surface as transient network errors.
        let resp = resp.error_for_status()?;

        let body: FetchResponse = resp.json().await?;
        let Some(payload) = body.data else {
            return Err(SyncError::EmptyPayload { entity_id: bot_id.to_string() });
        };
        if payload.flow_settings.is_null() {
            return Err(SyncError::EmptyPayload { entity_id: bot_id.to_string() });
        }

        let modified_at = parse_gmt_modified(&payload.gmt_modified).map_err(|e| SyncError::Parse {
            entity_id: bot_id.to_string(),
            message: format!("bad gmt_modified {:?}: {}", payload.gmt_modified, e),
        })?;

        Ok(RemoteFlow {
            name: payload.name,
            modified_at,
            settings: payload.flow_settings,
        })
    }

    async fn push(
        &self,
        bot_id: &str,
        settings: &serde_json::Value,
        basis_modified_at: DateTime<Utc>,
    ) -> SyncResult<()> {
        let url = format!("{}/{}/setting", self.base_url, bot_id);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .header("X-Basis-Modified", format_gmt_modified(basis_modified_at))
            .json(settings)
            .send()
            .await?;

        match resp.status() {
            StatusCode::CONFLICT => {
                return Err(SyncError::Conflict { entity_id: bot_id.to_string() });
            }
            StatusCode::NOT_FOUND => {
                return Err(SyncError::NotFound { entity_id: bot_id.to_string() });
            }
            // 429 falls through to error_for_status below: transient.
            StatusCode::TOO_MANY_REQUESTS => {}
            status if status.is_client_error() => {
                let message = resp.text().await.unwrap_or_default();
                return Err(SyncError::Rejected {
                    entity_id: bot_id.to_string(),
                    status: status.as_u16(),
                    message,
                });
            }
            _ => {}
        }
        // 429 and 5xx surface as transient network errors.
        resp.error_for_status()?;
        Ok(())
    }
}
