use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::AppConfig;
use crate::models::{
    lenient, Challenge, ChallengeStatus, EscrowOverviewPayload, JoinRequest, JoinResponse,
};

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status. `message` is the reason
    /// it gave, shown to the user as-is.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

impl PlatformError {
    pub fn status(&self) -> Option<u16> {
        match self {
            PlatformError::Rejected { status, .. } => Some(*status),
            PlatformError::Http(e) => e.status().map(|s| s.as_u16()),
            PlatformError::Unexpected(_) => None,
        }
    }

    /// Transport failures and 5xx are worth another attempt. 4xx never is:
    /// retrying an authorization failure only hides it.
    pub fn is_retryable(&self) -> bool {
        match self {
            PlatformError::Http(e) => e.is_timeout() || e.is_connect(),
            PlatformError::Rejected { status, .. } => *status >= 500,
            PlatformError::Unexpected(_) => false,
        }
    }
}

/// The mutating call the join flow depends on. Kept behind a trait so the
/// dispatcher can be driven without a live backend.
pub trait ChallengeApi: Send + Sync {
    fn join_challenge(
        &self,
        challenge_id: i64,
        request: &JoinRequest,
    ) -> impl Future<Output = Result<JoinResponse, PlatformError>> + Send;
}

/// HTTP client for the wager platform backend.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl PlatformClient {
    pub fn new(http: Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::new(
            http,
            config.platform_api_url.clone(),
            config.platform_api_token.clone(),
        ))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let req = self.http.request(method, &url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Aggregate escrow stats plus every challenge holding funds (admin).
    pub async fn get_escrow_overview(&self) -> Result<EscrowOverviewPayload, PlatformError> {
        let resp = self.request(Method::GET, "/admin/escrow").send().await?;
        let payload: EscrowOverviewPayload = check_status(resp).await?.json().await?;
        Ok(payload)
    }

    /// Fetch the challenge listing. Entries that are not objects are dropped
    /// rather than failing the whole list.
    pub async fn get_challenges(&self) -> Result<Vec<Challenge>, PlatformError> {
        let resp = self.request(Method::GET, "/challenges").send().await?;
        let body: Value = check_status(resp).await?.json().await?;
        parse_challenge_list(body)
    }

    /// Available balance of the authenticated user, in base units.
    pub async fn get_wallet_balance(&self) -> Result<i64, PlatformError> {
        let resp = self.request(Method::GET, "/wallet/balance").send().await?;
        let body: Value = check_status(resp).await?.json().await?;

        let balance = body
            .get("balance")
            .or_else(|| body.get("available"))
            .ok_or_else(|| PlatformError::Unexpected("balance missing from response".into()))?;
        Ok(lenient::int_from_value(balance))
    }

    pub async fn join_challenge(
        &self,
        challenge_id: i64,
        request: &JoinRequest,
    ) -> Result<JoinResponse, PlatformError> {
        let path = format!("/challenges/{challenge_id}/join");
        let resp = self
            .request(Method::POST, &path)
            .json(request)
            .send()
            .await?;
        let body: JoinResponse = check_status(resp).await?.json().await?;

        tracing::info!(
            challenge_id,
            side = %request.stake,
            amount = request.amount,
            matched = body.matched,
            queue_position = ?body.queue_position,
            "Join request accepted by platform"
        );
        Ok(body)
    }

    pub async fn accept_challenge(&self, challenge_id: i64) -> Result<(), PlatformError> {
        let path = format!("/challenges/{challenge_id}/accept");
        let resp = self.request(Method::POST, &path).send().await?;
        check_status(resp).await?;
        tracing::info!(challenge_id, "Challenge accepted");
        Ok(())
    }

    pub async fn update_challenge_status(
        &self,
        challenge_id: i64,
        status: ChallengeStatus,
    ) -> Result<(), PlatformError> {
        let path = format!("/challenges/{challenge_id}/status");
        let resp = self
            .request(Method::PATCH, &path)
            .json(&json!({ "status": status }))
            .send()
            .await?;
        check_status(resp).await?;
        tracing::info!(challenge_id, status = %status, "Challenge status updated");
        Ok(())
    }

    pub async fn cancel_challenge(&self, challenge_id: i64) -> Result<(), PlatformError> {
        self.update_challenge_status(challenge_id, ChallengeStatus::Cancelled)
            .await
    }
}

impl ChallengeApi for PlatformClient {
    async fn join_challenge(
        &self,
        challenge_id: i64,
        request: &JoinRequest,
    ) -> Result<JoinResponse, PlatformError> {
        PlatformClient::join_challenge(self, challenge_id, request).await
    }
}

/// Turn a non-2xx response into `Rejected`, lifting the backend's own reason
/// out of `error` / `message` when the body carries one.
async fn check_status(resp: Response) -> Result<Response, PlatformError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            format!(
                "{} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("error")
            )
        });

    Err(PlatformError::Rejected {
        status: status.as_u16(),
        message,
    })
}

/// Accepts a bare array or an object wrapping one under `challenges`/`data`.
fn parse_challenge_list(body: Value) -> Result<Vec<Challenge>, PlatformError> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map
            .remove("challenges")
            .or_else(|| map.remove("data"))
        {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(PlatformError::Unexpected(
                    "challenge list missing from response".into(),
                ))
            }
        },
        _ => {
            return Err(PlatformError::Unexpected(
                "challenge list is not an array".into(),
            ))
        }
    };

    Ok(lenient::entries_from_value(Value::Array(items)))
}
