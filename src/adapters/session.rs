use crate::core::IdTokenSource;
use crate::utils::error::{GatewayError, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

pub const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com";

/// Tokens this close to expiry are refreshed instead of handed out.
const EXPIRY_MARGIN_SECS: i64 = 300;

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[derive(Debug, Clone)]
struct CachedToken {
    id_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - ChronoDuration::seconds(EXPIRY_MARGIN_SECS) > now
    }
}

#[derive(Debug, Default)]
struct SessionState {
    refresh_token: Option<String>,
    user_id: Option<String>,
    cached: Option<CachedToken>,
}

/// A signed-in Firebase user, backed by the Secure Token REST API.
pub struct FirebaseSession {
    client: Client,
    api_key: String,
    token_url: Url,
    state: Mutex<SessionState>,
}

impl FirebaseSession {
    pub fn new(api_key: impl Into<String>, base_url: &str, timeout: Duration) -> Result<Self> {
        let token_url = format!("{}/v1/token", base_url.trim_end_matches('/'));
        let token_url = Url::parse(&token_url).map_err(|e| GatewayError::InvalidConfigValueError {
            field: "firebase.secure_token_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            token_url,
            state: Mutex::new(SessionState::default()),
        })
    }

    pub async fn sign_in(&self, refresh_token: impl Into<String>) {
        let mut state = self.state.lock().await;
        *state = SessionState {
            refresh_token: Some(refresh_token.into()),
            ..SessionState::default()
        };
    }

    pub async fn sign_out(&self) {
        *self.state.lock().await = SessionState::default();
    }

    pub async fn is_signed_in(&self) -> bool {
        self.state.lock().await.refresh_token.is_some()
    }

    pub async fn user_id(&self) -> Option<String> {
        self.state.lock().await.user_id.clone()
    }

    async fn exchange(&self, refresh_token: &str) -> Result<RefreshResponse> {
        let mut url = self.token_url.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let response = self
            .client
            .post(url)
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => format!("secure token endpoint returned {}", status),
            };
            return Err(GatewayError::VerificationError { message });
        }

        Ok(response.json::<RefreshResponse>().await?)
    }
}

#[async_trait::async_trait]
impl IdTokenSource for FirebaseSession {
    async fn current_user_token(&self) -> Result<Option<String>> {
        let mut state = self.state.lock().await;
        let Some(refresh_token) = state.refresh_token.clone() else {
            return Ok(None);
        };

        let now = Utc::now();
        if let Some(cached) = state.cached.as_ref().filter(|c| c.is_usable(now)) {
            return Ok(Some(cached.id_token.clone()));
        }

        tracing::debug!("Refreshing Firebase ID token");
        let refreshed = self.exchange(&refresh_token).await?;
        let lifetime: i64 = refreshed.expires_in.parse().map_err(|_| GatewayError::VerificationError {
            message: format!("invalid expires_in: {}", refreshed.expires_in),
        })?;

        state.refresh_token = Some(refreshed.refresh_token);
        if refreshed.user_id.is_some() {
            state.user_id = refreshed.user_id;
        }
        state.cached = Some(CachedToken {
            id_token: refreshed.id_token.clone(),
            expires_at: now + ChronoDuration::seconds(lifetime),
        });

        Ok(Some(refreshed.id_token))
    }
}
