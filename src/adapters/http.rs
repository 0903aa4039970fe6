use crate::core::{UpstreamClient, UpstreamReply};
use crate::utils::error::{GatewayError, Result};
use reqwest::{header, Client, Response};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub const DEFAULT_UPSTREAM_URL: &str = "http://localhost:8000";
pub const USER_CONFIG_PATH: &str = "/api/v1/user-config";

/// Talks to the user-config service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    endpoint: Url,
}

impl HttpUpstream {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), USER_CONFIG_PATH);
        let endpoint = Url::parse(&endpoint).map_err(|e| GatewayError::InvalidConfigValueError {
            field: "upstream.base_url".to_string(),
            value: base_url.to_string(),
            reason: format!("Invalid URL format: {}", e),
        })?;

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn read_reply(response: Response) -> Result<UpstreamReply> {
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice::<Value>(&bytes).ok();
        if body.is_none() && !bytes.is_empty() {
            tracing::debug!(status, len = bytes.len(), "Upstream body is not JSON");
        }
        Ok(UpstreamReply { status, body })
    }
}

#[async_trait::async_trait]
impl UpstreamClient for HttpUpstream {
    async fn get_user_config(&self) -> Result<UpstreamReply> {
        tracing::debug!("GET {}", self.endpoint);
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        Self::read_reply(response).await
    }

    async fn save_user_config(&self, body: &Value) -> Result<UpstreamReply> {
        tracing::debug!("POST {}", self.endpoint);
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(body)
            .send()
            .await?;
        Self::read_reply(response).await
    }
}
