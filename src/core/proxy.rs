use crate::core::{ProxyResponse, UpstreamClient};
use serde_json::Value;

pub const FETCH_FAILED: &str = "Failed to fetch user config";
pub const SAVE_FAILED: &str = "Failed to save user config";

/// Forwards user-config reads and writes to the upstream service and maps
/// its replies onto what the browser expects.
pub struct UserConfigProxy<U: UpstreamClient> {
    upstream: U,
}

impl<U: UpstreamClient> UserConfigProxy<U> {
    pub fn new(upstream: U) -> Self {
        Self { upstream }
    }

    pub async fn fetch(&self) -> ProxyResponse {
        let reply = match self.upstream.get_user_config().await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, category = ?e.category(), "Error fetching user config");
                return ProxyResponse::error(500, FETCH_FAILED);
            }
        };

        if !reply.is_success() {
            tracing::error!(status = reply.status, "Error fetching user config: upstream returned non-success status");
            return ProxyResponse::error(500, FETCH_FAILED);
        }

        match reply.body {
            Some(body) => ProxyResponse::ok(body),
            None => {
                tracing::error!(status = reply.status, "Error fetching user config: upstream body is not JSON");
                ProxyResponse::error(500, FETCH_FAILED)
            }
        }
    }

    pub async fn save(&self, body: Value) -> ProxyResponse {
        let reply = match self.upstream.save_user_config(&body).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, category = ?e.category(), "Error saving user config");
                return ProxyResponse::error(500, SAVE_FAILED);
            }
        };

        if !reply.is_success() {
            if reply.body.is_none() {
                tracing::error!(status = reply.status, "Error saving user config: upstream error body is not JSON");
                return ProxyResponse::error(500, SAVE_FAILED);
            }
            let message = reply.detail().cloned().unwrap_or_else(|| Value::from(SAVE_FAILED));
            tracing::warn!(status = reply.status, detail = %message, "Upstream rejected user config");
            return ProxyResponse::error(reply.status, message);
        }

        match reply.body {
            Some(body) => ProxyResponse::ok(body),
            None => {
                tracing::error!(status = reply.status, "Error saving user config: upstream body is not JSON");
                ProxyResponse::error(500, SAVE_FAILED)
            }
        }
    }

    /// The raw request body could not be parsed as JSON.
    pub fn reject_unparseable_body(&self, reason: &str) -> ProxyResponse {
        tracing::error!(reason, "Error saving user config: request body is not JSON");
        ProxyResponse::error(500, SAVE_FAILED)
    }
}
