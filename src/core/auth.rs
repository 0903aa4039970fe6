//! Request admission rules for the user-config service.
//!
//! Everything here is transport-agnostic; the axum middleware in
//! [`crate::server::middleware`] feeds it method, path, header and body.

use crate::core::DecodedToken;
use serde_json::Value;

/// Paths reachable without a token. Matched as prefixes.
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &[
    "/api/v1/user-config",
    "/api/v1/ppt/presentation/all",
    "/api/v1/ppt/template-management/summary",
    "/api/v1/subscription-routes/plans",
    "/health",
    "/api/v1/subscription-routes/webhook",
    "/api/v1/subscription-routes/reconciliation",
];

/// The only model available without a paid plan.
pub const DEFAULT_FREE_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    NoToken,
    MalformedToken,
    InvalidTokenFormat,
    EmptyToken,
    InvalidToken,
    ModelNotAllowed { model: String },
}

impl AuthRejection {
    pub fn status(&self) -> u16 {
        match self {
            AuthRejection::ModelNotAllowed { .. } => 403,
            _ => 401,
        }
    }

    pub fn message(&self) -> String {
        match self {
            AuthRejection::NoToken => "Unauthorized - No token".to_string(),
            AuthRejection::MalformedToken => "Unauthorized - Malformed token".to_string(),
            AuthRejection::InvalidTokenFormat => "Unauthorized - Invalid token format".to_string(),
            AuthRejection::EmptyToken => "Unauthorized - Empty token".to_string(),
            AuthRejection::InvalidToken => "Invalid or expired token".to_string(),
            AuthRejection::ModelNotAllowed { model } => format!(
                "Model '{}' not supported. Please upgrade to use this model.",
                model
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthPolicy {
    excluded_paths: Vec<String>,
    free_model: String,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            excluded_paths: DEFAULT_EXCLUDED_PATHS.iter().map(|p| p.to_string()).collect(),
            free_model: DEFAULT_FREE_MODEL.to_string(),
        }
    }
}

impl AuthPolicy {
    pub fn new(excluded_paths: Vec<String>, free_model: impl Into<String>) -> Self {
        Self {
            excluded_paths,
            free_model: free_model.into(),
        }
    }

    pub fn excluded_paths(&self) -> &[String] {
        &self.excluded_paths
    }

    pub fn free_model(&self) -> &str {
        &self.free_model
    }

    /// Preflight requests and excluded paths skip authentication entirely.
    pub fn is_exempt(&self, method: &str, path: &str) -> bool {
        if method.eq_ignore_ascii_case("OPTIONS") {
            return true;
        }
        self.excluded_paths
            .iter()
            .any(|excluded| path.starts_with(excluded.as_str()))
    }

    /// Free-plan users may only request the free model. `body` is the
    /// parsed request body, or an empty object when there was none.
    pub fn check_model(&self, token: &DecodedToken, body: &Value) -> Result<(), AuthRejection> {
        if !token.is_free_plan() {
            return Ok(());
        }

        let model = requested_model(body).unwrap_or_else(|| self.free_model.clone());
        if model != self.free_model {
            return Err(AuthRejection::ModelNotAllowed { model });
        }
        Ok(())
    }
}

fn requested_model(body: &Value) -> Option<String> {
    match body.get("model_name")? {
        Value::String(name) => Some(name.clone()),
        other => Some(other.to_string()),
    }
}

/// Pull the bearer token out of an `Authorization` header value.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthRejection> {
    let header = match header {
        Some(h) if !h.is_empty() => h,
        _ => return Err(AuthRejection::NoToken),
    };

    if !header.starts_with("Bearer ") {
        return Err(AuthRejection::MalformedToken);
    }

    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 {
        return Err(AuthRejection::InvalidTokenFormat);
    }

    let token = parts[1].trim();
    if token.is_empty() {
        return Err(AuthRejection::EmptyToken);
    }

    Ok(token)
}
