//! Firebase authentication middleware and extractor for Axum.

use super::json_error;
use crate::core::auth::{extract_bearer, AuthPolicy, AuthRejection};
use crate::core::{DecodedToken, TokenVerifier};
use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Largest JSON body the middleware will buffer to inspect `model_name`.
pub const MAX_INSPECTED_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AuthState {
    verifier: Arc<dyn TokenVerifier>,
    policy: Arc<AuthPolicy>,
}

impl AuthState {
    pub fn new(verifier: Arc<dyn TokenVerifier>, policy: AuthPolicy) -> Self {
        Self {
            verifier,
            policy: Arc::new(policy),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status()).unwrap_or(StatusCode::UNAUTHORIZED);
        json_error(status, "error", self.message())
    }
}

/// Verifies the bearer token on every request that is not exempt, and
/// attaches the decoded token for [`AuthenticatedUser`].
pub async fn firebase_auth(State(auth): State<AuthState>, request: Request, next: Next) -> Response {
    if auth
        .policy
        .is_exempt(request.method().as_str(), request.uri().path())
    {
        return next.run(request).await;
    }

    let token = match request.headers().get(header::AUTHORIZATION) {
        None => extract_bearer(None).map(str::to_string),
        Some(value) => match value.to_str() {
            Ok(value) => extract_bearer(Some(value)).map(str::to_string),
            Err(_) => Err(AuthRejection::MalformedToken),
        },
    };
    let token = match token {
        Ok(token) => token,
        Err(rejection) => {
            if rejection == AuthRejection::NoToken {
                tracing::warn!(path = %request.uri().path(), "No Authorization header found");
            }
            return rejection.into_response();
        }
    };

    let started = Instant::now();
    let decoded = match auth.verifier.verify(&token).await {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!(error = %e, "Token verification failed");
            return AuthRejection::InvalidToken.into_response();
        }
    };
    tracing::info!(
        uid = %decoded.uid,
        elapsed = ?started.elapsed(),
        "Time taken to verify token"
    );

    let (request, body) = match inspect_json_body(request).await {
        Ok(inspected) => inspected,
        Err(response) => return response,
    };

    if let Err(rejection) = auth.policy.check_model(&decoded, &body) {
        tracing::info!(uid = %decoded.uid, plan = ?decoded.plan, "Model not available on plan");
        return rejection.into_response();
    }

    let mut request = request;
    request.extensions_mut().insert(decoded);
    next.run(request).await
}

/// Buffers an `application/json` body so it can be read here and still be
/// handed on. Anything that does not parse to an object reads as `{}`.
async fn inspect_json_body(request: Request) -> Result<(Request, Value), Response> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == "application/json")
        .unwrap_or(false);
    if !is_json {
        return Ok((request, json!({})));
    }

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_INSPECTED_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer request body");
            return Err(json_error(
                StatusCode::PAYLOAD_TOO_LARGE,
                "error",
                "Request body too large",
            ));
        }
    };

    let parsed = serde_json::from_slice::<Value>(&bytes)
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| json!({}));

    Ok((Request::from_parts(parts, Body::from(bytes)), parsed))
}

/// Extractor for the verified Firebase user.
pub struct AuthenticatedUser(pub DecodedToken);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<DecodedToken>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or(AuthRejection::NoToken)
    }
}
