//! HTTP surface: the browser-facing gateway and the user-config service.

pub mod gateway;
pub mod middleware;
pub mod service;

use crate::core::ProxyResponse;
use crate::utils::error::Result;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;

pub use gateway::gateway_router;
pub use middleware::{AuthState, AuthenticatedUser};
pub use service::service_router;

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

pub(crate) fn json_error(status: StatusCode, key: &str, message: impl Into<String>) -> Response {
    let mut body = serde_json::Map::new();
    body.insert(key.to_string(), Value::String(message.into()));
    (status, Json(Value::Object(body))).into_response()
}

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
