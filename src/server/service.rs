use super::{json_error, middleware::firebase_auth, AuthState, AuthenticatedUser};
use crate::core::{ConfigStore, UserConfig};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

pub const USER_CONFIG_ROUTE: &str = "/api/v1/user-config";
pub const ME_ROUTE: &str = "/api/v1/me";

struct ServiceState<S> {
    store: S,
    /// Held from save until the saved config has been read back.
    writes: Mutex<()>,
}

/// The user-config backend, with Firebase auth in front of every route.
pub fn service_router<S: ConfigStore + 'static>(store: S, auth: AuthState) -> Router {
    Router::new()
        .route(USER_CONFIG_ROUTE, get(get_config::<S>).post(save_config::<S>))
        .route(ME_ROUTE, get(me))
        .route("/health", get(super::health))
        .layer(axum::middleware::from_fn_with_state(auth, firebase_auth))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(ServiceState {
            store,
            writes: Mutex::new(()),
        }))
}

fn internal_error(e: crate::utils::error::GatewayError) -> Response {
    tracing::error!(error = %e, category = ?e.category(), "User config store failed");
    json_error(StatusCode::INTERNAL_SERVER_ERROR, "detail", e.to_string())
}

async fn get_config<S: ConfigStore>(State(state): State<Arc<ServiceState<S>>>) -> Response {
    load_response(&state.store).await
}

async fn load_response<S: ConfigStore>(store: &S) -> Response {
    match store.load().await {
        Ok(config) => Json(config).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn save_config<S: ConfigStore>(State(state): State<Arc<ServiceState<S>>>, body: Bytes) -> Response {
    let config = match serde_json::from_slice::<Value>(&body)
        .map_err(|e| format!("Invalid JSON body: {}", e))
        .and_then(|v| UserConfig::try_from(v).map_err(|e| e.to_string()))
    {
        Ok(config) => config,
        Err(message) => {
            tracing::warn!(%message, "Rejected user config");
            return json_error(StatusCode::UNPROCESSABLE_ENTITY, "detail", message);
        }
    };

    let _writing = state.writes.lock().await;
    if let Err(e) = state.store.save(&config).await {
        return internal_error(e);
    }
    tracing::info!(keys = config.0.len(), "User config saved");

    load_response(&state.store).await
}

async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<Value> {
    Json(json!({
        "uid": user.uid,
        "email": user.email,
        "plan": user.plan,
    }))
}
