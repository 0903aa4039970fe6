use crate::core::proxy::UserConfigProxy;
use crate::core::UpstreamClient;
use axum::{body::Bytes, extract::State, response::Response, response::IntoResponse, routing::get, Router};
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub const USER_CONFIG_ROUTE: &str = "/api/user-config";

pub fn gateway_router<U: UpstreamClient + 'static>(proxy: UserConfigProxy<U>) -> Router {
    Router::new()
        .route(
            USER_CONFIG_ROUTE,
            get(get_user_config::<U>).post(post_user_config::<U>),
        )
        .route("/health", get(super::health))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(proxy))
}

async fn get_user_config<U: UpstreamClient>(
    State(proxy): State<Arc<UserConfigProxy<U>>>,
) -> Response {
    proxy.fetch().await.into_response()
}

async fn post_user_config<U: UpstreamClient>(
    State(proxy): State<Arc<UserConfigProxy<U>>>,
    body: Bytes,
) -> Response {
    match serde_json::from_slice::<Value>(&body) {
        Ok(body) => proxy.save(body).await.into_response(),
        Err(e) => proxy.reject_unparseable_body(&e.to_string()).into_response(),
    }
}
