pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{GatewayArgs, ServiceArgs};

pub use adapters::{AppDataDir, FileConfigStore, FirebaseSession, FirebaseTokenVerifier, HttpUpstream};
pub use crate::core::{auth::AuthPolicy, proxy::UserConfigProxy, token::IdTokenAccessor};
pub use server::{gateway_router, service_router, AuthState};
pub use utils::error::{GatewayError, Result};
