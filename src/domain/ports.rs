use crate::domain::model::{DecodedToken, UpstreamReply, UserConfig};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// The backend that owns user configuration. `Err` means the request never
/// produced an HTTP reply.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn get_user_config(&self) -> Result<UpstreamReply>;
    async fn save_user_config(&self, body: &Value) -> Result<UpstreamReply>;
}

/// Where the current user's ID token comes from. `Ok(None)` means nobody is
/// signed in.
#[async_trait]
pub trait IdTokenSource: Send + Sync {
    async fn current_user_token(&self) -> Result<Option<String>>;
}

/// Lets a session be shared between the accessor and the code that signs
/// users in and out.
#[async_trait]
impl<T: IdTokenSource + ?Sized> IdTokenSource for std::sync::Arc<T> {
    async fn current_user_token(&self) -> Result<Option<String>> {
        (**self).current_user_token().await
    }
}

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<DecodedToken>;
}

pub trait ConfigStore: Send + Sync {
    fn load(&self) -> impl std::future::Future<Output = Result<UserConfig>> + Send;
    fn save(&self, config: &UserConfig) -> impl std::future::Future<Output = Result<()>> + Send;
}
