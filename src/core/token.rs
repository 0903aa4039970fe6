use crate::core::IdTokenSource;

/// Hands out the signed-in user's ID token. Callers only care whether they
/// have a token, so source failures are logged and reported as `None`.
pub struct IdTokenAccessor<S: IdTokenSource> {
    source: S,
}

impl<S: IdTokenSource> IdTokenAccessor<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub async fn get_id_token(&self) -> Option<String> {
        match self.source.current_user_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, category = ?e.category(), "Error getting ID token");
                None
            }
        }
    }
}
