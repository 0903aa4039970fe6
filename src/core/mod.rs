pub mod auth;
pub mod proxy;
pub mod token;

pub use crate::domain::model::{DecodedToken, ProxyResponse, UpstreamReply, UserConfig};
pub use crate::domain::ports::{ConfigStore, IdTokenSource, TokenVerifier, UpstreamClient};
pub use crate::utils::error::Result;
