// Adapters layer: concrete implementations of the domain ports (http upstream, firebase, storage).

pub mod firebase;
pub mod http;
pub mod session;
pub mod storage;

pub use firebase::FirebaseTokenVerifier;
pub use http::HttpUpstream;
pub use session::FirebaseSession;
pub use storage::{AppDataDir, FileConfigStore};
