//! Firebase ID token verification.
//!
//! Tokens are RS256 JWTs signed with one of Google's rotating `securetoken`
//! keys. The key set is fetched as JWKs and cached. An unknown `kid` forces
//! a refetch so rotations are picked up without waiting for the TTL, but at
//! most once per refetch interval.

use crate::core::{DecodedToken, TokenVerifier};
use crate::domain::model::UNKNOWN_EMAIL;
use crate::utils::error::{GatewayError, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
pub const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";
pub const DEFAULT_KEY_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_REFETCH_INTERVAL: Duration = Duration::from_secs(60);

enum KeySource {
    Remote { client: Client, url: String },
    Static,
}

#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.map(|t| t.elapsed() < ttl).unwrap_or(false)
    }

    /// Fresh, and fetched recently enough that a miss is answered from here.
    fn is_authoritative(&self, ttl: Duration, refetch_interval: Duration) -> bool {
        self.is_fresh(ttl) && self.fetched_at.map(|t| t.elapsed() < refetch_interval).unwrap_or(false)
    }
}

pub struct FirebaseTokenVerifier {
    project_id: String,
    source: KeySource,
    cache: RwLock<KeyCache>,
    key_ttl: Duration,
    refetch_interval: Duration,
}

impl FirebaseTokenVerifier {
    pub fn new(project_id: impl Into<String>, jwks_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            project_id: project_id.into(),
            source: KeySource::Remote {
                client,
                url: jwks_url.into(),
            },
            cache: RwLock::new(KeyCache::default()),
            key_ttl: DEFAULT_KEY_TTL,
            refetch_interval: DEFAULT_REFETCH_INTERVAL,
        })
    }

    /// A verifier that never goes to the network. Used for tests and for
    /// deployments that pin signing keys.
    pub fn with_static_keys(project_id: impl Into<String>, keys: HashMap<String, DecodingKey>) -> Self {
        Self {
            project_id: project_id.into(),
            source: KeySource::Static,
            cache: RwLock::new(KeyCache {
                keys,
                fetched_at: Some(Instant::now()),
            }),
            key_ttl: Duration::MAX,
            refetch_interval: Duration::MAX,
        }
    }

    pub fn with_key_ttl(mut self, ttl: Duration) -> Self {
        self.key_ttl = ttl;
        self
    }

    /// Minimum time between refetches triggered by an unknown `kid`.
    pub fn with_refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = interval;
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn issuer(&self) -> String {
        format!("{}{}", FIREBASE_ISSUER_PREFIX, self.project_id)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
        validation
    }

    async fn key_for(&self, kid: &str) -> Result<DecodingKey> {
        {
            let cache = self.cache.read().await;
            if let Some(key) = self.cached_key(&cache, kid)? {
                return Ok(key);
            }
        }

        let (client, url) = match &self.source {
            KeySource::Remote { client, url } => (client, url),
            KeySource::Static => return Err(unknown_key(kid)),
        };

        // Held across the fetch so concurrent misses share one request.
        let mut cache = self.cache.write().await;
        if let Some(key) = self.cached_key(&cache, kid)? {
            return Ok(key);
        }

        cache.keys = fetch_keys(client, url).await?;
        cache.fetched_at = Some(Instant::now());
        tracing::debug!(count = cache.keys.len(), "Refreshed Firebase signing keys");

        cache.keys.get(kid).cloned().ok_or_else(|| unknown_key(kid))
    }

    /// `Ok(None)` when the cache cannot answer and a fetch is allowed.
    fn cached_key(&self, cache: &KeyCache, kid: &str) -> Result<Option<DecodingKey>> {
        if !cache.is_fresh(self.key_ttl) {
            return Ok(None);
        }
        match cache.keys.get(kid) {
            Some(key) => Ok(Some(key.clone())),
            None if cache.is_authoritative(self.key_ttl, self.refetch_interval) => {
                tracing::debug!(kid = %kid, "Unknown kid inside refetch interval");
                Err(unknown_key(kid))
            }
            None => Ok(None),
        }
    }
}

fn unknown_key(kid: &str) -> GatewayError {
    GatewayError::UnknownSigningKey {
        kid: kid.to_string(),
    }
}

async fn fetch_keys(client: &Client, url: &str) -> Result<HashMap<String, DecodingKey>> {
    let set: JwkSet = client.get(url).send().await?.error_for_status()?.json().await?;

    let mut keys = HashMap::new();
    for jwk in &set.keys {
        let Some(kid) = jwk.common.key_id.clone() else {
            continue;
        };
        match DecodingKey::from_jwk(jwk) {
            Ok(key) => {
                keys.insert(kid, key);
            }
            Err(e) => tracing::warn!(kid = %kid, error = %e, "Skipping unusable signing key"),
        }
    }
    Ok(keys)
}

#[async_trait::async_trait]
impl TokenVerifier for FirebaseTokenVerifier {
    async fn verify(&self, token: &str) -> Result<DecodedToken> {
        let header = decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(GatewayError::VerificationError {
                message: format!("unexpected algorithm {:?}", header.alg),
            });
        }
        let kid = header.kid.ok_or_else(|| GatewayError::VerificationError {
            message: "token has no kid header".to_string(),
        })?;

        let key = self.key_for(&kid).await?;
        let data = decode::<Map<String, Value>>(token, &key, &self.validation())?;
        decoded_token_from_claims(data.claims)
    }
}

fn decoded_token_from_claims(claims: Map<String, Value>) -> Result<DecodedToken> {
    let uid = claims
        .get("sub")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GatewayError::VerificationError {
            message: "token has an empty subject".to_string(),
        })?
        .to_string();

    let exp = claims
        .get("exp")
        .and_then(Value::as_i64)
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .ok_or_else(|| GatewayError::VerificationError {
            message: "token has an invalid expiry".to_string(),
        })?;

    let email = claims
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or(UNKNOWN_EMAIL)
        .to_string();
    let plan = claims.get("plan").and_then(Value::as_str).map(str::to_string);

    Ok(DecodedToken {
        uid,
        email,
        plan,
        expires_at: exp,
        claims,
    })
}
