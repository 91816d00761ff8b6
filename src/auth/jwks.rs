//! OIDC access token verification against a published key set.
//!
//! # Responsibilities
//! - Fetch and cache the authorization server's JWKS
//! - Check RS256 signatures, `iss`, `exp` and `nbf`
//! - Assert configured claims (`aud`, `cid`, ...)
//!
//! # Design Decisions
//! - Cached keys are read lock-free through `ArcSwap`
//! - Refetches are serialized and rate limited to one per `jwks_refresh_secs`,
//!   whether triggered by staleness or by an unknown `kid`
//! - A failed refetch keeps serving the keys already cached
//! - Transport failures never reveal the key set URL to callers
//! - Asserted claims match a string value or membership in a string array

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::jwk::{AlgorithmParameters, JwkSet};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use url::Url;

use crate::auth::claims::ClaimSet;
use crate::auth::verifier::{TokenVerifier, VerificationError};
use crate::config::VerifierConfig;

/// Error building a verifier from configuration.
#[derive(Debug, Error)]
pub enum VerifierSetupError {
    #[error("invalid verifier URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Default)]
struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.is_some_and(|at| at.elapsed() < ttl)
    }
}

/// Verifies access tokens issued by an OIDC authorization server.
pub struct JwksVerifier {
    issuer: String,
    client_id: Option<String>,
    assert_claims: BTreeMap<String, String>,
    jwks_uri: Url,
    leeway_secs: u64,
    cache_ttl: Duration,
    refresh_interval: Duration,
    http: reqwest::Client,
    cache: ArcSwap<KeyCache>,
    /// Time of the last fetch attempt, successful or not.
    last_fetch: Mutex<Option<Instant>>,
}

impl JwksVerifier {
    /// Build a verifier from configuration. No network traffic happens until
    /// the first token is verified.
    pub fn from_config(config: &VerifierConfig) -> Result<Self, VerifierSetupError> {
        let issuer = Url::parse(&config.issuer)?;
        let jwks_uri = match &config.jwks_uri {
            Some(uri) => Url::parse(uri)?,
            None => default_jwks_uri(&issuer)?,
        };

        let mut builder = reqwest::Client::builder();
        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }

        Ok(Self {
            issuer: config.issuer.clone(),
            client_id: config.client_id.clone(),
            assert_claims: config.assert_claims.clone(),
            jwks_uri,
            leeway_secs: config.leeway_secs,
            cache_ttl: Duration::from_secs(config.jwks_cache_secs),
            refresh_interval: Duration::from_secs(config.jwks_refresh_secs),
            http: builder.build()?,
            cache: ArcSwap::from_pointee(KeyCache::default()),
            last_fetch: Mutex::new(None),
        })
    }

    pub fn jwks_uri(&self) -> &Url {
        &self.jwks_uri
    }

    /// Number of signing keys currently cached.
    pub fn cached_keys(&self) -> usize {
        self.cache.load().keys.len()
    }

    async fn signing_key(&self, kid: &str) -> Result<DecodingKey, VerificationError> {
        let cache = self.cache.load();
        if cache.is_fresh(self.cache_ttl) {
            if let Some(key) = cache.keys.get(kid) {
                return Ok(key.clone());
            }
        }

        let mut last_fetch = self.last_fetch.lock().await;

        // Another request may have refreshed while this one waited.
        let cache = self.cache.load();
        let cached = cache.keys.get(kid).cloned();
        if cache.is_fresh(self.cache_ttl) {
            if let Some(key) = &cached {
                return Ok(key.clone());
            }
        }

        if last_fetch.is_some_and(|at| at.elapsed() < self.refresh_interval) {
            return match (cached, cache.fetched_at) {
                (Some(key), _) => Ok(key),
                (None, Some(_)) => Err(VerificationError::UnknownKey(kid.to_string())),
                (None, None) => Err(VerificationError::Transport(KEY_SET_UNAVAILABLE.to_string())),
            };
        }

        *last_fetch = Some(Instant::now());
        let keys = match self.fetch_keys().await {
            Ok(keys) => keys,
            Err(err) => {
                return match cached {
                    Some(key) => {
                        tracing::warn!(kid = %kid, "Key set refresh failed, serving cached key");
                        Ok(key)
                    }
                    None => Err(err),
                };
            }
        };
        tracing::debug!(jwks_uri = %self.jwks_uri, keys = keys.len(), "Key set refreshed");

        let key = keys.get(kid).cloned();
        self.cache.store(Arc::new(KeyCache {
            keys,
            fetched_at: Some(Instant::now()),
        }));

        key.ok_or_else(|| VerificationError::UnknownKey(kid.to_string()))
    }

    async fn fetch_keys(&self) -> Result<HashMap<String, DecodingKey>, VerificationError> {
        let set: JwkSet = self
            .http
            .get(self.jwks_uri.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(transport_error)?
            .json()
            .await
            .map_err(transport_error)?;

        let mut keys = HashMap::new();
        for jwk in &set.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                continue;
            };
            if !matches!(jwk.algorithm, AlgorithmParameters::RSA(_)) {
                continue;
            }
            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => tracing::warn!(kid = %kid, error = %e, "Skipping unusable key"),
            }
        }
        Ok(keys)
    }

    fn check_asserted_claims(&self, claims: &ClaimSet) -> Result<(), VerificationError> {
        if let Some(client_id) = &self.client_id {
            expect_claim(claims, "cid", client_id)?;
        }
        for (name, expected) in &self.assert_claims {
            expect_claim(claims, name, expected)?;
        }
        Ok(())
    }
}

#[async_trait]
impl TokenVerifier for JwksVerifier {
    async fn verify_access_token(&self, token: &str) -> Result<ClaimSet, VerificationError> {
        let header =
            decode_header(token).map_err(|e| VerificationError::Malformed(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(VerificationError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }
        let kid = header.kid.ok_or(VerificationError::MissingKeyId)?;
        let key = self.signing_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = self.leeway_secs;
        validation.validate_nbf = true;
        // Audience is one of the asserted claims, checked below.
        validation.validate_aud = false;

        let data = decode::<ClaimSet>(token, &key, &validation).map_err(decode_error)?;
        self.check_asserted_claims(&data.claims)?;
        Ok(data.claims)
    }
}

fn default_jwks_uri(issuer: &Url) -> Result<Url, url::ParseError> {
    let base = issuer.as_str().trim_end_matches('/');
    Url::parse(&format!("{base}/v1/keys"))
}

/// Reason returned while no key set has ever been fetched.
const KEY_SET_UNAVAILABLE: &str = "key set unavailable";

fn transport_error(e: reqwest::Error) -> VerificationError {
    tracing::warn!(error = %e, "Key set fetch failed");
    VerificationError::Transport(e.without_url().to_string())
}

fn decode_error(e: jsonwebtoken::errors::Error) -> VerificationError {
    match e.kind() {
        ErrorKind::ExpiredSignature => VerificationError::Expired,
        ErrorKind::ImmatureSignature => VerificationError::NotYetValid,
        ErrorKind::InvalidSignature => VerificationError::InvalidSignature,
        ErrorKind::InvalidIssuer => VerificationError::IssuerMismatch,
        ErrorKind::InvalidAlgorithm => VerificationError::UnsupportedAlgorithm("mismatch".to_string()),
        ErrorKind::MissingRequiredClaim(claim) => VerificationError::MissingClaim(claim.clone()),
        _ => VerificationError::Malformed(e.to_string()),
    }
}

fn expect_claim(claims: &ClaimSet, name: &str, expected: &str) -> Result<(), VerificationError> {
    match claims.get(name) {
        None => Err(VerificationError::MissingClaim(name.to_string())),
        Some(Value::String(actual)) if actual == expected => Ok(()),
        Some(Value::Array(items)) if items.iter().any(|v| v.as_str() == Some(expected)) => Ok(()),
        Some(actual) => Err(VerificationError::ClaimMismatch {
            claim: name.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }),
    }
}
