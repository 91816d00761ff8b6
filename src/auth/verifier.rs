//! The verification authority seam.

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::claims::ClaimSet;

/// Why an access token was not accepted.
///
/// The `Display` text is the reason returned to the client, so variants must
/// never carry secrets or token material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("Jwt cannot be parsed: {0}")]
    Malformed(String),

    #[error("Jwt is expired")]
    Expired,

    #[error("Jwt is not yet valid")]
    NotYetValid,

    #[error("Jwt signature is invalid")]
    InvalidSignature,

    #[error("Jwt uses unsupported signing algorithm {0}, expected RS256")]
    UnsupportedAlgorithm(String),

    #[error("Jwt header does not contain a key id")]
    MissingKeyId,

    #[error("No signing key found for key id '{0}'")]
    UnknownKey(String),

    #[error("Jwt issuer does not match the expected issuer")]
    IssuerMismatch,

    #[error("Jwt is missing required claim '{0}'")]
    MissingClaim(String),

    #[error("claim '{claim}' value {actual} does not match expected value '{expected}'")]
    ClaimMismatch {
        claim: String,
        expected: String,
        actual: String,
    },

    #[error("Unable to reach the verification authority: {0}")]
    Transport(String),

    #[error("Token verification did not complete within {0} ms")]
    TimedOut(u64),

    #[error("{0}")]
    Rejected(String),
}

impl VerificationError {
    /// The authority could not give a verdict in time; the token itself was not judged.
    pub fn is_timeout(&self) -> bool {
        matches!(self, VerificationError::TimedOut(_))
    }
}

/// An external authority able to judge an access token.
///
/// Implementations hold no per-request state and are shared across every
/// in-flight request.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify `token`, returning its claims when accepted.
    async fn verify_access_token(&self, token: &str) -> Result<ClaimSet, VerificationError>;
}
