//! Authentication gate.
//! Allows a request through only when the verification authority accepts its bearer token.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{extract_bearer, ClaimSet, TokenVerifier, VerificationError};
use crate::http::error::FinalResponse;
use crate::observability::metrics;

/// Why the gate refused a request.
#[derive(Debug)]
pub enum GateRejection {
    /// No usable `Bearer` credential. The authority was not consulted.
    MissingCredential,
    /// The authority refused the token or did not answer in time.
    Rejected(VerificationError),
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        let mut response = match self {
            GateRejection::MissingCredential => StatusCode::UNAUTHORIZED.into_response(),
            GateRejection::Rejected(err) if err.is_timeout() => {
                (StatusCode::SERVICE_UNAVAILABLE, err.to_string()).into_response()
            }
            GateRejection::Rejected(err) => (StatusCode::UNAUTHORIZED, err.to_string()).into_response(),
        };
        // The reason text is the whole body; the error responder must not wrap it.
        response.extensions_mut().insert(FinalResponse);
        response
    }
}

/// Per-route gate around a shared verifier. Holds no request state.
#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<dyn TokenVerifier>,
    timeout: Option<Duration>,
}

impl AuthGate {
    pub fn new(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            verifier,
            timeout: None,
        }
    }

    /// Bound each verification call. `None` waits as long as the verifier does.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Decide on a request from its headers alone.
    pub async fn check(&self, headers: &HeaderMap) -> Result<ClaimSet, GateRejection> {
        let Some(token) = extract_bearer(headers) else {
            tracing::debug!("Missing or malformed bearer credential");
            metrics::record_gate_decision("missing_credential");
            return Err(GateRejection::MissingCredential);
        };

        let started = Instant::now();
        let verdict = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.verifier.verify_access_token(token))
                .await
                .unwrap_or_else(|_| Err(VerificationError::TimedOut(limit.as_millis() as u64))),
            None => self.verifier.verify_access_token(token).await,
        };
        metrics::record_verification(started.elapsed());

        match verdict {
            Ok(claims) => {
                tracing::debug!(subject = claims.subject().unwrap_or("-"), "Access token accepted");
                metrics::record_gate_decision("allowed");
                Ok(claims)
            }
            Err(err) if err.is_timeout() => {
                tracing::warn!(reason = %err, "Verification authority timed out");
                metrics::record_gate_decision("timed_out");
                Err(GateRejection::Rejected(err))
            }
            Err(err) => {
                tracing::info!(reason = %err, "Access token rejected");
                metrics::record_gate_decision("rejected");
                Err(GateRejection::Rejected(err))
            }
        }
    }
}

/// Middleware guarding protected routes.
///
/// On success the verified `ClaimSet` is the only thing added to the request
/// before the inner handler runs.
pub async fn authentication_required(
    State(gate): State<AuthGate>,
    mut request: Request,
    next: Next,
) -> Response {
    match gate.check(request.headers()).await {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(rejection) => rejection.into_response(),
    }
}
