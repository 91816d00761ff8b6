//! Access token authentication.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → bearer.rs (strict `Bearer <token>` extraction)
//!     → verifier.rs (TokenVerifier seam, delegated check)
//!         → jwks.rs (production authority: OIDC key set + RS256)
//!     → claims.rs (ClaimSet handed back to the gate)
//! ```
//!
//! # Design Decisions
//! - The gate never inspects tokens itself; every verdict comes from a `TokenVerifier`
//! - Verifiers are injected as `Arc<dyn TokenVerifier>`, never globals
//! - Failure reasons are human-readable and safe to return to the caller

pub mod bearer;
pub mod claims;
pub mod jwks;
pub mod verifier;

pub use bearer::extract_bearer;
pub use claims::ClaimSet;
pub use jwks::{JwksVerifier, VerifierSetupError};
pub use verifier::{TokenVerifier, VerificationError};
