//! ProtChain guard core: bearer token verification and content integrity.
//!
//! - HS256 token parsing, signature and expiry checks (`token`)
//! - SHA-256 fingerprints and tamper detection against reference digests (`integrity`)
//! - The combined boundary check for protected resources (`guard`)
//!
//! Every check is a pure function of its inputs. Secrets and reference digests are
//! supplied by the caller; nothing here reads the environment or logs.

pub mod errors;
pub mod guard;
pub mod integrity;
pub mod token;
pub mod traits;
pub mod types;

pub use errors::{AuthError, GuardError, IntegrityError};
pub use guard::{Guard, GuardOutcome};
pub use integrity::{fingerprint, InMemoryDigestStore, IntegrityChecker};
pub use token::{bearer_token, TokenIssuer, TokenVerifier};
pub use traits::DigestStore;
pub use types::{Claims, Digest, GuardState, Header, VerificationResult, DEFAULT_TOKEN_TTL};

/// Library version string.
pub fn version() -> &'static str { "protchain-guard-core 0.1.0" }
