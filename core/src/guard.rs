use crate::errors::{AuthError, GuardError, IntegrityError};
use crate::integrity::IntegrityChecker;
use crate::token::TokenVerifier;
use crate::types::{Claims, GuardState, VerificationResult};

/// Result of running a request through the boundary check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The token was rejected; the request never reached the resource.
    Rejected(AuthError),
    /// The caller is authenticated but the content could not be checked.
    Unchecked { claims: Claims, error: IntegrityError },
    Verified { claims: Claims },
    Tampered { claims: Claims, resource_id: String },
}

impl GuardOutcome {
    pub fn state(&self) -> GuardState {
        match self {
            GuardOutcome::Rejected(_) => GuardState::Unauthenticated,
            GuardOutcome::Unchecked { .. } => GuardState::Authenticated,
            GuardOutcome::Verified { .. } => GuardState::Verified,
            GuardOutcome::Tampered { .. } => GuardState::Tampered,
        }
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            GuardOutcome::Rejected(_) => None,
            GuardOutcome::Unchecked { claims, .. } | GuardOutcome::Verified { claims } | GuardOutcome::Tampered { claims, .. } => Some(claims),
        }
    }

    /// Claims of a verified request, or the error that stopped it.
    pub fn into_result(self) -> Result<Claims, GuardError> {
        match self {
            GuardOutcome::Rejected(err) => Err(err.into()),
            GuardOutcome::Unchecked { error, .. } => Err(error.into()),
            GuardOutcome::Verified { claims } => Ok(claims),
            GuardOutcome::Tampered { resource_id, .. } => Err(GuardError::Mismatch(resource_id)),
        }
    }
}

/// Guard coordinates token verification and content integrity for protected resources.
#[derive(Clone, Debug)]
pub struct Guard {
    tokens: TokenVerifier,
    integrity: IntegrityChecker,
}

impl Guard {
    /// Create a new `Guard` from a token verifier and an integrity checker.
    pub fn new(tokens: TokenVerifier, integrity: IntegrityChecker) -> Self {
        Self { tokens, integrity }
    }

    pub fn integrity(&self) -> &IntegrityChecker { &self.integrity }

    /// Authenticate a request from its `Authorization` header.
    pub fn authorize(&self, header: Option<&str>, now: i64) -> Result<Claims, AuthError> {
        self.tokens.verify_header(header, now)
    }

    /// Authenticate a request, then check `content` against the reference for `resource_id`.
    pub fn check_resource(&self, header: Option<&str>, resource_id: &str, content: &[u8], now: i64) -> GuardOutcome {
        // 1) Unauthenticated -> Authenticated
        let claims = match self.authorize(header, now) {
            Ok(claims) => claims,
            Err(err) => return GuardOutcome::Rejected(err),
        };

        // 2) Authenticated -> Verified | Tampered
        match self.integrity.check(resource_id, content) {
            Ok(VerificationResult::Match) => GuardOutcome::Verified { claims },
            Ok(VerificationResult::Mismatch) => GuardOutcome::Tampered { claims, resource_id: resource_id.to_string() },
            Err(error) => GuardOutcome::Unchecked { claims, error },
        }
    }
}
