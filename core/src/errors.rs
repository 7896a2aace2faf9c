use thiserror::Error;

/// Reasons a presented bearer token does not authorize the caller.
///
/// Every variant is terminal: retrying with the same inputs yields the same result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

/// Errors from the reference digest store surrounding the integrity check.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("no reference digest for resource {0}")]
    UnknownResource(String),
    #[error("reference digest already recorded for resource {0}")]
    AlreadyRecorded(String),
    #[error("invalid digest: {0}")]
    InvalidDigest(String),
    #[error("resource {0} is owned by another subject")]
    NotOwner(String),
    #[error("reference document could not be parsed: {0}")]
    InvalidReferences(String),
}

/// Failure of the combined boundary check.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GuardError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error("integrity violation: content does not match reference digest for {0}")]
    Mismatch(String),
}

impl GuardError {
    /// HTTP status the calling layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            GuardError::Auth(_) => 401,
            GuardError::Mismatch(_) => 409,
            GuardError::Integrity(IntegrityError::UnknownResource(_)) => 404,
            GuardError::Integrity(IntegrityError::AlreadyRecorded(_)) => 409,
            GuardError::Integrity(IntegrityError::InvalidDigest(_)) => 400,
            GuardError::Integrity(IntegrityError::NotOwner(_)) => 403,
            GuardError::Integrity(IntegrityError::InvalidReferences(_)) => 500,
        }
    }
}
