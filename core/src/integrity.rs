use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use sha2::{Digest as _, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::IntegrityError;
use crate::traits::DigestStore;
use crate::types::{Digest, VerificationResult};

/// SHA-256 fingerprint of `content`.
pub fn fingerprint(content: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(content);
    Digest::from_bytes(hasher.finalize().into())
}

/// Compare `content` against a previously recorded digest.
///
/// Any change to the content, however small, yields `Mismatch`.
pub fn verify(content: &[u8], expected: &Digest) -> VerificationResult {
    let computed = fingerprint(content);
    if bool::from(computed.as_bytes().ct_eq(expected.as_bytes())) {
        VerificationResult::Match
    } else {
        VerificationResult::Mismatch
    }
}

/// A recorded reference and the subject that committed it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reference {
    digest: Digest,
    owner: Option<String>,
}

/// Simple in-memory digest store suitable for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryDigestStore {
    inner: Mutex<HashMap<String, Reference>>,
}

impl InMemoryDigestStore {
    /// Create a new, empty store.
    pub fn new() -> Self { Self::default() }

    /// Build a store from a JSON object of `resource_id -> hex digest`.
    ///
    /// Loaded references have no owner, so no subject can retire them.
    pub fn from_json(json: &str) -> Result<Self, IntegrityError> {
        let refs: HashMap<String, Digest> = serde_json::from_str(json).map_err(|e| IntegrityError::InvalidReferences(e.to_string()))?;
        let refs = refs.into_iter().map(|(id, digest)| (id, Reference { digest, owner: None })).collect();
        Ok(Self { inner: Mutex::new(refs) })
    }

    pub fn len(&self) -> usize { self.lock().len() }

    pub fn is_empty(&self) -> bool { self.lock().is_empty() }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Reference>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DigestStore for InMemoryDigestStore {
    fn reference(&self, resource_id: &str) -> Option<Digest> {
        self.lock().get(resource_id).map(|r| r.digest)
    }
    fn owner(&self, resource_id: &str) -> Option<String> {
        self.lock().get(resource_id).and_then(|r| r.owner.clone())
    }
    fn record(&self, resource_id: &str, owner: &str, digest: Digest) -> Result<(), IntegrityError> {
        let mut refs = self.lock();
        if refs.contains_key(resource_id) {
            return Err(IntegrityError::AlreadyRecorded(resource_id.to_string()));
        }
        refs.insert(resource_id.to_string(), Reference { digest, owner: Some(owner.to_string()) });
        Ok(())
    }
    fn retire(&self, resource_id: &str, owner: &str) -> Result<(), IntegrityError> {
        let mut refs = self.lock();
        let existing = refs
            .get(resource_id)
            .ok_or_else(|| IntegrityError::UnknownResource(resource_id.to_string()))?;
        if existing.owner.as_deref() != Some(owner) {
            return Err(IntegrityError::NotOwner(resource_id.to_string()));
        }
        refs.remove(resource_id);
        Ok(())
    }
}

/// Checks resource content against the reference digests held by a `DigestStore`.
#[derive(Clone)]
pub struct IntegrityChecker {
    store: Arc<dyn DigestStore>,
}

impl IntegrityChecker {
    pub fn new(store: Arc<dyn DigestStore>) -> Self { Self { store } }

    /// Fingerprint `content` and record it as `owner`'s reference for a newly committed resource.
    pub fn commit(&self, resource_id: &str, owner: &str, content: &[u8]) -> Result<Digest, IntegrityError> {
        let digest = fingerprint(content);
        self.store.record(resource_id, owner, digest)?;
        Ok(digest)
    }

    /// Compare `content` with the recorded reference for `resource_id`.
    pub fn check(&self, resource_id: &str, content: &[u8]) -> Result<VerificationResult, IntegrityError> {
        let expected = self
            .store
            .reference(resource_id)
            .ok_or_else(|| IntegrityError::UnknownResource(resource_id.to_string()))?;
        Ok(verify(content, &expected))
    }

    /// Retire the reference of a resource `owner` deleted.
    pub fn retire(&self, resource_id: &str, owner: &str) -> Result<(), IntegrityError> {
        self.store.retire(resource_id, owner)
    }

    pub fn reference(&self, resource_id: &str) -> Option<Digest> { self.store.reference(resource_id) }

    pub fn owner(&self, resource_id: &str) -> Option<String> { self.store.owner(resource_id) }
}

impl std::fmt::Debug for IntegrityChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegrityChecker").finish_non_exhaustive()
    }
}
