use crate::errors::IntegrityError;
use crate::types::Digest;

/// Storage for last known-good content digests, keyed by resource identifier.
///
/// The integrity check only reads references. `record` and `retire` exist for the
/// calling layer that commits and deletes resources; both are scoped to the subject
/// that committed the resource.
pub trait DigestStore: Send + Sync {
    /// Reference digest recorded for `resource_id`, if any.
    fn reference(&self, resource_id: &str) -> Option<Digest>;
    /// Subject that committed `resource_id`. `None` for unknown resources and for
    /// references loaded without an owner.
    fn owner(&self, resource_id: &str) -> Option<String>;
    /// Record the reference for a newly committed resource. Existing records are never replaced.
    fn record(&self, resource_id: &str, owner: &str, digest: Digest) -> Result<(), IntegrityError>;
    /// Drop the reference of a deleted resource. Only its owner may do so.
    fn retire(&self, resource_id: &str, owner: &str) -> Result<(), IntegrityError>;
}
