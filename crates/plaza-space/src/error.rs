//! Error types for space lookup.

use plaza_proto::SpaceId;

/// Errors produced by a [`SpaceDirectory`](crate::SpaceDirectory).
#[derive(Debug, thiserror::Error)]
pub enum SpaceError {
    /// No space exists for the given ID.
    #[error("space {0} not found")]
    NotFound(SpaceId),

    /// The catalog collaborator failed or could not be reached. Joins
    /// treat this the same as a missing space so clients retry uniformly.
    #[error("space lookup failed: {0}")]
    LookupFailed(String),
}
