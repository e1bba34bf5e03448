//! Capability for fetching space metadata from the catalog subsystem.
//!
//! The presence core never talks to the catalog's storage directly. It
//! is handed an implementation of [`SpaceDirectory`] — backed by the real
//! CRUD service in production, by a static map in demos and tests — and
//! calls it exactly once per join.

use plaza_proto::SpaceId;

use crate::{SpaceError, SpaceSnapshot};

/// Read-only lookup of space metadata.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use plaza_proto::SpaceId;
/// use plaza_space::{SpaceDirectory, SpaceError, SpaceSnapshot};
///
/// /// Serves spaces out of a fixed map. Useful for tests and demos.
/// struct StaticDirectory {
///     spaces: HashMap<SpaceId, SpaceSnapshot>,
/// }
///
/// impl SpaceDirectory for StaticDirectory {
///     async fn lookup(
///         &self,
///         space_id: &SpaceId,
///     ) -> Result<SpaceSnapshot, SpaceError> {
///         self.spaces
///             .get(space_id)
///             .cloned()
///             .ok_or_else(|| SpaceError::NotFound(space_id.clone()))
///     }
/// }
/// ```
pub trait SpaceDirectory: Send + Sync + 'static {
    /// Fetches the snapshot for the given space.
    ///
    /// # Returns
    /// - `Ok(SpaceSnapshot)` — dimensions and obstacle layout
    /// - `Err(SpaceError::NotFound)` — no such space
    /// - `Err(SpaceError::LookupFailed)` — the collaborator failed
    fn lookup(
        &self,
        space_id: &SpaceId,
    ) -> impl std::future::Future<Output = Result<SpaceSnapshot, SpaceError>> + Send;
}
