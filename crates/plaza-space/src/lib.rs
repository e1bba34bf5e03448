//! Space metadata and movement rules for Plaza.
//!
//! A *space* is the immutable template a room runs on: grid dimensions
//! plus a static obstacle layout, owned by the catalog subsystem and
//! fetched once at join time. This crate holds the read-only snapshot
//! type, the [`SpaceDirectory`] capability for fetching it, and the pure
//! movement validator the room consults on every move request.

#![allow(async_fn_in_trait)]

mod directory;
mod error;
mod space;
mod validate;

pub use directory::SpaceDirectory;
pub use error::SpaceError;
pub use space::SpaceSnapshot;
pub use validate::{validate, MoveRules, RejectReason};
