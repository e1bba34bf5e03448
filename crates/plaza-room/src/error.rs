//! Error types for the room layer.

use plaza_proto::{SpaceId, UserId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room has shut down (its last member left) or its mailbox is
    /// gone. The registry treats this as a signal to construct a fresh
    /// room; it never surfaces from a registry join.
    #[error("room for space {0} is closed")]
    Closed(SpaceId),

    /// No free spawn cell is left in the space.
    #[error("space {0} is full")]
    SpaceFull(SpaceId),

    /// The user is already a member of this room (e.g. a second
    /// connection presenting the same identity).
    #[error("user {0} already joined space {1}")]
    AlreadyJoined(UserId, SpaceId),
}
