//! Core protocol types for Plaza's wire format.
//!
//! Every message exchanged with a client is one of two enums:
//! [`ClientMessage`] (inbound) or [`ServerMessage`] (outbound). Both are
//! serialized as `{"type": "...", "payload": {...}}` with kebab-case type
//! tags and camelCase payload fields, which is what browser clients expect.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user, issued by the identity collaborator.
///
/// Newtype over `String`; `#[serde(transparent)]` keeps it a plain JSON
/// string on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A unique identifier for a space, owned by the catalog collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(pub String);

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SpaceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A cell on a space's grid. Stored positions are always within the
/// space's bounds, so the coordinates are unsigned.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One entry of the membership snapshot returned to a joiner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: UserId,
}

// ---------------------------------------------------------------------------
// Inbound messages
// ---------------------------------------------------------------------------

/// Messages a client sends to the server.
///
/// Movement coordinates are signed on the way in: an out-of-range request
/// like `(-1, 0)` must parse so the server can answer it with a proper
/// `movement-rejected` instead of a decode error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Request to enter a space. Exactly one per connection lifetime.
    #[serde(rename_all = "camelCase")]
    Join { space_id: SpaceId, token: String },

    /// Request to step to the given cell.
    Movement { x: i64, y: i64 },
}

// ---------------------------------------------------------------------------
// Outbound messages
// ---------------------------------------------------------------------------

/// Messages the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Reply to a successful join: the assigned spawn cell and a snapshot
    /// of the members that were present before the join.
    SpaceJoined {
        spawn: Position,
        users: Vec<UserSummary>,
    },

    /// Broadcast to existing members when someone joins.
    #[serde(rename_all = "camelCase")]
    UserJoin { user_id: UserId, x: u32, y: u32 },

    /// Broadcast of an accepted move, sent to everyone but the mover.
    #[serde(rename_all = "camelCase")]
    Movement { user_id: UserId, x: u32, y: u32 },

    /// Unicast reply to a refused move. The coordinates are the
    /// requester's last known-good position, never the rejected target.
    MovementRejected { x: u32, y: u32 },

    /// Broadcast to remaining members when someone leaves.
    #[serde(rename_all = "camelCase")]
    UserLeft { user_id: UserId },

    /// Failure reply. `code` follows HTTP conventions (400 bad request,
    /// 401 unauthorized, 404 not found).
    Error { code: u16, message: String },
}

// =========================================================================
// Tests
// =========================================================================
