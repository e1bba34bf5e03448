//! The server's record of one joined connection.

use std::time::Instant;

use plaza_proto::{SpaceId, UserId};
use plaza_room::{RoomError, RoomHandle};
use plaza_transport::ConnectionId;

/// One authenticated connection's presence inside a single room.
///
/// Created only after a successful join handshake; a connection that
/// fails the handshake never gets a session. The session holds no
/// position of its own — the room's table is authoritative, which keeps
/// a session's view and the room's broadcast view from diverging.
pub struct Session {
    user_id: UserId,
    conn_id: ConnectionId,
    space_id: SpaceId,
    room: RoomHandle,
    joined_at: Instant,
}

impl Session {
    /// Binds a verified identity on a connection to its room.
    pub fn new(
        user_id: UserId,
        conn_id: ConnectionId,
        room: RoomHandle,
    ) -> Self {
        let space_id = room.space_id().clone();
        Self {
            user_id,
            conn_id,
            space_id,
            room,
            joined_at: Instant::now(),
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn conn_id(&self) -> ConnectionId {
        self.conn_id
    }

    pub fn space_id(&self) -> &SpaceId {
        &self.space_id
    }

    pub fn room(&self) -> &RoomHandle {
        &self.room
    }

    /// When the join handshake completed.
    pub fn joined_at(&self) -> Instant {
        self.joined_at
    }

    /// Forwards a movement request to the room. Requests from one
    /// connection reach the room in arrival order.
    pub async fn forward_move(&self, x: i64, y: i64) -> Result<(), RoomError> {
        self.room.try_move(self.user_id.clone(), x, y).await
    }

    /// Detaches from the room. Idempotent: the room ignores a leave for
    /// a user it no longer knows.
    pub async fn leave(&self) -> Result<(), RoomError> {
        tracing::debug!(
            user_id = %self.user_id,
            conn_id = %self.conn_id,
            space_id = %self.space_id,
            "detaching session"
        );
        self.room.leave(self.user_id.clone()).await
    }
}
