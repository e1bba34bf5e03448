//! Room registry: the space-keyed table of live rooms.
//!
//! The table is a `DashMap`, so creation is guarded per key: two
//! connections racing the first join of a space still construct exactly
//! one room, and joins to different spaces never contend with each
//! other. Rooms unregister themselves when they empty.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use plaza_proto::{SpaceId, UserId};
use plaza_space::SpaceSnapshot;

use crate::room::{spawn_room, JoinAccept, MemberSender, RoomHandle};
use crate::{RoomConfig, RoomError};

/// Maps each space to its live room, if any.
pub struct RoomRegistry {
    rooms: DashMap<SpaceId, RoomHandle>,
    config: RoomConfig,
    /// Handed to each spawned room so it can unregister itself on
    /// teardown without keeping the registry alive.
    self_ref: Weak<RoomRegistry>,
}

impl RoomRegistry {
    /// Creates an empty registry. Rooms it spawns hold a weak reference
    /// back to it for teardown, hence the `Arc`.
    pub fn new(config: RoomConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            rooms: DashMap::new(),
            config,
            self_ref: weak.clone(),
        })
    }

    /// Returns the live room for the space, constructing it if absent.
    ///
    /// The dashmap entry API serializes construction per key: under a
    /// concurrent first-join race exactly one actor is spawned and both
    /// callers get its handle.
    pub fn get_or_create(&self, space: &SpaceSnapshot) -> RoomHandle {
        self.rooms
            .entry(space.id.clone())
            .or_insert_with(|| {
                tracing::info!(space_id = %space.id, "creating room");
                spawn_room(
                    space.clone(),
                    self.config.clone(),
                    self.self_ref.clone(),
                )
            })
            .clone()
    }

    /// Attaches a user to the space's room, constructing it if needed.
    ///
    /// A join can race a room that is shutting down after its last
    /// member left; the defunct handle answers `Closed`, the stale entry
    /// is dropped, and the join retries against a fresh room.
    pub async fn join(
        &self,
        space: &SpaceSnapshot,
        user_id: UserId,
        sender: MemberSender,
    ) -> Result<(RoomHandle, JoinAccept), RoomError> {
        loop {
            let handle = self.get_or_create(space);
            match handle.join(user_id.clone(), sender.clone()).await {
                Ok(accept) => return Ok((handle, accept)),
                Err(RoomError::Closed(_)) => {
                    self.rooms.remove_if(&space.id, |_, h| {
                        h.instance() == handle.instance()
                    });
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Drops the entry for a room that emptied. Called by the room
    /// actor itself; the instance number guards against tearing down a
    /// successor room that already took the key.
    pub(crate) fn remove_if_empty(&self, space_id: &SpaceId, instance: u64) {
        let removed = self
            .rooms
            .remove_if(space_id, |_, handle| handle.instance() == instance);
        if removed.is_some() {
            tracing::info!(%space_id, "room removed");
        }
    }

    /// Returns the live room for a space, if one exists.
    pub fn room(&self, space_id: &SpaceId) -> Option<RoomHandle> {
        self.rooms.get(space_id).map(|entry| entry.value().clone())
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms are live.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
