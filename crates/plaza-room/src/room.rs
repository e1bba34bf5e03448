//! Room actor: an isolated Tokio task that owns one space's live state.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc mailbox. Join, move, and leave for one room are
//! processed strictly one at a time, which is what makes the broadcast
//! order equal the commit order without any locking.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Weak;

use plaza_proto::{Position, ServerMessage, SpaceId, UserId};
use plaza_space::{validate, SpaceSnapshot};
use tokio::sync::{mpsc, oneshot};

use crate::{dispatch, RoomConfig, RoomError, RoomRegistry};

/// Counter distinguishing room instances. A space that empties and is
/// re-joined gets a fresh instance; the registry uses the number to
/// ignore stale teardown notifications.
static NEXT_ROOM_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Channel sender for delivering events to one member's connection.
pub type MemberSender = mpsc::Sender<ServerMessage>;

/// What a successful join returns to the joiner: the assigned spawn cell
/// and the membership as it was *before* the join.
#[derive(Debug, Clone)]
pub struct JoinAccept {
    pub spawn: Position,
    pub users: Vec<UserId>,
}

/// Read-only view of a room's state, for tests and diagnostics.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub space_id: SpaceId,
    pub instance: u64,
    pub members: Vec<UserId>,
    pub positions: HashMap<UserId, Position>,
}

/// Commands sent to a room actor through its mailbox.
pub(crate) enum RoomCommand {
    /// Add a user with their outbound event buffer.
    Join {
        user_id: UserId,
        sender: MemberSender,
        reply: oneshot::Sender<Result<JoinAccept, RoomError>>,
    },

    /// Request to step to a target cell. Fire-and-forget: an accepted
    /// move is broadcast to the others, a refused one is answered on the
    /// requester's own buffer.
    Move { user_id: UserId, x: i64, y: i64 },

    /// Remove a user. Idempotent.
    Leave { user_id: UserId },

    /// Request the current room state.
    Snapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    space_id: SpaceId,
    instance: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The space this room runs.
    pub fn space_id(&self) -> &SpaceId {
        &self.space_id
    }

    pub(crate) fn instance(&self) -> u64 {
        self.instance
    }

    /// Sends a join request and waits for the room's decision.
    pub async fn join(
        &self,
        user_id: UserId,
        sender: MemberSender,
    ) -> Result<JoinAccept, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                user_id,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Closed(self.space_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Closed(self.space_id.clone()))?
    }

    /// Forwards a movement request (fire-and-forget).
    pub async fn try_move(
        &self,
        user_id: UserId,
        x: i64,
        y: i64,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Move { user_id, x, y })
            .await
            .map_err(|_| RoomError::Closed(self.space_id.clone()))
    }

    /// Detaches a user (fire-and-forget, idempotent).
    pub async fn leave(&self, user_id: UserId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Leave { user_id })
            .await
            .map_err(|_| RoomError::Closed(self.space_id.clone()))
    }

    /// Requests a state snapshot.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Closed(self.space_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Closed(self.space_id.clone()))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    space: SpaceSnapshot,
    instance: u64,
    config: RoomConfig,
    /// Per-member outbound buffers. The keys are exactly the live
    /// membership.
    members: HashMap<UserId, MemberSender>,
    /// Authoritative positions, keyed like `members`.
    positions: HashMap<UserId, Position>,
    registry: Weak<RoomRegistry>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until the room empties.
    ///
    /// A room never goes back to being joinable after it empties: the
    /// loop breaks, pending mailbox senders observe a closed channel,
    /// and the registry constructs a fresh instance for the next join.
    async fn run(mut self) {
        tracing::debug!(
            space_id = %self.space.id,
            instance = self.instance,
            "room started"
        );

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    user_id,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(user_id, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Move { user_id, x, y } => {
                    self.handle_move(&user_id, x, y);
                }
                RoomCommand::Leave { user_id } => {
                    self.handle_leave(&user_id);
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.snapshot());
                    continue;
                }
            }
            if self.members.is_empty() {
                break;
            }
        }

        if let Some(registry) = self.registry.upgrade() {
            registry.remove_if_empty(&self.space.id, self.instance);
        }
        tracing::debug!(
            space_id = %self.space.id,
            instance = self.instance,
            "room stopped"
        );
    }

    fn handle_join(
        &mut self,
        user_id: UserId,
        sender: MemberSender,
    ) -> Result<JoinAccept, RoomError> {
        if self.members.contains_key(&user_id) {
            return Err(RoomError::AlreadyJoined(
                user_id,
                self.space.id.clone(),
            ));
        }
        let spawn = self
            .first_free_cell()
            .ok_or_else(|| RoomError::SpaceFull(self.space.id.clone()))?;

        let users: Vec<UserId> = self.members.keys().cloned().collect();
        self.members.insert(user_id.clone(), sender);
        self.positions.insert(user_id.clone(), spawn);
        tracing::info!(
            space_id = %self.space.id,
            %user_id,
            %spawn,
            members = self.members.len(),
            "user joined"
        );

        // Only the members that existed before this join hear about it.
        let overflow = dispatch::fan_out(
            &self.members,
            &ServerMessage::UserJoin {
                user_id: user_id.clone(),
                x: spawn.x,
                y: spawn.y,
            },
            Some(&user_id),
        );
        self.kick(overflow);

        Ok(JoinAccept { spawn, users })
    }

    fn handle_move(&mut self, user_id: &UserId, x: i64, y: i64) {
        let Some(from) = self.positions.get(user_id).copied() else {
            tracing::warn!(
                space_id = %self.space.id,
                %user_id,
                "movement from non-member, ignoring"
            );
            return;
        };

        match validate(
            &self.space,
            &self.positions,
            from,
            (x, y),
            self.config.rules,
        ) {
            Ok(to) => {
                self.positions.insert(user_id.clone(), to);
                let overflow = dispatch::fan_out(
                    &self.members,
                    &ServerMessage::Movement {
                        user_id: user_id.clone(),
                        x: to.x,
                        y: to.y,
                    },
                    Some(user_id),
                );
                self.kick(overflow);
            }
            Err(reason) => {
                tracing::debug!(
                    space_id = %self.space.id,
                    %user_id,
                    %reason,
                    "movement rejected"
                );
                // Unicast only; the echoed coordinates are the last
                // known-good position, never the rejected target.
                let delivered = dispatch::send_to(
                    &self.members,
                    user_id,
                    ServerMessage::MovementRejected {
                        x: from.x,
                        y: from.y,
                    },
                );
                if !delivered {
                    self.kick(vec![user_id.clone()]);
                }
            }
        }
    }

    fn handle_leave(&mut self, user_id: &UserId) {
        // Idempotent: the disconnect cleanup path may race an explicit
        // leave, and only the first removal broadcasts.
        if self.members.remove(user_id).is_none() {
            return;
        }
        self.positions.remove(user_id);
        tracing::info!(
            space_id = %self.space.id,
            %user_id,
            members = self.members.len(),
            "user left"
        );
        let overflow = dispatch::fan_out(
            &self.members,
            &ServerMessage::UserLeft {
                user_id: user_id.clone(),
            },
            None,
        );
        self.kick(overflow);
    }

    /// Drops members whose outbound buffers overflowed, announcing each
    /// departure. Announcing can overflow further buffers, so this loops
    /// until the worklist drains.
    fn kick(&mut self, mut overflowed: Vec<UserId>) {
        while let Some(user_id) = overflowed.pop() {
            if self.members.remove(&user_id).is_none() {
                continue;
            }
            self.positions.remove(&user_id);
            tracing::warn!(
                space_id = %self.space.id,
                %user_id,
                "outbound buffer overflowed, dropping member"
            );
            overflowed.extend(dispatch::fan_out(
                &self.members,
                &ServerMessage::UserLeft {
                    user_id: user_id.clone(),
                },
                None,
            ));
        }
    }

    /// Spawn assignment: the first cell in row-major scan order (y rows
    /// outer, x inner) that is neither an obstacle nor occupied. The
    /// rule is deterministic so tests can predict spawn coordinates.
    fn first_free_cell(&self) -> Option<Position> {
        let taken: HashSet<&Position> = self.positions.values().collect();
        for y in 0..self.space.height {
            for x in 0..self.space.width {
                let cell = Position::new(x, y);
                if !self.space.is_obstacle(cell) && !taken.contains(&cell) {
                    return Some(cell);
                }
            }
        }
        None
    }

    fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            space_id: self.space.id.clone(),
            instance: self.instance,
            members: self.members.keys().cloned().collect(),
            positions: self.positions.clone(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room(
    space: SpaceSnapshot,
    config: RoomConfig,
    registry: Weak<RoomRegistry>,
) -> RoomHandle {
    let instance = NEXT_ROOM_INSTANCE.fetch_add(1, Ordering::Relaxed);
    let (tx, rx) = mpsc::channel(config.mailbox_capacity);
    let space_id = space.id.clone();

    let actor = RoomActor {
        space,
        instance,
        config,
        members: HashMap::new(),
        positions: HashMap::new(),
        registry,
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle {
        space_id,
        instance,
        sender: tx,
    }
}
