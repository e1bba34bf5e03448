//! Integration tests for the room system: registry, actor, dispatch.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use plaza_proto::{Position, ServerMessage, SpaceId, UserId};
use plaza_room::{MemberSender, RoomConfig, RoomError, RoomRegistry};
use plaza_space::{MoveRules, SpaceSnapshot};
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

fn uid(s: &str) -> UserId {
    UserId::from(s)
}

fn space(width: u32, height: u32) -> SpaceSnapshot {
    SpaceSnapshot::new(SpaceId::from("test-space"), width, height)
}

fn registry() -> Arc<RoomRegistry> {
    RoomRegistry::new(RoomConfig::default())
}

/// Creates a member outbound buffer pair.
fn member() -> (MemberSender, mpsc::Receiver<ServerMessage>) {
    mpsc::channel(32)
}

/// Receives the next event or panics after a short timeout.
async fn recv(rx: &mut mpsc::Receiver<ServerMessage>) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("channel closed")
}

/// Lets in-flight room commands settle before asserting on silence.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

// =========================================================================
// Join
// =========================================================================

#[tokio::test]
async fn test_first_joiner_spawns_at_origin_with_empty_snapshot() {
    let reg = registry();
    let s = space(100, 200);
    let (tx, _rx) = member();

    let (_room, accept) = reg.join(&s, uid("a"), tx).await.unwrap();

    assert_eq!(accept.spawn, Position::new(0, 0));
    assert!(accept.users.is_empty());
}

#[tokio::test]
async fn test_spawn_scan_is_row_major_x_fastest() {
    let reg = registry();
    let s = space(3, 3);

    let mut spawns = Vec::new();
    let mut keep = Vec::new();
    for name in ["a", "b", "c", "d"] {
        let (tx, rx) = member();
        keep.push(rx); // receivers must outlive the joins
        let (_, accept) = reg.join(&s, uid(name), tx).await.unwrap();
        spawns.push(accept.spawn);
    }

    assert_eq!(
        spawns,
        vec![
            Position::new(0, 0),
            Position::new(1, 0),
            Position::new(2, 0),
            Position::new(0, 1),
        ]
    );
}

#[tokio::test]
async fn test_spawn_skips_obstacle_cells() {
    let reg = registry();
    let s = space(3, 3)
        .with_obstacles([Position::new(0, 0), Position::new(1, 0)]);
    let (tx, _rx) = member();

    let (_, accept) = reg.join(&s, uid("a"), tx).await.unwrap();

    assert_eq!(accept.spawn, Position::new(2, 0));
}

#[tokio::test]
async fn test_kth_joiner_sees_k_minus_one_users() {
    let reg = registry();
    let s = space(10, 10);

    let mut keep = Vec::new();
    for (k, name) in ["a", "b", "c", "d"].iter().enumerate() {
        let (tx, rx) = member();
        let (_, accept) = reg.join(&s, uid(name), tx).await.unwrap();
        assert_eq!(accept.users.len(), k);
        keep.push(rx);
    }
}

#[tokio::test]
async fn test_join_broadcast_reaches_existing_members_only() {
    let reg = registry();
    let s = space(10, 10);
    let (tx_a, mut rx_a) = member();
    let (tx_b, mut rx_b) = member();

    reg.join(&s, uid("a"), tx_a).await.unwrap();
    let (_, accept_b) = reg.join(&s, uid("b"), tx_b).await.unwrap();

    assert_eq!(
        recv(&mut rx_a).await,
        ServerMessage::UserJoin {
            user_id: uid("b"),
            x: accept_b.spawn.x,
            y: accept_b.spawn.y,
        }
    );
    settle().await;
    assert!(rx_b.try_recv().is_err(), "joiner must not hear its own join");
}

#[tokio::test]
async fn test_duplicate_identity_is_refused() {
    let reg = registry();
    let s = space(10, 10);
    let (tx1, _rx1) = member();
    let (tx2, _rx2) = member();

    reg.join(&s, uid("a"), tx1).await.unwrap();
    let result = reg.join(&s, uid("a"), tx2).await;

    assert!(matches!(result, Err(RoomError::AlreadyJoined(_, _))));
}

#[tokio::test]
async fn test_join_fails_when_no_free_cell() {
    let reg = registry();
    let s = space(1, 1);
    let (tx_a, _rx_a) = member();
    let (tx_b, _rx_b) = member();

    reg.join(&s, uid("a"), tx_a).await.unwrap();
    let result = reg.join(&s, uid("b"), tx_b).await;

    assert!(matches!(result, Err(RoomError::SpaceFull(_))));
}

// =========================================================================
// Movement
// =========================================================================

#[tokio::test]
async fn test_accepted_move_updates_position_and_broadcasts_to_others() {
    let reg = registry();
    let s = space(10, 10);
    let (tx_a, mut rx_a) = member();
    let (tx_b, mut rx_b) = member();

    let (room, _) = reg.join(&s, uid("a"), tx_a).await.unwrap();
    reg.join(&s, uid("b"), tx_b).await.unwrap();
    let _ = recv(&mut rx_a).await; // drain b's user-join

    room.try_move(uid("a"), 0, 1).await.unwrap();

    assert_eq!(
        recv(&mut rx_b).await,
        ServerMessage::Movement {
            user_id: uid("a"),
            x: 0,
            y: 1,
        }
    );
    settle().await;
    assert!(rx_a.try_recv().is_err(), "mover must not hear its own move");

    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.positions[&uid("a")], Position::new(0, 1));
}

#[tokio::test]
async fn test_rejected_move_unicasts_last_good_position() {
    let reg = registry();
    let s = space(10, 10);
    let (tx_a, mut rx_a) = member();
    let (tx_b, mut rx_b) = member();

    let (room, _) = reg.join(&s, uid("a"), tx_a).await.unwrap();
    reg.join(&s, uid("b"), tx_b).await.unwrap();
    let _ = recv(&mut rx_a).await; // drain b's user-join

    // a sits at (0, 0); a five-cell jump is refused.
    room.try_move(uid("a"), 5, 0).await.unwrap();

    assert_eq!(
        recv(&mut rx_a).await,
        ServerMessage::MovementRejected { x: 0, y: 0 }
    );
    settle().await;
    assert!(
        rx_b.try_recv().is_err(),
        "rejections are never broadcast to other members"
    );

    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.positions[&uid("a")], Position::new(0, 0));
}

#[tokio::test]
async fn test_rejection_echoes_position_after_earlier_moves() {
    let reg = registry();
    let s = space(10, 10);
    let (tx_a, mut rx_a) = member();

    let (room, _) = reg.join(&s, uid("a"), tx_a).await.unwrap();

    room.try_move(uid("a"), 0, 1).await.unwrap();
    room.try_move(uid("a"), 7, 7).await.unwrap();

    // The echo is the position after the accepted move, not the spawn
    // and not the rejected target.
    assert_eq!(
        recv(&mut rx_a).await,
        ServerMessage::MovementRejected { x: 0, y: 1 }
    );
}

#[tokio::test]
async fn test_move_onto_occupied_cell_is_refused_by_default() {
    let reg = registry();
    let s = space(10, 10);
    let (tx_a, _rx_a) = member();
    let (tx_b, mut rx_b) = member();

    let (room, _) = reg.join(&s, uid("a"), tx_a).await.unwrap(); // (0,0)
    reg.join(&s, uid("b"), tx_b).await.unwrap(); // (1,0)

    // b tries to step onto a's cell.
    room.try_move(uid("b"), 0, 0).await.unwrap();

    assert_eq!(
        recv(&mut rx_b).await,
        ServerMessage::MovementRejected { x: 1, y: 0 }
    );
}

#[tokio::test]
async fn test_stacking_policy_allows_shared_cells() {
    let reg = RoomRegistry::new(RoomConfig {
        rules: MoveRules {
            allow_stacking: true,
        },
        ..RoomConfig::default()
    });
    let s = space(10, 10);
    let (tx_a, mut rx_a) = member();
    let (tx_b, _rx_b) = member();

    reg.join(&s, uid("a"), tx_a).await.unwrap(); // (0,0)
    let room = reg.room(&s.id).unwrap();
    reg.join(&s, uid("b"), tx_b).await.unwrap(); // (1,0)
    let _ = recv(&mut rx_a).await; // drain b's user-join

    room.try_move(uid("b"), 0, 0).await.unwrap();

    assert_eq!(
        recv(&mut rx_a).await,
        ServerMessage::Movement {
            user_id: uid("b"),
            x: 0,
            y: 0,
        }
    );
}

#[tokio::test]
async fn test_broadcast_order_matches_commit_order() {
    let reg = registry();
    let s = space(10, 10);
    let (tx_a, _rx_a) = member();
    let (tx_b, mut rx_b) = member();

    let (room, _) = reg.join(&s, uid("a"), tx_a).await.unwrap();
    reg.join(&s, uid("b"), tx_b).await.unwrap();

    for y in 1..=3 {
        room.try_move(uid("a"), 0, y).await.unwrap();
    }

    for y in 1..=3u32 {
        assert_eq!(
            recv(&mut rx_b).await,
            ServerMessage::Movement {
                user_id: uid("a"),
                x: 0,
                y,
            }
        );
    }
}

#[tokio::test]
async fn test_movement_from_non_member_is_ignored() {
    let reg = registry();
    let s = space(10, 10);
    let (tx_a, mut rx_a) = member();

    let (room, _) = reg.join(&s, uid("a"), tx_a).await.unwrap();

    room.try_move(uid("ghost"), 1, 0).await.unwrap();
    settle().await;

    assert!(rx_a.try_recv().is_err());
    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.members, vec![uid("a")]);
}

// =========================================================================
// Leave and teardown
// =========================================================================

#[tokio::test]
async fn test_leave_broadcasts_user_left_exactly_once() {
    let reg = registry();
    let s = space(10, 10);
    let (tx_a, mut rx_a) = member();
    let (tx_b, _rx_b) = member();

    let (room, _) = reg.join(&s, uid("a"), tx_a).await.unwrap();
    reg.join(&s, uid("b"), tx_b).await.unwrap();
    let _ = recv(&mut rx_a).await; // drain b's user-join

    // Two leave requests race in from the disconnect paths.
    room.leave(uid("b")).await.unwrap();
    room.leave(uid("b")).await.unwrap();

    assert_eq!(
        recv(&mut rx_a).await,
        ServerMessage::UserLeft { user_id: uid("b") }
    );
    settle().await;
    assert!(rx_a.try_recv().is_err(), "user-left must fire exactly once");
}

#[tokio::test]
async fn test_membership_count_after_joins_and_leaves() {
    let reg = registry();
    let s = space(10, 10);

    let mut keep = Vec::new();
    let (room, _) = {
        let (tx, rx) = member();
        keep.push(rx);
        reg.join(&s, uid("u0"), tx).await.unwrap()
    };
    for name in ["u1", "u2", "u3"] {
        let (tx, rx) = member();
        keep.push(rx);
        reg.join(&s, uid(name), tx).await.unwrap();
    }

    room.leave(uid("u1")).await.unwrap();
    room.leave(uid("u3")).await.unwrap();

    let snapshot = room.snapshot().await.unwrap();
    let members: HashSet<UserId> = snapshot.members.into_iter().collect();
    assert_eq!(members, HashSet::from([uid("u0"), uid("u2")]));
}

#[tokio::test]
async fn test_empty_room_is_destroyed_and_rejoin_gets_fresh_instance() {
    let reg = registry();
    let s = space(10, 10);
    let (tx_a, _rx_a) = member();

    let (room, _) = reg.join(&s, uid("a"), tx_a).await.unwrap();
    let first = room.snapshot().await.unwrap().instance;

    room.leave(uid("a")).await.unwrap();
    settle().await;

    assert_eq!(reg.len(), 0, "empty room must leave the registry");

    let (tx_b, _rx_b) = member();
    let (room2, accept) = reg.join(&s, uid("b"), tx_b).await.unwrap();
    assert!(accept.users.is_empty(), "fresh room starts empty");
    assert_ne!(room2.snapshot().await.unwrap().instance, first);
}

#[tokio::test]
async fn test_dead_room_handle_answers_closed() {
    let reg = registry();
    let s = space(10, 10);
    let (tx_a, _rx_a) = member();

    let (room, _) = reg.join(&s, uid("a"), tx_a).await.unwrap();
    room.leave(uid("a")).await.unwrap();
    settle().await;

    let (tx_b, _rx_b) = member();
    let result = room.join(uid("b"), tx_b).await;
    assert!(matches!(result, Err(RoomError::Closed(_))));
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test]
async fn test_concurrent_first_joins_construct_one_room() {
    let reg = registry();
    let s = space(10, 10);

    let mut handles = Vec::new();
    for i in 0..8 {
        let reg = Arc::clone(&reg);
        let s = s.clone();
        handles.push(tokio::spawn(async move {
            let (tx, rx) = member();
            let result = reg.join(&s, uid(&format!("u{i}")), tx).await;
            (result, rx)
        }));
    }

    let mut receivers = Vec::new();
    for handle in handles {
        let (result, rx) = handle.await.unwrap();
        result.expect("every racer should join");
        receivers.push(rx);
    }

    assert_eq!(reg.len(), 1, "one room per space, even under a race");
    let room = reg.room(&s.id).unwrap();
    assert_eq!(room.snapshot().await.unwrap().members.len(), 8);
}

// =========================================================================
// Backpressure
// =========================================================================

#[tokio::test]
async fn test_member_with_overflowing_buffer_is_dropped() {
    let reg = RoomRegistry::new(RoomConfig {
        outbound_capacity: 1,
        ..RoomConfig::default()
    });
    let s = space(10, 10);
    let (tx_b, mut rx_b) = member();
    let (tx_a, mut rx_a) = member();

    // b joins first and never drains its buffer.
    reg.join(&s, uid("b"), tx_b).await.unwrap(); // (0,0)
    let (room, _) = reg.join(&s, uid("a"), tx_a).await.unwrap(); // (1,0)

    // b's capacity-1 buffer holds a's user-join; the next event for b
    // overflows it and b is dropped like a disconnect.
    room.try_move(uid("a"), 1, 1).await.unwrap();

    assert_eq!(
        recv(&mut rx_a).await,
        ServerMessage::UserLeft { user_id: uid("b") }
    );
    let snapshot = room.snapshot().await.unwrap();
    assert_eq!(snapshot.members, vec![uid("a")]);

    // b's channel still holds the event committed before the overflow,
    // then closes.
    assert!(matches!(
        recv(&mut rx_b).await,
        ServerMessage::UserJoin { .. }
    ));
    assert_eq!(rx_b.recv().await, None);
}
