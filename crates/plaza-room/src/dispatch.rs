//! Fan-out of room events to member outbound buffers.
//!
//! Delivery uses `try_send` exclusively: the room actor never waits on a
//! member's buffer, so a slow peer cannot stall the mutation that
//! produced the event or delay delivery to anyone else. Per member, the
//! buffer preserves the order events were committed in.

use std::collections::HashMap;

use plaza_proto::{ServerMessage, UserId};
use tokio::sync::mpsc::error::TrySendError;

use crate::MemberSender;

/// Delivers `event` to every member except `exclude`.
///
/// Returns the members whose buffers were full (or whose receiving side
/// is gone). The caller decides what to do with them; the room drops
/// them like a disconnect.
pub(crate) fn fan_out(
    members: &HashMap<UserId, MemberSender>,
    event: &ServerMessage,
    exclude: Option<&UserId>,
) -> Vec<UserId> {
    let mut overflowed = Vec::new();
    for (user_id, sender) in members {
        if exclude == Some(user_id) {
            continue;
        }
        match sender.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                overflowed.push(user_id.clone());
            }
        }
    }
    overflowed
}

/// Delivers `event` to a single member.
///
/// Returns `false` only when the member exists but its buffer is full or
/// closed; an unknown member is not an error here.
pub(crate) fn send_to(
    members: &HashMap<UserId, MemberSender>,
    user_id: &UserId,
    event: ServerMessage,
) -> bool {
    match members.get(user_id) {
        Some(sender) => sender.try_send(event).is_ok(),
        None => true,
    }
}
