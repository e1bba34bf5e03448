//! Room runtime configuration.

use plaza_space::MoveRules;

/// Configuration applied to every room a registry creates.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Capacity of a room actor's command mailbox. Senders wait when it
    /// is full (bounded channel).
    pub mailbox_capacity: usize,

    /// Capacity of each member's outbound event buffer. The room never
    /// waits on these: a member whose buffer overflows is dropped from
    /// the room like a disconnect.
    pub outbound_capacity: usize,

    /// Movement policy (occupancy rule).
    pub rules: MoveRules,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
            outbound_capacity: 32,
            rules: MoveRules::default(),
        }
    }
}
