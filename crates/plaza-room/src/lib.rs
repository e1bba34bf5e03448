//! Room lifecycle for Plaza.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns one
//! space's live membership and position table. All mutating operations on
//! a room — join, move, leave — flow through its mailbox and are processed
//! one at a time, so broadcasts observed by any member match the commit
//! order of the underlying state changes. Different rooms share nothing
//! and run fully in parallel.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — space-keyed table of live rooms; creates lazily,
//!   drops entries when a room empties
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomConfig`] — mailbox/buffer sizing and movement policy

mod config;
mod dispatch;
mod error;
mod registry;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{JoinAccept, MemberSender, RoomHandle, RoomSnapshot};
