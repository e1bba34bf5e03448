//! Wire protocol for Plaza.
//!
//! This crate defines the messages that travel between a client and the
//! presence server, and how they are framed:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Position`], the
//!   identifier newtypes) — the structures on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from text frames.
//! - **Errors** ([`ProtoError`]) — what can go wrong while encoding or
//!   decoding.
//!
//! The protocol layer sits between transport (raw frames) and the rooms.
//! It knows nothing about connections, sessions, or room state.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtoError;
pub use types::{
    ClientMessage, Position, ServerMessage, SpaceId, UserId, UserSummary,
};
