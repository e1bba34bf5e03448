//! Unified error type for the Plaza server.

use plaza_proto::ProtoError;
use plaza_room::RoomError;
use plaza_session::SessionError;
use plaza_space::SpaceError;
use plaza_transport::TransportError;

/// Top-level error that wraps all layer-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PlazaError {
    /// A transport-level error (accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Proto(#[from] ProtoError),

    /// A session-level error (authentication).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A space-lookup error (unknown space, catalog failure).
    #[error(transparent)]
    Space(#[from] SpaceError),

    /// A room-level error (full, duplicate identity, closed).
    #[error(transparent)]
    Room(#[from] RoomError),
}
