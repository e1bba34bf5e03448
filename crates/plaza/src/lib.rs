//! # Plaza
//!
//! Real-time space presence and movement synchronization.
//!
//! Plaza runs the live side of a virtual-space application: clients hold
//! a persistent WebSocket connection, join one space, walk around a
//! shared grid, and see each other's movements as ordered broadcasts.
//! Account and catalog data stay in their own subsystem; Plaza consumes
//! them through two injected read-only capabilities — an
//! [`IdentityVerifier`](plaza_session::IdentityVerifier) for tokens and
//! a [`SpaceDirectory`](plaza_space::SpaceDirectory) for space metadata.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use plaza::prelude::*;
//!
//! // Implement IdentityVerifier and SpaceDirectory, then:
//! // let server = PlazaServerBuilder::new()
//! //     .bind("0.0.0.0:8080")
//! //     .build(my_verifier, my_directory)
//! //     .await?;
//! // server.run().await
//! ```

mod error;
mod handler;
mod server;

pub use error::PlazaError;
pub use server::{GatewayConfig, PlazaServer, PlazaServerBuilder};

/// Common imports for building and running a Plaza server.
pub mod prelude {
    pub use crate::{
        GatewayConfig, PlazaError, PlazaServer, PlazaServerBuilder,
    };
    pub use plaza_proto::{
        ClientMessage, Codec, JsonCodec, Position, ServerMessage, SpaceId,
        UserId, UserSummary,
    };
    pub use plaza_room::{RoomConfig, RoomRegistry};
    pub use plaza_session::{IdentityVerifier, Session, SessionError};
    pub use plaza_space::{
        MoveRules, SpaceDirectory, SpaceError, SpaceSnapshot,
    };
}
