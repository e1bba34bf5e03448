//! Connection sessions for Plaza.
//!
//! A *session* is the server's record of one authenticated connection
//! inside one room: who the user is, which space they are in, and the
//! handle their movements are forwarded through. The room — not the
//! session — is the source of truth for positions, so a session carries
//! identity and routing only.
//!
//! This crate also defines [`IdentityVerifier`], the capability the
//! gateway calls during the join handshake to turn a token into a
//! [`UserId`](plaza_proto::UserId).

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod session;

pub use auth::IdentityVerifier;
pub use error::SessionError;
pub use session::Session;
