//! Error types for the session layer.

/// Errors that can occur while establishing a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The token was invalid, expired, or rejected by the
    /// [`IdentityVerifier`](crate::IdentityVerifier) — or the verifier
    /// could not answer in time, which is treated the same way.
    #[error("authentication failed: {0}")]
    AuthFailed(String),
}
