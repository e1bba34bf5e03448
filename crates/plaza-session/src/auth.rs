//! Identity verification hook.
//!
//! Plaza does not implement authentication itself; tokens are minted and
//! validated by the account subsystem. The gateway is handed an
//! [`IdentityVerifier`] implementation and calls it once per join
//! handshake.

use plaza_proto::UserId;

use crate::SessionError;

/// Validates a client's join token and returns their identity.
///
/// # Example
///
/// ```rust
/// use plaza_proto::UserId;
/// use plaza_session::{IdentityVerifier, SessionError};
///
/// /// Treats any non-empty token as the user id. Development only.
/// struct DevVerifier;
///
/// impl IdentityVerifier for DevVerifier {
///     async fn verify(&self, token: &str) -> Result<UserId, SessionError> {
///         if token.is_empty() {
///             return Err(SessionError::AuthFailed("empty token".into()));
///         }
///         Ok(UserId::from(token))
///     }
/// }
/// ```
pub trait IdentityVerifier: Send + Sync + 'static {
    /// Validates the token presented in a join request.
    ///
    /// # Returns
    /// - `Ok(UserId)` — the verified identity
    /// - `Err(SessionError::AuthFailed)` — token invalid or expired
    fn verify(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserId, SessionError>> + Send;
}
