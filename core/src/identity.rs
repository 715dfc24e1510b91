//! Caller verification against an external identity service.
//!
//! The service does not authenticate anyone itself. Each request carries a
//! bearer token and a client identifier which are handed to an
//! [`IdentityVerifier`]; the verifier answers allow or deny.
//!
//! # Implementations
//!
//! - `HttpIdentityVerifier` (in `accommodation-server`): calls the identity service over HTTP
//! - `StaticIdentityVerifier` (in `accommodation-testing`): fixed answer for tests

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Credentials presented by the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct CallerCredentials {
    /// Raw `Authorization` header value
    pub authorization: String,
    /// Raw `X-Client-Id` header value
    pub client_id: String,
}

impl std::fmt::Debug for CallerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallerCredentials")
            .field("authorization", &"<redacted>")
            .field("client_id", &self.client_id)
            .finish()
    }
}

/// Errors raised while trying to verify a caller.
///
/// A *denied* caller is not an error: it is `Ok(false)`.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// No identity service URL was configured.
    #[error("identity service is not configured")]
    NotConfigured,

    /// The identity service could not be reached.
    #[error("identity service unreachable: {0}")]
    Unreachable(String),
}

/// Verifies callers against an identity provider.
///
/// Uses explicit `Pin<Box<dyn Future>>` returns so the verifier can be held
/// as `Arc<dyn IdentityVerifier>` in application state.
pub trait IdentityVerifier: Send + Sync {
    /// Returns `Ok(true)` when the caller is allowed.
    ///
    /// # Errors
    ///
    /// - `NotConfigured`: the verifier has nowhere to send the request
    /// - `Unreachable`: transport failure talking to the identity service
    fn verify<'a>(
        &'a self,
        credentials: &'a CallerCredentials,
    ) -> Pin<Box<dyn Future<Output = Result<bool, IdentityError>> + Send + 'a>>;
}
