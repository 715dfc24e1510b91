//! Application state shared by every handler.

use accommodation_core::{AccommodationService, IdentityVerifier};
use std::fmt;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Domain service
    pub service: AccommodationService,
    /// Gate for protected routes
    pub verifier: Arc<dyn IdentityVerifier>,
    /// Deployment environment name, reported by `GET /`
    pub env: String,
}

impl AppState {
    /// Create the application state.
    #[must_use]
    pub fn new(
        service: AccommodationService,
        verifier: Arc<dyn IdentityVerifier>,
        env: impl Into<String>,
    ) -> Self {
        Self {
            service,
            verifier,
            env: env.into(),
        }
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("env", &self.env)
            .finish_non_exhaustive()
    }
}
