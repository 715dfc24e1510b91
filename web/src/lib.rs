//! Axum HTTP layer for the accommodation service.
//!
//! Handlers are thin: extract, call [`AccommodationService`](accommodation_core::AccommodationService),
//! map the result. Domain errors become HTTP responses through [`AppError`].
//!
//! # Request Flow
//!
//! 1. [`correlation_id_layer`] tags the request and opens its span
//! 2. [`require_identity`](middleware::require_identity) verifies the caller
//!    on protected routes
//! 3. The handler extracts path, query and [`JsonBody`] input
//! 4. The service runs the operation in one store transaction
//! 5. The result (or [`AppError`]) is serialized as JSON
//!
//! # Example
//!
//! ```ignore
//! use accommodation_web::{AppState, build_router};
//!
//! let app = build_router(AppState::new(service, verifier, "production"));
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::AppError;
pub use extractors::{CLIENT_ID_HEADER, Caller, CorrelationId, JsonBody};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::build_router;
pub use state::AppState;
