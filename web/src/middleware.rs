//! Request middleware.
//!
//! - [`correlation_id_layer`]: tags every request with a [`CorrelationId`],
//!   runs it inside an `http_request` span and echoes the id back in the
//!   `X-Correlation-ID` response header
//! - [`require_identity`]: asks the [`IdentityVerifier`](accommodation_core::IdentityVerifier)
//!   in [`AppState`] whether the caller may proceed

use crate::error::AppError;
use crate::extractors::{Caller, CorrelationId};
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Create the correlation id layer.
///
/// # Example
///
/// ```ignore
/// let app = Router::new()
///     .route("/dorms/", get(list_dorms))
///     .layer(correlation_id_layer());
/// ```
#[must_use]
pub const fn correlation_id_layer() -> CorrelationIdLayer {
    CorrelationIdLayer
}

/// Layer for correlation ID tracking.
#[derive(Clone, Copy, Debug)]
pub struct CorrelationIdLayer;

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdMiddleware { inner }
    }
}

/// Middleware service for correlation ID tracking.
#[derive(Clone, Debug)]
pub struct CorrelationIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for CorrelationIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = CorrelationId::from_headers(req.headers());
        req.extensions_mut().insert(correlation_id);

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );
        let started = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = fut.await?;
                tracing::debug!(
                    status = response.status().as_u16(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Request finished"
                );

                if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
                    response.headers_mut().insert(CORRELATION_ID_HEADER, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}

/// Identity gate for protected routes.
///
/// Missing credentials and a denied caller answer 401; verifier failures
/// answer 500 (not configured) or 503 (unreachable). The identity service is
/// not called when the headers are missing.
///
/// # Errors
///
/// Returns the [`AppError`] that becomes the response.
pub async fn require_identity(
    State(state): State<AppState>,
    Caller(credentials): Caller,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.verifier.verify(&credentials).await? {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(client_id = %credentials.client_id, "Caller rejected by identity service");
        Err(AppError::unauthorized())
    }
}
