//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: the request's correlation id
//! - [`Caller`]: the credentials to hand to the identity service
//! - [`JsonBody`]: a JSON body whose rejections render as [`AppError`]

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use accommodation_core::CallerCredentials;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use serde::de::DeserializeOwned;
use std::fmt;
use uuid::Uuid;

/// Header carrying the caller's client identifier.
pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

/// Correlation ID for request tracing.
///
/// Taken from the request extensions when the correlation middleware ran,
/// otherwise from the `X-Correlation-ID` header, otherwise freshly generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationId(pub Uuid);

impl CorrelationId {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Self {
        Self(
            headers
                .get(CORRELATION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| Uuid::parse_str(s).ok())
                .unwrap_or_else(Uuid::new_v4),
        )
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Self>()
            .copied()
            .unwrap_or_else(|| Self::from_headers(&parts.headers)))
    }
}

/// Caller credentials from the `Authorization` and `X-Client-Id` headers.
///
/// Rejects with 401 when either header is missing or not valid text.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerCredentials);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.trim().is_empty())
                .map(str::to_string)
        };

        let (Some(authorization), Some(client_id)) =
            (header(AUTHORIZATION.as_str()), header(CLIENT_ID_HEADER))
        else {
            return Err(AppError::unauthorized());
        };

        Ok(Self(CallerCredentials {
            authorization,
            client_id,
        }))
    }
}

/// JSON request body.
///
/// Same as [`Json`] except that malformed bodies, unknown fields and a
/// missing content type all answer 400 with the usual error body.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;

    fn request_parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).expect("Valid request").into_parts().0
    }

    #[tokio::test]
    async fn test_correlation_id_from_header() {
        let uuid = Uuid::new_v4();
        let mut parts = request_parts(axum::http::Request::builder().header(CORRELATION_ID_HEADER, uuid.to_string()));

        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(correlation_id.0, uuid);
    }

    #[tokio::test]
    async fn test_correlation_id_prefers_extension() {
        let stored = CorrelationId(Uuid::new_v4());
        let mut parts = request_parts(
            axum::http::Request::builder().header(CORRELATION_ID_HEADER, Uuid::new_v4().to_string()),
        );
        parts.extensions.insert(stored);

        let correlation_id = CorrelationId::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(correlation_id, stored);
    }

    #[tokio::test]
    async fn test_caller_requires_both_headers() {
        let mut parts = request_parts(
            axum::http::Request::builder()
                .header(AUTHORIZATION, "Bearer token")
                .header(CLIENT_ID_HEADER, "web"),
        );
        let Caller(credentials) = Caller::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(credentials.authorization, "Bearer token");
        assert_eq!(credentials.client_id, "web");

        let mut parts = request_parts(axum::http::Request::builder().header(AUTHORIZATION, "Bearer token"));
        let err = Caller::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_json_body_rejection_is_bad_request() {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Payload {
            pnr: String,
        }

        let req = axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(Body::from("{\"pnr\": 1}"))
            .unwrap();
        let err = JsonBody::<Payload>::from_request(req, &()).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
