//! HTTP client for the identity service.

use accommodation_core::{CallerCredentials, IdentityError, IdentityVerifier};
use accommodation_web::CLIENT_ID_HEADER;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Path of the "who am I" endpoint, relative to the configured base URL.
const ME_PATH: &str = "api/v2/me/";

/// [`IdentityVerifier`] that asks the identity service's `me` endpoint.
///
/// The caller's `Authorization` and `X-Client-Id` headers are forwarded
/// unchanged. A 200 answer allows the caller; any other status denies it.
#[derive(Debug, Clone)]
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    url: Option<String>,
}

impl HttpIdentityVerifier {
    /// Create a verifier for the identity service at `base_url`.
    ///
    /// With no URL every verification fails with
    /// [`IdentityError::NotConfigured`].
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: Option<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: base_url.map(|url| me_url(&url)),
        })
    }

    /// Whether an identity service URL is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

fn me_url(base_url: &str) -> String {
    if base_url.ends_with('/') {
        format!("{base_url}{ME_PATH}")
    } else {
        format!("{base_url}/{ME_PATH}")
    }
}

impl IdentityVerifier for HttpIdentityVerifier {
    fn verify<'a>(
        &'a self,
        credentials: &'a CallerCredentials,
    ) -> Pin<Box<dyn Future<Output = Result<bool, IdentityError>> + Send + 'a>> {
        Box::pin(async move {
            let Some(url) = &self.url else {
                return Err(IdentityError::NotConfigured);
            };

            let response = self
                .client
                .get(url)
                .header(AUTHORIZATION, &credentials.authorization)
                .header(CLIENT_ID_HEADER, &credentials.client_id)
                .header(CONTENT_TYPE, "application/json")
                .send()
                .await
                .map_err(|e| {
                    tracing::warn!(error = %e, "Identity service request failed");
                    IdentityError::Unreachable(e.to_string())
                })?;

            let status = response.status();
            if status != StatusCode::OK {
                tracing::debug!(status = status.as_u16(), client_id = %credentials.client_id, "Identity service denied caller");
            }
            Ok(status == StatusCode::OK)
        })
    }
}
