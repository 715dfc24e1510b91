//! Identity verifier with a fixed answer.

use accommodation_core::{CallerCredentials, IdentityError, IdentityVerifier};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
enum Answer {
    Allow,
    Deny,
    AllowToken(String),
    NotConfigured,
    Unreachable,
}

/// [`IdentityVerifier`] that answers without any I/O and counts its calls.
///
/// # Example
///
/// ```
/// use accommodation_testing::StaticIdentityVerifier;
/// use accommodation_core::{CallerCredentials, IdentityVerifier};
///
/// # async fn example() {
/// let verifier = StaticIdentityVerifier::allow_token("Bearer good");
/// let credentials = CallerCredentials {
///     authorization: "Bearer good".into(),
///     client_id: "web".into(),
/// };
/// assert!(verifier.verify(&credentials).await.unwrap_or(false));
/// assert_eq!(verifier.calls(), 1);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct StaticIdentityVerifier {
    answer: Answer,
    calls: Arc<AtomicUsize>,
}

impl StaticIdentityVerifier {
    fn with_answer(answer: Answer) -> Self {
        Self {
            answer,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Allow every caller.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::with_answer(Answer::Allow)
    }

    /// Deny every caller.
    #[must_use]
    pub fn deny_all() -> Self {
        Self::with_answer(Answer::Deny)
    }

    /// Allow only callers presenting exactly this `Authorization` value.
    #[must_use]
    pub fn allow_token(authorization: impl Into<String>) -> Self {
        Self::with_answer(Answer::AllowToken(authorization.into()))
    }

    /// Behave like a verifier without a configured identity service.
    #[must_use]
    pub fn not_configured() -> Self {
        Self::with_answer(Answer::NotConfigured)
    }

    /// Behave like a verifier whose identity service is down.
    #[must_use]
    pub fn unreachable() -> Self {
        Self::with_answer(Answer::Unreachable)
    }

    /// Number of `verify` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl IdentityVerifier for StaticIdentityVerifier {
    fn verify<'a>(
        &'a self,
        credentials: &'a CallerCredentials,
    ) -> Pin<Box<dyn Future<Output = Result<bool, IdentityError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.answer {
                Answer::Allow => Ok(true),
                Answer::Deny => Ok(false),
                Answer::AllowToken(token) => Ok(credentials.authorization == *token),
                Answer::NotConfigured => Err(IdentityError::NotConfigured),
                Answer::Unreachable => Err(IdentityError::Unreachable(
                    "connection refused".to_string(),
                )),
            }
        })
    }
}
