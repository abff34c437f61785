//! Mock credential source for testing.

use super::{CredentialError, CredentialSource};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct MockCredentialSource {
    token: Option<String>,
    attempts: AtomicU64,
}

impl MockCredentialSource {
    /// An enabled mock returns `mock-access-token`; a disabled one always fails.
    pub fn new(enabled: bool) -> Self {
        Self {
            token: enabled.then(|| "mock-access-token".to_string()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn attempt_count(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialSource for MockCredentialSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_token(&self) -> Result<String, CredentialError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        self.token.clone().ok_or_else(|| {
            CredentialError::NotConfigured("Mock credential source not enabled".to_string())
        })
    }
}
