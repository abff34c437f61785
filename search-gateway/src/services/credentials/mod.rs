//! Bearer-token acquisition for the search provider.
//!
//! A [`TokenProvider`] walks an ordered list of [`CredentialSource`]s and
//! returns the first token produced. The production chain is the local
//! `gcloud` CLI followed by a service-account key exchange. Tokens are not
//! cached: every call runs the chain again.

pub mod gcloud;
pub mod mock;
pub mod service_account;

use crate::config::CredentialConfig;
use crate::services::metrics;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;

pub use gcloud::GcloudCliSource;
pub use mock::MockCredentialSource;
pub use service_account::{ServiceAccountKey, ServiceAccountSource};

/// Failure of a single credential source.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Credential source not configured: {0}")]
    NotConfigured(String),

    #[error("Credential command failed: {0}")]
    Command(String),

    #[error("Credential command produced no token: {0}")]
    EmptyToken(String),

    #[error("Invalid service account key: {0}")]
    InvalidKey(String),

    #[error("Failed to sign token assertion: {0}")]
    Signing(String),

    #[error("Token exchange failed: {0}")]
    Exchange(String),
}

/// Failure of the whole chain.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No credential sources configured")]
    NoSources,

    #[error("All credential sources failed; last attempt via {strategy}: {last}")]
    Exhausted {
        strategy: &'static str,
        last: CredentialError,
        /// One entry per failed source, in attempt order.
        failures: Vec<String>,
    },
}

/// A strategy able to produce a bearer token.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Produce a fresh access token.
    async fn fetch_token(&self) -> Result<String, CredentialError>;
}

/// Ordered credential fallback chain.
#[derive(Clone)]
pub struct TokenProvider {
    sources: Vec<Arc<dyn CredentialSource>>,
}

impl TokenProvider {
    pub fn new(sources: Vec<Arc<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Production chain: ambient CLI credential, then the service account.
    pub fn from_config(config: &CredentialConfig, client: Client) -> Self {
        Self::new(vec![
            Arc::new(GcloudCliSource::new(&config.gcloud_command)),
            Arc::new(ServiceAccountSource::new(
                config.service_account_json.clone(),
                client,
            )),
        ])
    }

    /// Run the chain once and return the first token obtained.
    ///
    /// Each source is attempted at most once per call.
    pub async fn acquire_token(&self) -> Result<String, AuthError> {
        let mut failures = Vec::new();
        let mut last = None;

        for source in &self.sources {
            match source.fetch_token().await {
                Ok(token) => {
                    tracing::debug!(strategy = source.name(), "Acquired access token");
                    metrics::record_credential_attempt(source.name(), "success");
                    return Ok(token);
                }
                Err(e) => {
                    tracing::warn!(
                        strategy = source.name(),
                        error = %e,
                        "Credential source failed"
                    );
                    metrics::record_credential_attempt(source.name(), "failure");
                    failures.push(format!("{}: {}", source.name(), e));
                    last = Some((source.name(), e));
                }
            }
        }

        match last {
            Some((strategy, last)) => {
                tracing::error!(
                    strategy,
                    attempts = failures.len(),
                    "All credential sources failed"
                );
                Err(AuthError::Exhausted {
                    strategy,
                    last,
                    failures,
                })
            }
            None => Err(AuthError::NoSources),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let primary = Arc::new(MockCredentialSource::new(true));
        let secondary = Arc::new(MockCredentialSource::new(true));
        let provider = TokenProvider::new(vec![primary.clone(), secondary.clone()]);

        let token = provider.acquire_token().await.unwrap();

        assert_eq!(token, "mock-access-token");
        assert_eq!(primary.attempt_count(), 1);
        assert_eq!(secondary.attempt_count(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_once_to_secondary() {
        let primary = Arc::new(MockCredentialSource::new(false));
        let secondary = Arc::new(MockCredentialSource::with_token("secondary-token"));
        let provider = TokenProvider::new(vec![primary.clone(), secondary.clone()]);

        let token = provider.acquire_token().await.unwrap();

        assert_eq!(token, "secondary-token");
        assert_eq!(primary.attempt_count(), 1);
        assert_eq!(secondary.attempt_count(), 1);
    }

    #[tokio::test]
    async fn test_both_failing_yields_single_error() {
        let primary = Arc::new(MockCredentialSource::new(false));
        let secondary = Arc::new(MockCredentialSource::new(false));
        let provider = TokenProvider::new(vec![primary.clone(), secondary.clone()]);

        let err = provider.acquire_token().await.unwrap_err();

        match err {
            AuthError::Exhausted { failures, .. } => assert_eq!(failures.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(primary.attempt_count(), 1);
        assert_eq!(secondary.attempt_count(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_cli_falls_through_once() {
        let cli: Arc<dyn CredentialSource> =
            Arc::new(GcloudCliSource::with_args("sh", &["-c", "exit 1"]));
        let secondary = Arc::new(MockCredentialSource::with_token("secondary-token"));
        let provider = TokenProvider::new(vec![cli, secondary.clone()]);

        let token = provider.acquire_token().await.unwrap();

        assert_eq!(token, "secondary-token");
        assert_eq!(secondary.attempt_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_chain_reports_no_sources() {
        let provider = TokenProvider::new(Vec::new());
        assert!(matches!(
            provider.acquire_token().await,
            Err(AuthError::NoSources)
        ));
    }

    #[tokio::test]
    async fn test_each_call_reacquires() {
        let source = Arc::new(MockCredentialSource::new(true));
        let provider = TokenProvider::new(vec![source.clone()]);

        provider.acquire_token().await.unwrap();
        provider.acquire_token().await.unwrap();

        assert_eq!(source.attempt_count(), 2);
    }
}
