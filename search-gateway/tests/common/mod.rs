#![allow(dead_code)]

use search_gateway::config::{
    CredentialConfig, DiscoveryEngineConfig, GatewayConfig, SearchSettings,
    DEFAULT_DISCOVERY_ENGINE_BASE_URL,
};
use search_gateway::services::credentials::{CredentialSource, MockCredentialSource};
use search_gateway::services::metrics::init_metrics;
use search_gateway::services::providers::MockSearchProvider;
use search_gateway::services::{SearchProvider, TokenProvider};
use search_gateway::startup::Application;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub provider: Arc<MockSearchProvider>,
    pub credentials: Arc<MockCredentialSource>,
}

pub fn test_config() -> GatewayConfig {
    GatewayConfig {
        common: CoreConfig { port: 0 },
        discovery: DiscoveryEngineConfig {
            base_url: DEFAULT_DISCOVERY_ENGINE_BASE_URL.to_string(),
            project_id: Some("test-project".to_string()),
            location: Some("global".to_string()),
            collection_id: Some("default_collection".to_string()),
            engine_id: Some("test-engine".to_string()),
            serving_config_id: Some("default_search".to_string()),
            timeout_secs: 5,
        },
        search: SearchSettings {
            language_code: Some("tr-TR".to_string()),
            time_zone: Some("Europe/Istanbul".to_string()),
            preamble: None,
        },
        credentials: CredentialConfig {
            gcloud_command: "gcloud".to_string(),
            service_account_json: None,
        },
    }
}

impl TestApp {
    /// Spawn with working mock credentials and provider.
    pub async fn spawn() -> Self {
        Self::spawn_with_mocks(true, true).await
    }

    pub async fn spawn_with_mocks(credentials_ok: bool, provider_ok: bool) -> Self {
        let provider = Arc::new(MockSearchProvider::new(provider_ok));
        let credentials = Arc::new(MockCredentialSource::new(credentials_ok));

        let address = spawn_server(test_config(), credentials.clone(), provider.clone()).await;

        TestApp {
            port: address
                .rsplit(':')
                .next()
                .and_then(|p| p.parse().ok())
                .unwrap_or_default(),
            address,
            client: reqwest::Client::new(),
            provider,
            credentials,
        }
    }

    pub async fn post_search(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/search", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_session(&self, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}/session", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// Start the application around the given credential source and provider
/// and return its base URL once `/health` answers.
pub async fn spawn_server(
    config: GatewayConfig,
    credentials: Arc<dyn CredentialSource>,
    provider: Arc<dyn SearchProvider>,
) -> String {
    init_metrics();

    let app = Application::build_with(config, TokenProvider::new(vec![credentials]), provider)
        .await
        .expect("Failed to build test application");

    let port = app.http_port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        app.run_until_stopped().await.ok();
    });

    // Wait for HTTP server to be ready by polling health endpoint
    let client = reqwest::Client::new();
    let health_url = format!("{}/health", address);
    for _ in 0..50 {
        if client.get(&health_url).send().await.is_ok() {
            break;
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    address
}
