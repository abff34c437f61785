use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// Default Discovery Engine REST root.
pub const DEFAULT_DISCOVERY_ENGINE_BASE_URL: &str = "https://discoveryengine.googleapis.com/v1alpha";

/// Default timeout for provider calls, in seconds.
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub discovery: DiscoveryEngineConfig,
    pub search: SearchSettings,
    pub credentials: CredentialConfig,
}

/// Identifiers of the remote engine.
///
/// Identifiers are optional at load time: a missing one fails the dispatch
/// that needs it instead of being replaced with a guessed default.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryEngineConfig {
    pub base_url: String,
    pub project_id: Option<String>,
    pub location: Option<String>,
    pub collection_id: Option<String>,
    pub engine_id: Option<String>,
    pub serving_config_id: Option<String>,
    pub timeout_secs: u64,
}

/// Content-shaping parameters sent with every search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchSettings {
    pub language_code: Option<String>,
    pub time_zone: Option<String>,
    pub preamble: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialConfig {
    /// Executable used for `auth print-access-token`.
    pub gcloud_command: String,
    /// Service-account key document, possibly wrapped in one layer of quotes.
    pub service_account_json: Option<Secret<String>>,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(GatewayConfig {
            common: common_config,
            discovery: DiscoveryEngineConfig {
                base_url: get_env(
                    "DISCOVERY_ENGINE_BASE_URL",
                    Some(DEFAULT_DISCOVERY_ENGINE_BASE_URL),
                    false,
                )?,
                project_id: optional_env("PROJECT_ID"),
                location: optional_env("LOCATION"),
                collection_id: optional_env("COLLECTION_ID"),
                engine_id: optional_env("ENGINE_ID"),
                serving_config_id: optional_env("SERVING_CONFIG_ID"),
                timeout_secs: parse_timeout_secs(&get_env(
                    "PROVIDER_TIMEOUT_SECS",
                    Some(&DEFAULT_PROVIDER_TIMEOUT_SECS.to_string()),
                    is_prod,
                )?)?,
            },
            search: SearchSettings {
                language_code: optional_env("LANGUAGE_CODE"),
                time_zone: optional_env("TIME_ZONE"),
                preamble: optional_env("PREAMBLE"),
            },
            credentials: CredentialConfig {
                gcloud_command: get_env("GCLOUD_COMMAND", Some("gcloud"), false)?,
                service_account_json: optional_env("GOOGLE_SERVICE_ACCOUNT_JSON").map(Secret::new),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_timeout_secs(raw: &str) -> Result<u64, AppError> {
    raw.trim().parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(
            "PROVIDER_TIMEOUT_SECS must be a whole number of seconds, got {:?}: {}",
            raw,
            e
        ))
    })
}

/// Read a variable, treating an empty value as unset.
fn optional_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
