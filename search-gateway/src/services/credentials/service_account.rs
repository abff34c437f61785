//! Service-account credential via the OAuth2 JWT-bearer grant.

use super::{CredentialError, CredentialSource};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;

/// Scope requested for provider calls.
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the signed assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Fields of a service-account key file used for the exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Remove one layer of matching surrounding quotes.
///
/// Key documents pasted into `.env` files often arrive as `'{...}'`.
pub fn strip_wrapping_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

impl ServiceAccountKey {
    /// Parse a key document as found in configuration.
    pub fn parse(raw: &str) -> Result<Self, CredentialError> {
        let document = strip_wrapping_quotes(raw);
        serde_json::from_str(document).map_err(|e| CredentialError::InvalidKey(e.to_string()))
    }

    /// Sign the JWT assertion presented to the token endpoint.
    pub fn build_assertion(&self, scope: &str) -> Result<String, CredentialError> {
        let now = Utc::now();
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: scope.to_string(),
            aud: self.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ASSERTION_LIFETIME_SECS)).timestamp(),
        };

        let header = Header {
            kid: self.private_key_id.clone(),
            ..Header::new(Algorithm::RS256)
        };

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| CredentialError::InvalidKey(format!("private key: {}", e)))?;

        encode(&header, &claims, &key).map_err(|e| CredentialError::Signing(e.to_string()))
    }
}

/// Exchanges a configured service-account key for an access token.
pub struct ServiceAccountSource {
    key_document: Option<Secret<String>>,
    client: Client,
    scope: String,
}

impl ServiceAccountSource {
    pub fn new(key_document: Option<Secret<String>>, client: Client) -> Self {
        Self {
            key_document,
            client,
            scope: CLOUD_PLATFORM_SCOPE.to_string(),
        }
    }

    async fn exchange(&self, key: &ServiceAccountKey) -> Result<String, CredentialError> {
        let assertion = key.build_assertion(&self.scope)?;

        let response = self
            .client
            .traced_post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| CredentialError::Exchange(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Exchange(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::Exchange(format!("invalid response: {}", e)))?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CredentialError::Exchange("response contained no access token".to_string()))
    }
}

#[async_trait]
impl CredentialSource for ServiceAccountSource {
    fn name(&self) -> &'static str {
        "service-account"
    }

    async fn fetch_token(&self) -> Result<String, CredentialError> {
        let document = self.key_document.as_ref().ok_or_else(|| {
            CredentialError::NotConfigured("GOOGLE_SERVICE_ACCOUNT_JSON is not set".to_string())
        })?;

        let key = ServiceAccountKey::parse(document.expose_secret())?;

        tracing::debug!(
            client_email = %key.client_email,
            token_uri = %key.token_uri,
            "Exchanging service account assertion"
        );

        self.exchange(&key).await
    }
}
