//! Bearer token sources.
//!
//! Requests carry `Authorization: Bearer {token}`. The token is either handed
//! in directly or minted through the OAuth2 JWT-bearer grant from a
//! service-account key file, then cached until shortly before it expires.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{ApiError, ApiResult};

/// OAuth scope granting access to the task-queue API.
pub const CLOUD_TASKS_SCOPE: &str = "https://www.googleapis.com/auth/cloud-tasks";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Supplies the bearer token attached to each request.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Return a currently valid access token.
    async fn access_token(&self) -> ApiResult<String>;
}

/// Token supplied verbatim by the caller.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    /// Wrap a pre-issued access token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> ApiResult<String> {
        Ok(self.token.clone())
    }
}

/// Subset of a service-account JSON key used for the token grant.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Service account identity, used as the assertion issuer.
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key: String,
    /// Key identifier placed in the assertion header.
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// Token endpoint.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Load a key from a JSON key file.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::CredentialsRead`] when the file cannot be read and
    /// [`ApiError::CredentialsInvalid`] when it is not a service-account key.
    pub fn from_file(path: &Path) -> ApiResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ApiError::CredentialsRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|err| ApiError::CredentialsInvalid {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Token source backed by a service-account key.
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    scope: String,
    client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    /// Build a token source from an already parsed key.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Signing`] when the private key is not valid RSA PEM.
    pub fn new(key: ServiceAccountKey, client: Client) -> ApiResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|source| ApiError::Signing { source })?;
        Ok(Self {
            key,
            encoding_key,
            scope: CLOUD_TASKS_SCOPE.to_string(),
            client,
            cached: Mutex::new(None),
        })
    }

    /// Build a token source from a JSON key file.
    ///
    /// # Errors
    ///
    /// Returns a credentials error naming `path` when the file is missing,
    /// malformed or carries an unusable private key.
    pub fn from_file(path: &Path, client: Client) -> ApiResult<Self> {
        let key = ServiceAccountKey::from_file(path)?;
        Self::new(key, client).map_err(|err| match err {
            ApiError::Signing { source } => ApiError::CredentialsInvalid {
                path: PathBuf::from(path),
                reason: format!("private key is not valid RSA PEM: {source}"),
            },
            other => other,
        })
    }

    /// Identity the tokens are issued for.
    #[must_use]
    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn assertion(&self, issued_at: u64) -> ApiResult<String> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.key.token_uri,
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME_SECS,
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid.clone_from(&self.key.private_key_id);
        jsonwebtoken::encode(&header, &claims, &self.encoding_key)
            .map_err(|source| ApiError::Signing { source })
    }

    async fn exchange(&self) -> ApiResult<CachedToken> {
        tracing::debug!(client_email = %self.key.client_email, "requesting access token");
        let assertion = self.assertion(unix_now_secs())?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|err| ApiError::TokenExchange {
                message: err.to_string(),
            })?;

        let status = response.status();
        let bytes = response.bytes().await.unwrap_or_default();
        if !status.is_success() {
            let message = serde_json::from_slice::<TokenErrorResponse>(&bytes).map_or_else(
                |_| format!("status {status}"),
                |body| match body.error_description {
                    Some(description) => format!("{}: {description}", body.error),
                    None => body.error,
                },
            );
            return Err(ApiError::TokenExchange { message });
        }

        let token: TokenResponse =
            serde_json::from_slice(&bytes).map_err(|err| ApiError::TokenExchange {
                message: format!("malformed token response: {err}"),
            })?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS));
        Ok(CachedToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(REFRESH_MARGIN),
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> ApiResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }
        let token = self.exchange().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }
}

fn unix_now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use jsonwebtoken::{DecodingKey, Validation};
    use serde_json::json;
    use std::io::Write;

    const TEST_KEY: &str = include_str!("../testdata/rsa_test_key.pem");

    fn key_for(token_uri: String) -> ServiceAccountKey {
        ServiceAccountKey {
            client_email: "robot@example.iam.gserviceaccount.com".into(),
            private_key: TEST_KEY.into(),
            private_key_id: Some("kid-1".into()),
            token_uri,
        }
    }

    #[tokio::test]
    async fn static_source_returns_token() {
        let source = StaticTokenSource::new("abc");
        assert_eq!(source.access_token().await.expect("token"), "abc");
    }

    #[test]
    fn key_file_defaults_token_uri() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let body = json!({
            "type": "service_account",
            "client_email": "robot@example.iam.gserviceaccount.com",
            "private_key": TEST_KEY,
        });
        file.write_all(body.to_string().as_bytes())
            .expect("write key");

        let key = ServiceAccountKey::from_file(file.path()).expect("key loads");
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
        assert!(key.private_key_id.is_none());
    }

    #[test]
    fn missing_key_file_is_reported() {
        let err = ServiceAccountKey::from_file(Path::new("/definitely/missing.json"))
            .expect_err("missing file should fail");
        assert!(matches!(err, ApiError::CredentialsRead { .. }));
        assert!(err.to_string().contains("/definitely/missing.json"));
    }

    #[test]
    fn garbage_private_key_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        let body = json!({
            "client_email": "robot@example.iam.gserviceaccount.com",
            "private_key": "not a key",
        });
        file.write_all(body.to_string().as_bytes())
            .expect("write key");

        let result = ServiceAccountTokenSource::from_file(file.path(), Client::new());
        assert!(matches!(result, Err(ApiError::CredentialsInvalid { .. })));
    }

    #[test]
    fn assertion_carries_expected_claims() {
        let source = ServiceAccountTokenSource::new(
            key_for("https://oauth2.example/token".into()),
            Client::new(),
        )
        .expect("source builds");

        let jwt = source.assertion(1_700_000_000).expect("assertion signs");
        let header = jsonwebtoken::decode_header(&jwt).expect("header decodes");
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some("kid-1"));

        let mut validation = Validation::new(Algorithm::RS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.set_audience(&["https://oauth2.example/token"]);
        let decoded = jsonwebtoken::decode::<serde_json::Value>(
            &jwt,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .expect("claims decode");
        assert_eq!(
            decoded.claims["iss"],
            "robot@example.iam.gserviceaccount.com"
        );
        assert_eq!(decoded.claims["scope"], CLOUD_TASKS_SCOPE);
        assert_eq!(decoded.claims["exp"], 1_700_003_600_u64);
    }

    #[tokio::test]
    async fn token_is_exchanged_once_and_cached() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/token")
                .header("content-type", "application/x-www-form-urlencoded");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"access_token": "ya29.token", "expires_in": 3599, "token_type": "Bearer"}));
        });

        let source = ServiceAccountTokenSource::new(key_for(server.url("/token")), Client::new())
            .expect("source builds");

        assert_eq!(source.access_token().await.expect("token"), "ya29.token");
        assert_eq!(source.access_token().await.expect("token"), "ya29.token");
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn token_endpoint_errors_surface_description() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(400)
                .header("content-type", "application/json")
                .json_body(json!({"error": "invalid_grant", "error_description": "Invalid JWT Signature."}));
        });

        let source = ServiceAccountTokenSource::new(key_for(server.url("/token")), Client::new())
            .expect("source builds");

        let err = source.access_token().await.expect_err("exchange should fail");
        assert_eq!(
            err.to_string(),
            "token exchange failed: invalid_grant: Invalid JWT Signature."
        );
    }
}
