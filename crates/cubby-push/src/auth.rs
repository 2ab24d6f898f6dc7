//! OAuth2 access tokens for the FCM HTTP v1 API.
//!
//! A service account key signs an RS256 JWT grant which is exchanged at
//! the key's `token_uri` for a short-lived bearer token. [`TokenCache`]
//! keeps the current token and mints a new one shortly before expiry.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use cubby_core::error::{AppError, ErrorKind};
use cubby_core::result::AppResult;

/// OAuth2 scope for sending FCM messages.
pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Google's OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the signed grant.
const ASSERTION_TTL_SECONDS: i64 = 3600;

/// Tokens closer than this to expiry are replaced.
const REFRESH_MARGIN_SECONDS: i64 = 300;

/// Fields of a Google service account key file.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ServiceAccountKey {
    /// Parse a key from its JSON text.
    pub fn from_json(json: &str) -> AppResult<Self> {
        serde_json::from_str(json).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid service account key: {e}"),
                e,
            )
        })
    }

    /// Read and parse a key file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Failed to read service account key {}: {e}", path.display()),
                e,
            )
        })?;
        Self::from_json(&json)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"****")
            .field("token_uri", &self.token_uri)
            .field("project_id", &self.project_id)
            .finish()
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Claims of the JWT bearer grant.
#[derive(Debug, Serialize, Deserialize)]
struct GrantClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// Token endpoint response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// A bearer token and the instant it stops being accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Whether the token can still be used at `now` without refreshing.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(REFRESH_MARGIN_SECONDS) < self.expires_at
    }
}

/// Something that can produce a new access token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Obtain a token valid from `now`.
    async fn fetch(&self, now: DateTime<Utc>) -> AppResult<AccessToken>;
}

/// A fixed token from configuration. It never expires on our side.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn fetch(&self, _now: DateTime<Utc>) -> AppResult<AccessToken> {
        Ok(AccessToken {
            token: self.0.clone(),
            expires_at: DateTime::<Utc>::MAX_UTC,
        })
    }
}

/// Mints tokens by exchanging a signed JWT grant.
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: reqwest::Client,
}

impl ServiceAccountTokenSource {
    /// Fails when the key's `private_key` is not an RSA PEM.
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> AppResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Invalid private key for {}", key.client_email),
                e,
            )
        })?;
        Ok(Self {
            key,
            encoding_key,
            http,
        })
    }

    /// Sign the grant presented to the token endpoint.
    fn assertion(&self, now: DateTime<Utc>) -> AppResult<String> {
        let claims = GrantClaims {
            iss: self.key.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_TTL_SECONDS,
        };
        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key).map_err(|e| {
            AppError::with_source(ErrorKind::Internal, "Failed to sign token grant", e)
        })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn fetch(&self, now: DateTime<Utc>) -> AppResult<AccessToken> {
        let assertion = self.assertion(now)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::ExternalService,
                    format!("Token endpoint unreachable at {}", self.key.token_uri),
                    e,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::external_service(format!(
                "Token exchange failed with {status}: {detail}"
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::ExternalService,
                "Malformed token endpoint response",
                e,
            )
        })?;

        info!(
            client_email = %self.key.client_email,
            expires_in = body.expires_in,
            "Minted FCM access token"
        );
        Ok(AccessToken {
            token: body.access_token,
            expires_at: now + Duration::seconds(body.expires_in.clamp(0, 86_400)),
        })
    }
}

/// Caches the token of a [`TokenSource`] until it is about to expire.
///
/// Concurrent callers wait on one refresh instead of minting one each.
pub struct TokenCache {
    source: Box<dyn TokenSource>,
    current: Mutex<Option<AccessToken>>,
}

impl TokenCache {
    pub fn new(source: Box<dyn TokenSource>) -> Self {
        Self {
            source,
            current: Mutex::new(None),
        }
    }

    /// Current bearer token, refreshed if needed.
    pub async fn token(&self) -> AppResult<String> {
        self.token_at(Utc::now()).await
    }

    /// Same as [`token`](Self::token) with an explicit clock.
    pub async fn token_at(&self, now: DateTime<Utc>) -> AppResult<String> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.token.clone());
        }

        debug!("Refreshing FCM access token");
        let fresh = self.source.fetch(now).await?;
        let token = fresh.token.clone();
        *current = Some(fresh);
        Ok(token)
    }

    /// Drop the cached token so the next call mints a new one.
    pub async fn invalidate(&self) {
        self.current.lock().await.take();
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache").finish_non_exhaustive()
    }
}
