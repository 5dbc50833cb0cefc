//! Service-account credential loading and token management for Google Drive.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use drivedesk_common::{Error, Result, SensitiveString};

/// OAuth2 token endpoint used when the key file doesn't name one.
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Full Drive scope; the service account only sees what is shared with it.
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Grant type for the JWT-bearer flow.
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each signed assertion (the service maximum).
const ASSERTION_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    GOOGLE_TOKEN_URL.to_string()
}

/// Service-account key as downloaded from the cloud console.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default)]
    pub key_type: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub private_key_id: String,
    pub private_key: SensitiveString,
    pub client_email: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    /// Decode a base64-packaged key.
    ///
    /// # Errors
    /// - `Credential` if the blob is not base64, not UTF-8, not JSON, or
    ///   lacks `client_email`, `private_key` or a usable `token_uri`
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let compact: String = encoded.split_whitespace().collect();
        if compact.is_empty() {
            return Err(Error::Credential("credential is empty".to_string()));
        }

        let decoded = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| Error::Credential(format!("credential is not valid base64: {}", e)))?;
        let json = String::from_utf8(decoded)
            .map_err(|e| Error::Credential(format!("credential is not UTF-8: {}", e)))?;

        Self::from_json(&json)
    }

    /// Parse a key from its JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let key: Self = serde_json::from_str(json)
            .map_err(|e| Error::Credential(format!("credential is not valid JSON: {}", e)))?;
        key.validate()?;
        Ok(key)
    }

    fn validate(&self) -> Result<()> {
        if self.client_email.trim().is_empty() {
            return Err(Error::Credential("client_email is missing".to_string()));
        }
        if self.private_key.is_empty() {
            return Err(Error::Credential("private_key is missing".to_string()));
        }
        let token_url = url::Url::parse(&self.token_uri)
            .map_err(|e| Error::Credential(format!("token_uri is invalid: {}", e)))?;
        if !matches!(token_url.scheme(), "http" | "https") {
            return Err(Error::Credential(format!(
                "token_uri must be http(s): {}",
                self.token_uri
            )));
        }
        Ok(())
    }
}

/// Claims of the signed assertion exchanged for an access token.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

impl AssertionClaims {
    fn new(issuer: &str, scope: &str, audience: &str, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp();
        Self {
            iss: issuer.to_string(),
            scope: scope.to_string(),
            aud: audience.to_string(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Access token with expiration tracking.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: SensitiveString,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Check if the token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        // Consider expired if less than 5 minutes remaining
        self.expires_at < Utc::now() + Duration::minutes(5)
    }
}

/// Mints and caches access tokens for one service account.
pub struct TokenManager {
    http: Client,
    signing_key: EncodingKey,
    key_id: Option<String>,
    client_email: String,
    token_uri: String,
    scope: String,
    token: RwLock<Option<AccessToken>>,
}

impl TokenManager {
    /// Create a token manager. Parses the private key but performs no I/O.
    ///
    /// # Errors
    /// - `Credential` if the private key is not an RSA PEM
    pub fn new(http: Client, key: &ServiceAccountKey, scope: impl Into<String>) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.expose().as_bytes())
            .map_err(|e| Error::Credential(format!("private_key is not an RSA PEM: {}", e)))?;
        let key_id = if key.private_key_id.is_empty() {
            None
        } else {
            Some(key.private_key_id.clone())
        };

        Ok(Self {
            http,
            signing_key,
            key_id,
            client_email: key.client_email.clone(),
            token_uri: key.token_uri.clone(),
            scope: scope.into(),
            token: RwLock::new(None),
        })
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String> {
        let claims = AssertionClaims::new(&self.client_email, &self.scope, &self.token_uri, now);
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        jsonwebtoken::encode(&header, &claims, &self.signing_key)
            .map_err(|e| Error::Credential(format!("Failed to sign assertion: {}", e)))
    }

    /// Exchange a freshly signed assertion for an access token.
    async fn exchange(&self) -> Result<AccessToken> {
        let now = Utc::now();
        let assertion = self.sign_assertion(now)?;

        let response = self
            .http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| Error::Network(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Authentication(format!(
                "Token exchange failed: {} - {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Authentication(format!("Malformed token response: {}", e)))?;

        let expires_in = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        Ok(AccessToken {
            token: SensitiveString::new(token.access_token),
            expires_at: now + Duration::seconds(expires_in),
        })
    }

    /// Get a valid access token, minting a new one if necessary.
    pub async fn get_access_token(&self) -> Result<String> {
        {
            let token = self.token.read().await;
            if let Some(token) = token.as_ref().filter(|t| !t.is_expired()) {
                return Ok(token.token.expose().to_string());
            }
        }

        let mut token = self.token.write().await;

        // Double-check after acquiring write lock
        if let Some(current) = token.as_ref().filter(|t| !t.is_expired()) {
            return Ok(current.token.expose().to_string());
        }

        tracing::info!(client_email = %self.client_email, "Requesting service-account access token");
        let fresh = self.exchange().await?;
        let access = fresh.token.expose().to_string();
        *token = Some(fresh);

        Ok(access)
    }
}

/// Authenticated handle bound to one service account.
///
/// Cheap to clone; all clones share the same token cache.
#[derive(Clone)]
pub struct Session {
    tokens: Arc<TokenManager>,
    client_email: String,
}

impl Session {
    /// Build a session for `key`. No network traffic happens until the first
    /// token is needed.
    pub fn new(http: Client, key: &ServiceAccountKey, scope: impl Into<String>) -> Result<Self> {
        Ok(Self {
            tokens: Arc::new(TokenManager::new(http, key, scope)?),
            client_email: key.client_email.clone(),
        })
    }

    /// Obtain a token now so bad credentials surface at startup.
    pub async fn verify(&self) -> Result<()> {
        self.tokens.get_access_token().await.map(|_| ())
    }

    /// Bearer token for the next request.
    pub async fn access_token(&self) -> Result<String> {
        self.tokens.get_access_token().await
    }

    /// Service-account identity this session acts as.
    pub fn client_email(&self) -> &str {
        &self.client_email
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client_email", &self.client_email)
            .finish()
    }
}
