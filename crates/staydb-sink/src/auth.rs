//! Service-account authentication for the warehouse API.
//!
//! The credentials file is a standard service-account JSON key. A short-lived
//! RS256 assertion is signed with its private key and exchanged at the
//! key's `token_uri` for a bearer token (JWT-bearer grant).

use std::path::Path;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::SinkError;

/// OAuth scope requested for warehouse access.
pub const WAREHOUSE_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime; the token endpoint rejects anything over one hour.
const ASSERTION_TTL_MINUTES: i64 = 60;

/// The fields of a service-account key file this crate needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_owned()
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[redacted]")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Reads a service-account key file.
///
/// # Errors
///
/// Returns [`SinkError::Io`] if the file cannot be read, or
/// [`SinkError::Credentials`] if it is not a service-account key.
pub fn load_service_account(path: &Path) -> Result<ServiceAccountKey, SinkError> {
    let raw = std::fs::read_to_string(path).map_err(|e| SinkError::io(path, e))?;
    let key: ServiceAccountKey =
        serde_json::from_str(&raw).map_err(|e| SinkError::Credentials {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    if key.client_email.trim().is_empty() || key.private_key.trim().is_empty() {
        return Err(SinkError::Credentials {
            path: path.display().to_string(),
            reason: "client_email and private_key must not be empty".to_owned(),
        });
    }
    Ok(key)
}

/// Signs the JWT-bearer assertion for `key`, valid from now for one hour.
///
/// # Errors
///
/// Returns [`SinkError::Auth`] if the private key is not a valid RSA PEM or
/// signing fails.
pub fn sign_assertion(key: &ServiceAccountKey) -> Result<String, SinkError> {
    let now = Utc::now();
    let claims = AssertionClaims {
        iss: &key.client_email,
        scope: WAREHOUSE_SCOPE,
        aud: &key.token_uri,
        iat: now.timestamp(),
        exp: (now + Duration::minutes(ASSERTION_TTL_MINUTES)).timestamp(),
    };

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SinkError::Auth(format!("invalid private key: {e}")))?;
    encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| SinkError::Auth(format!("failed to sign assertion: {e}")))
}

/// Exchanges a signed assertion for a bearer access token.
///
/// # Errors
///
/// - [`SinkError::Auth`] if signing fails or the endpoint refuses the grant.
/// - [`SinkError::Http`] on network failure or an undecodable response.
pub async fn fetch_access_token(
    client: &reqwest::Client,
    key: &ServiceAccountKey,
) -> Result<String, SinkError> {
    let assertion = sign_assertion(key)?;
    let response = client
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SinkError::Auth(format!(
            "token endpoint returned HTTP {}: {body}",
            status.as_u16()
        )));
    }

    let token: TokenResponse = response.json().await?;
    tracing::debug!(client_email = %key.client_email, "obtained warehouse access token");
    Ok(token.access_token)
}

/// Where the warehouse client gets its bearer token from.
#[derive(Clone)]
pub enum TokenSource {
    /// A pre-issued token, used as-is.
    Static(String),
    /// A service-account key exchanged for a token on each call.
    ServiceAccount(ServiceAccountKey),
}

impl TokenSource {
    /// Resolves the bearer token.
    ///
    /// # Errors
    ///
    /// Propagates [`fetch_access_token`] failures for service accounts.
    pub async fn token(&self, client: &reqwest::Client) -> Result<String, SinkError> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount(key) => fetch_access_token(client, key).await,
        }
    }
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Static(_) => f.write_str("TokenSource::Static([redacted])"),
            TokenSource::ServiceAccount(key) => f
                .debug_tuple("TokenSource::ServiceAccount")
                .field(key)
                .finish(),
        }
    }
}
