//! Service-account credentials for the spreadsheet API.
//!
//! The key is read from a file or from an inline JSON string, a short-lived
//! RS256 assertion is signed with it, and the assertion is traded for a
//! bearer token at the key's `token_uri`. Every failure here is fatal for the
//! run.

use crate::errors::{HarvestError, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Read/write access to spreadsheets.
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_MINUTES: i64 = 60;

/// Where the service-account key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    File(PathBuf),
    Inline(String),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Inline(_) => f.write_str("Inline(..)"),
        }
    }
}

impl CredentialSource {
    /// Pick a source from the CLI/environment. A key file wins over inline
    /// JSON when both are set.
    pub fn from_options(file: Option<&Path>, json: Option<&str>) -> Result<Self> {
        match (file, json) {
            (Some(path), _) => Ok(Self::File(path.to_path_buf())),
            (None, Some(json)) if !json.trim().is_empty() => Ok(Self::Inline(json.to_string())),
            _ => Err(HarvestError::Credentials(
                "set --credentials-file or GOOGLE_SERVICE_ACCOUNT_CREDENTIALS".into(),
            )),
        }
    }

    #[instrument(level = "info", skip_all, fields(source = ?self))]
    pub async fn load(&self) -> Result<ServiceAccountKey> {
        let text = match self {
            Self::File(path) => fs::read_to_string(path).await.map_err(|e| {
                HarvestError::Credentials(format!("cannot read {}: {e}", path.display()))
            })?,
            Self::Inline(json) => json.clone(),
        };
        let key: ServiceAccountKey = serde_json::from_str(&text)
            .map_err(|e| HarvestError::Credentials(format!("malformed key JSON: {e}")))?;
        info!(client_email = %key.client_email, "Loaded service-account key");
        Ok(key)
    }
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service-account key file this crate needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
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
    access_token: String,
}

impl ServiceAccountKey {
    /// Sign the JWT-bearer assertion for `scope`.
    pub fn assertion(&self, scope: &str, now: DateTime<Utc>) -> Result<String> {
        let claims = AssertionClaims {
            iss: self.client_email.clone(),
            scope: scope.to_string(),
            aud: self.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(ASSERTION_LIFETIME_MINUTES)).timestamp(),
        };
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.private_key_id.clone();
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| HarvestError::Credentials(format!("unusable private key: {e}")))?;
        Ok(encode(&header, &claims, &key)?)
    }

    /// Exchange a fresh assertion for a bearer token.
    #[instrument(level = "info", skip_all, fields(token_uri = %self.token_uri))]
    pub async fn access_token(&self, http: &Client, scope: &str) -> Result<String> {
        let assertion = self.assertion(scope, Utc::now())?;
        let response = http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HarvestError::Credentials(format!(
                "token endpoint returned {status}: {body}"
            )));
        }
        let token: TokenResponse = response.json().await?;
        info!("Obtained access token");
        Ok(token.access_token)
    }
}
