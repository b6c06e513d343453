use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use tokio::sync::Mutex;

use super::exchange;
use super::types::{Credential, Session, AUTH_TOKEN_HEADER};
use crate::config::StorageConfig;
use crate::error::{Result, StorageError};

/// Authentication manager
/// Owns the current session and renews it before it nears expiry
pub struct AuthManager {
    /// Account user
    user: String,

    /// Account key
    key: String,

    /// Client settings, reused when rebuilding the session client
    config: StorageConfig,

    /// HTTP client for authentication requests (no token attached)
    client: Client,

    /// Current credential and its token-bearing HTTP client.
    /// Check-and-refresh happens under this lock.
    session: Mutex<Session>,
}

impl AuthManager {
    /// Authenticate eagerly and return a manager holding the first session
    pub async fn new(
        config: StorageConfig,
        user: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;

        let user = user.into();
        let key = key.into();
        let client = config.client_builder(HeaderMap::new())?.build()?;

        tracing::info!("Authenticating as {} via {}", user, config.auth_url);
        let session = open_session(&client, &config, &user, &key).await?;

        Ok(Self {
            user,
            key,
            config,
            client,
            session: Mutex::new(session),
        })
    }

    /// Create a manager around an existing credential without contacting the server
    #[cfg(any(test, feature = "test-utils"))]
    pub fn with_credential(
        config: StorageConfig,
        user: impl Into<String>,
        key: impl Into<String>,
        credential: Credential,
    ) -> Result<Self> {
        let client = config.client_builder(HeaderMap::new())?.build()?;
        let session = build_session(&config, credential)?;

        Ok(Self {
            user: user.into(),
            key: key.into(),
            config,
            client,
            session: Mutex::new(session),
        })
    }

    /// Force a new authentication exchange and replace the session.
    /// On failure the previous session stays in place.
    pub async fn authenticate(&self) -> Result<Credential> {
        let mut session = self.session.lock().await;
        *session = open_session(&self.client, &self.config, &self.user, &self.key).await?;
        Ok(session.credential.clone())
    }

    /// Get a session whose credential is not near expiry, renewing first if needed.
    /// Concurrent callers observing near-expiry share a single renewal.
    pub async fn fresh_session(&self) -> Result<Session> {
        let mut session = self.session.lock().await;

        if session.credential.is_near_expiry() {
            tracing::debug!(
                "Token expires at {}, renewing",
                session.credential.expires_at().to_rfc3339()
            );
            *session = open_session(&self.client, &self.config, &self.user, &self.key).await?;
        }

        Ok(session.clone())
    }

    /// Snapshot of the current credential (no freshness check)
    pub async fn credential(&self) -> Credential {
        self.session.lock().await.credential.clone()
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

/// Run the authentication exchange and build the matching session
async fn open_session(
    client: &Client,
    config: &StorageConfig,
    user: &str,
    key: &str,
) -> Result<Session> {
    let credential = exchange::request_credential(client, &config.auth_url, user, key).await?;
    build_session(config, credential)
}

fn build_session(config: &StorageConfig, credential: Credential) -> Result<Session> {
    let mut token = HeaderValue::from_str(credential.token())
        .map_err(|e| StorageError::Config(format!("invalid {} value: {}", AUTH_TOKEN_HEADER, e)))?;
    token.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static("x-auth-token"), token);

    let http = config.client_builder(headers)?.build()?;

    Ok(Session { credential, http })
}
