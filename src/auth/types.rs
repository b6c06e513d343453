// Authentication types

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;

/// Request header carrying the account user
pub const AUTH_USER_HEADER: &str = "X-Auth-User";

/// Request header carrying the account key
pub const AUTH_KEY_HEADER: &str = "X-Auth-Key";

/// Token header, returned by the auth server and sent on every storage request
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Storage endpoint returned by the auth server
pub const STORAGE_URL_HEADER: &str = "X-Storage-Url";

/// Token lifetime in seconds returned by the auth server
pub const EXPIRE_AUTH_TOKEN_HEADER: &str = "X-Expire-Auth-Token";

/// Renew the token when less than this many seconds remain
pub const REFRESH_THRESHOLD_SECS: i64 = 300;

/// A time-bounded authorization grant.
///
/// Fields are fixed at construction; renewal produces a new `Credential`.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    token: String,
    storage_url: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Build a credential issued now.
    ///
    /// `lifetime` is the raw `X-Expire-Auth-Token` value in seconds.
    pub fn new(
        token: impl Into<String>,
        storage_url: impl Into<String>,
        lifetime: &str,
    ) -> crate::Result<Self> {
        Self::issued(token, storage_url, lifetime, Utc::now())
    }

    /// Build a credential issued at an explicit instant
    pub fn issued(
        token: impl Into<String>,
        storage_url: impl Into<String>,
        lifetime: &str,
        issued_at: DateTime<Utc>,
    ) -> crate::Result<Self> {
        let token = token.into();
        let storage_url = storage_url.into();

        if token.is_empty() {
            return Err(crate::StorageError::MissingHeader(AUTH_TOKEN_HEADER));
        }
        if storage_url.is_empty() {
            return Err(crate::StorageError::MissingHeader(STORAGE_URL_HEADER));
        }

        let invalid = || crate::StorageError::InvalidLifetime(lifetime.to_string());

        let seconds: u64 = lifetime.trim().parse().map_err(|_| invalid())?;
        let lifetime_secs = i64::try_from(seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(invalid)?;
        let expires_at = issued_at
            .checked_add_signed(lifetime_secs)
            .ok_or_else(invalid)?;

        Ok(Self {
            token,
            storage_url,
            issued_at,
            expires_at,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn storage_url(&self) -> &str {
        &self.storage_url
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Time left before expiry at `now` (negative once expired)
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// Check if the token is within the refresh threshold of expiry.
    /// An already expired token is near expiry too.
    pub fn is_near_expiry(&self) -> bool {
        self.is_near_expiry_at(Utc::now())
    }

    pub fn is_near_expiry_at(&self, now: DateTime<Utc>) -> bool {
        self.remaining_at(now) < Duration::seconds(REFRESH_THRESHOLD_SECS)
    }
}

/// A credential paired with the HTTP client that carries its token
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) credential: Credential,
    pub(crate) http: Client,
}

impl Session {
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// HTTP client with `X-Auth-Token` installed as a default header
    pub fn http(&self) -> &Client {
        &self.http
    }
}
