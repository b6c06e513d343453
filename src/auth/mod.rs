// Authentication module
// Manages token lifecycle: exchange, expiry tracking and renewal

mod exchange;
mod manager;
mod types;

pub use manager::AuthManager;
pub use types::{
    Credential, Session, AUTH_KEY_HEADER, AUTH_TOKEN_HEADER, AUTH_USER_HEADER,
    EXPIRE_AUTH_TOKEN_HEADER, REFRESH_THRESHOLD_SECS, STORAGE_URL_HEADER,
};
