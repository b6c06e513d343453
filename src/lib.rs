//! Client for token-authenticated, Swift-style object storage.
//!
//! [`StorageClient`] authenticates once when constructed and then renews its
//! token transparently: every operation checks the current credential first
//! and re-authenticates when less than five minutes of validity remain.
//!
//! ```rust,ignore
//! use selcdn_storage::StorageClient;
//!
//! #[tokio::main]
//! async fn main() -> selcdn_storage::Result<()> {
//!     let client = StorageClient::connect("12345_user", "secret").await?;
//!
//!     client.put("photos", "hello.txt", "Hello, World!", None).await?;
//!     let (data, _headers) = client.get("photos", "hello.txt", None).await?;
//!     println!("{}", String::from_utf8_lossy(&data));
//!
//!     for (name, entry) in client.list("photos", "").await? {
//!         println!("{} {:?}", name, entry.bytes());
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod streaming;
pub mod utils;

pub use auth::{AuthManager, Credential, Session};
pub use client::StorageClient;
pub use config::StorageConfig;
pub use error::{Result, StorageError};
pub use models::ObjectEntry;
pub use streaming::ObjectStream;
