use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, StorageError};

/// Default authentication endpoint
pub const DEFAULT_AUTH_URL: &str = "https://auth.selcdn.ru/";

/// Default upload chunk size (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1 << 20;

/// Default connect timeout in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 30;

/// Storage client configuration
#[derive(Clone, Debug)]
pub struct StorageConfig {
    /// Authentication endpoint
    pub auth_url: String,

    /// TCP/TLS connect timeout in seconds
    pub connect_timeout: u64,

    /// Whole-request timeout in seconds. `None` leaves long transfers unbounded.
    pub request_timeout: Option<u64>,

    /// Chunk size for streamed uploads in bytes
    pub chunk_size: usize,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            user_agent: format!("selcdn-storage/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl StorageConfig {
    /// Create a config pointing at the given authentication endpoint
    pub fn new(auth_url: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into(),
            ..Default::default()
        }
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout = secs;
        self
    }

    pub fn with_request_timeout(mut self, secs: u64) -> Self {
        self.request_timeout = Some(secs);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(StorageError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        reqwest::Url::parse(&self.auth_url).map_err(|e| {
            StorageError::Config(format!("invalid auth_url {:?}: {}", self.auth_url, e))
        })?;

        HeaderValue::from_str(&self.user_agent)
            .map_err(|e| StorageError::Config(format!("invalid user_agent: {}", e)))?;

        Ok(())
    }

    /// HTTP client builder with the configured timeouts and extra default headers
    pub(crate) fn client_builder(&self, mut headers: HeaderMap) -> Result<reqwest::ClientBuilder> {
        let user_agent = HeaderValue::from_str(&self.user_agent)
            .map_err(|e| StorageError::Config(format!("invalid user_agent: {}", e)))?;
        headers.insert(USER_AGENT, user_agent);

        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout))
            .default_headers(headers);

        if let Some(secs) = self.request_timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(builder)
    }
}

// === Command line ===

/// selcdn - command line client for Selectel-style object storage
#[derive(Parser, Debug)]
#[command(name = "selcdn", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Storage account user
    #[arg(short = 'u', long, env = "SELECTEL_USER")]
    pub user: String,

    /// Storage account key
    #[arg(short = 'k', long, env = "SELECTEL_KEY", hide_env_values = true)]
    pub key: String,

    /// Authentication endpoint
    #[arg(long, env = "SELECTEL_AUTH_URL", default_value = DEFAULT_AUTH_URL)]
    pub auth_url: String,

    /// Connect timeout in seconds
    #[arg(long, env = "HTTP_CONNECT_TIMEOUT", default_value = "30")]
    pub connect_timeout: u64,

    /// Whole-request timeout in seconds (unbounded when unset)
    #[arg(long, env = "HTTP_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Upload chunk size in bytes
    #[arg(long, env = "UPLOAD_CHUNK_SIZE", default_value = "1048576")]
    pub chunk_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List objects in a container
    Ls {
        container: String,
        /// Pseudo-directory to list
        #[arg(default_value = "")]
        path: String,
    },

    /// Download an object to a file or stdout
    Get {
        container: String,
        path: String,
        /// Destination file (stdout when omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Upload a local file
    Put {
        container: String,
        path: String,
        file: String,
        /// Content-Type of the stored object
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Delete an object
    Rm {
        container: String,
        path: String,
        /// Treat a missing object as success
        #[arg(short, long)]
        force: bool,
    },

    /// Server-side copy within a container
    Cp {
        container: String,
        src: String,
        dst: String,
    },
}

impl CliArgs {
    /// Load arguments with priority: CLI > ENV (.env included) > defaults
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    /// Library configuration derived from the command line
    pub fn storage_config(&self) -> StorageConfig {
        let mut config = StorageConfig::new(self.auth_url.clone())
            .with_connect_timeout(self.connect_timeout)
            .with_chunk_size(self.chunk_size);
        config.request_timeout = self.request_timeout;
        config
    }
}

/// Expand tilde (~) in file paths to user's home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(config.chunk_size, 1_048_576);
        assert_eq!(config.connect_timeout, 30);
        assert!(config.request_timeout.is_none());
        assert!(config.user_agent.starts_with("selcdn-storage/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = StorageConfig::new("http://127.0.0.1:9000/auth/")
            .with_connect_timeout(5)
            .with_request_timeout(60)
            .with_chunk_size(4096)
            .with_user_agent("tests/1.0");

        assert_eq!(config.auth_url, "http://127.0.0.1:9000/auth/");
        assert_eq!(config.connect_timeout, 5);
        assert_eq!(config.request_timeout, Some(60));
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.user_agent, "tests/1.0");
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let config = StorageConfig::default().with_chunk_size(0);
        assert!(matches!(config.validate(), Err(StorageError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_auth_url() {
        let config = StorageConfig::new("not a url");
        assert!(matches!(config.validate(), Err(StorageError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_user_agent() {
        let config = StorageConfig::default().with_user_agent("bad\nagent");
        assert!(matches!(config.validate(), Err(StorageError::Config(_))));
    }

    #[test]
    fn test_cli_parsing() {
        let args = CliArgs::try_parse_from([
            "selcdn", "-u", "alice", "-k", "secret", "--chunk-size", "65536", "rm", "photos",
            "a.jpg", "--force",
        ])
        .unwrap();

        assert_eq!(args.user, "alice");
        assert_eq!(args.key, "secret");
        assert_eq!(args.chunk_size, 65536);
        assert_eq!(
            args.command,
            Command::Rm {
                container: "photos".to_string(),
                path: "a.jpg".to_string(),
                force: true,
            }
        );

        let config = args.storage_config();
        assert_eq!(config.chunk_size, 65536);
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
    }

    #[test]
    fn test_cli_ls_default_path() {
        let args =
            CliArgs::try_parse_from(["selcdn", "-u", "alice", "-k", "secret", "ls", "photos"])
                .unwrap();
        assert_eq!(
            args.command,
            Command::Ls {
                container: "photos".to_string(),
                path: String::new(),
            }
        );
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/file.txt");
        assert!(path.to_string_lossy().contains("test/file.txt"));
        assert!(!path.to_string_lossy().starts_with("~"));

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_tilde_just_tilde() {
        let path = expand_tilde("~");
        assert_eq!(path, PathBuf::from("~"));
    }
}
