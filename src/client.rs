use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, ETAG};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use std::collections::HashMap;
use std::path::Path;
use tokio::io::AsyncRead;
use tracing::instrument;

use crate::auth::{AuthManager, Credential};
use crate::config::StorageConfig;
use crate::error::{Result, StorageError};
use crate::models::{index_by_name, ObjectEntry};
use crate::streaming::{self, ObjectStream};
use crate::utils::{container_url, copy_source, md5_hex, object_url};

const COPY_FROM_HEADER: HeaderName = HeaderName::from_static("x-copy-from");

/// Client for the object storage API.
///
/// Every operation first asks the [`AuthManager`] for a fresh session, so the
/// token is renewed transparently before it nears expiry. Safe to share
/// between tasks.
pub struct StorageClient {
    auth: AuthManager,
}

impl StorageClient {
    /// Authenticate against the default endpoint
    pub async fn connect(user: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        Self::with_config(StorageConfig::default(), user, key).await
    }

    /// Authenticate with explicit settings
    pub async fn with_config(
        config: StorageConfig,
        user: impl Into<String>,
        key: impl Into<String>,
    ) -> Result<Self> {
        let auth = AuthManager::new(config, user, key).await?;
        Ok(Self { auth })
    }

    /// Wrap an already constructed manager
    pub fn from_auth(auth: AuthManager) -> Self {
        Self { auth }
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub fn config(&self) -> &StorageConfig {
        self.auth.config()
    }

    /// Current credential, without triggering renewal
    pub async fn credential(&self) -> Credential {
        self.auth.credential().await
    }

    // ==================== Read Operations ====================

    /// List objects under `path`, keyed by object name
    #[instrument(skip(self))]
    pub async fn list(&self, container: &str, path: &str) -> Result<HashMap<String, ObjectEntry>> {
        let session = self.auth.fresh_session().await?;

        let url = container_url(session.credential().storage_url(), container);
        let request = session
            .http()
            .get(&url)
            .query(&[("format", "json"), ("path", path)]);

        let response = send(request, Method::GET, &url).await?;
        let body = response.bytes().await?;
        let entries: Vec<ObjectEntry> = serde_json::from_slice(&body)?;

        tracing::debug!(count = entries.len(), "Listed objects");
        Ok(index_by_name(entries))
    }

    /// Download an object into memory
    #[instrument(skip(self, headers))]
    pub async fn get(
        &self,
        container: &str,
        path: &str,
        headers: Option<HeaderMap>,
    ) -> Result<(Bytes, HeaderMap)> {
        let session = self.auth.fresh_session().await?;

        let url = object_url(session.credential().storage_url(), container, path);
        let request = session.http().get(&url).headers(headers.unwrap_or_default());

        let response = send(request, Method::GET, &url).await?;
        let response_headers = response.headers().clone();
        let data = response.bytes().await?;

        Ok((data, response_headers))
    }

    /// Download an object as a stream of chunks.
    /// The body is read from the network only as the stream is polled.
    /// Chunks arrive as the transport delivers them; `chunk_size` applies to
    /// uploads only.
    #[instrument(skip(self, headers))]
    pub async fn get_stream(
        &self,
        container: &str,
        path: &str,
        headers: Option<HeaderMap>,
    ) -> Result<(HeaderMap, ObjectStream)> {
        let session = self.auth.fresh_session().await?;

        let url = object_url(session.credential().storage_url(), container, path);
        let request = session.http().get(&url).headers(headers.unwrap_or_default());

        let response = send(request, Method::GET, &url).await?;
        let response_headers = response.headers().clone();

        Ok((response_headers, streaming::response_stream(response)))
    }

    // ==================== Write Operations ====================

    /// Upload an object from memory. The MD5 of `content` is sent as `ETag`
    /// so the server verifies what it stored.
    #[instrument(skip(self, content, headers))]
    pub async fn put(
        &self,
        container: &str,
        path: &str,
        content: impl Into<Bytes>,
        headers: Option<HeaderMap>,
    ) -> Result<HeaderMap> {
        let session = self.auth.fresh_session().await?;

        let content = content.into();
        let etag = HeaderValue::from_str(&md5_hex(&content))
            .map_err(|e| StorageError::Config(format!("invalid ETag value: {}", e)))?;

        let mut headers = headers.unwrap_or_default();
        headers.insert(ETAG, etag);

        let url = object_url(session.credential().storage_url(), container, path);
        let request = session.http().put(&url).headers(headers).body(content);

        let response = send(request, Method::PUT, &url).await?;
        Ok(response.headers().clone())
    }

    /// Upload everything `reader` produces, pulled lazily in `chunk_size` pieces
    #[instrument(skip(self, reader, headers))]
    pub async fn save_stream<R>(
        &self,
        container: &str,
        path: &str,
        reader: R,
        headers: Option<HeaderMap>,
    ) -> Result<HeaderMap>
    where
        R: AsyncRead + Unpin + Send + Sync + 'static,
    {
        let session = self.auth.fresh_session().await?;

        let url = object_url(session.credential().storage_url(), container, path);
        let body = streaming::upload_body(reader, self.config().chunk_size);
        let request = session
            .http()
            .put(&url)
            .headers(headers.unwrap_or_default())
            .body(body);

        let response = send(request, Method::PUT, &url).await?;
        Ok(response.headers().clone())
    }

    /// Upload a local file as a streamed body.
    /// The file is owned by the request body and closed when the request ends,
    /// whether it succeeds or fails.
    #[instrument(skip(self, file, headers), fields(local = %file.as_ref().display()))]
    pub async fn save_file(
        &self,
        container: &str,
        path: &str,
        file: impl AsRef<Path>,
        headers: Option<HeaderMap>,
    ) -> Result<HeaderMap> {
        let session = self.auth.fresh_session().await?;

        let handle = tokio::fs::File::open(file.as_ref()).await?;
        let metadata = handle.metadata().await?;

        // Pipes and devices report no usable length; send those chunked
        let mut headers = headers.unwrap_or_default();
        if metadata.is_file() {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(metadata.len()));
        } else {
            headers.remove(CONTENT_LENGTH);
        }

        let url = object_url(session.credential().storage_url(), container, path);
        let body = streaming::upload_body(handle, self.config().chunk_size);
        let request = session.http().put(&url).headers(headers).body(body);

        let response = send(request, Method::PUT, &url).await?;
        Ok(response.headers().clone())
    }

    /// Delete an object. With `force`, a missing object (404) is not an error.
    #[instrument(skip(self))]
    pub async fn remove(&self, container: &str, path: &str, force: bool) -> Result<HeaderMap> {
        let session = self.auth.fresh_session().await?;

        let url = object_url(session.credential().storage_url(), container, path);
        let response = execute(session.http().delete(&url), &Method::DELETE, &url).await?;

        if force && response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(url = %url, "Object already absent, ignoring 404");
            return Ok(response.headers().clone());
        }

        let response = check_status(response, &url)?;
        Ok(response.headers().clone())
    }

    /// Server-side copy of `src` to `dst` within `container`
    #[instrument(skip(self, headers))]
    pub async fn copy(
        &self,
        container: &str,
        src: &str,
        dst: &str,
        headers: Option<HeaderMap>,
    ) -> Result<HeaderMap> {
        let session = self.auth.fresh_session().await?;

        let source = HeaderValue::from_str(&copy_source(container, src))
            .map_err(|e| StorageError::Config(format!("invalid copy source {:?}: {}", src, e)))?;

        let mut headers = headers.unwrap_or_default();
        headers.insert(COPY_FROM_HEADER, source);
        headers.insert(CONTENT_LENGTH, HeaderValue::from(0u64));

        let url = object_url(session.credential().storage_url(), container, dst);
        let request = session.http().put(&url).headers(headers);

        let response = send(request, Method::PUT, &url).await?;
        Ok(response.headers().clone())
    }
}

/// Send a request and fail on any non-success status
async fn send(request: RequestBuilder, method: Method, url: &str) -> Result<Response> {
    let response = execute(request, &method, url).await?;
    check_status(response, url)
}

/// Send a request; transport errors propagate unchanged
async fn execute(request: RequestBuilder, method: &Method, url: &str) -> Result<Response> {
    tracing::debug!(method = %method, url = %url, "Sending storage request");

    let response = request.send().await.map_err(|e| {
        tracing::warn!(error = %e, url = %url, "Storage request error");
        StorageError::Http(e)
    })?;

    tracing::debug!(status = %response.status(), "Received storage response");
    Ok(response)
}

fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    tracing::warn!(
        status = status.as_u16(),
        url = %url,
        "Storage request failed with error response"
    );

    Err(StorageError::HttpStatus {
        status: status.as_u16(),
        url: url.to_string(),
    })
}
