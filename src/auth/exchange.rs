// Authentication exchange: account identity in, short-lived credential out

use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};

use super::types::{
    Credential, AUTH_KEY_HEADER, AUTH_TOKEN_HEADER, AUTH_USER_HEADER, EXPIRE_AUTH_TOKEN_HEADER,
    STORAGE_URL_HEADER,
};
use crate::error::{Result, StorageError};

/// Exchange user and key for a new credential.
///
/// The server must answer 204 No Content with the token, storage URL and
/// token lifetime in response headers.
pub async fn request_credential(
    client: &Client,
    auth_url: &str,
    user: &str,
    key: &str,
) -> Result<Credential> {
    tracing::debug!(url = %auth_url, user = %user, "Requesting auth token");

    let response = client
        .get(auth_url)
        .header(AUTH_USER_HEADER, user)
        .header(AUTH_KEY_HEADER, key)
        .send()
        .await?;

    let status = response.status();
    if status != StatusCode::NO_CONTENT {
        tracing::error!(
            status = status.as_u16(),
            url = %auth_url,
            "Authentication failed: expected 204 No Content"
        );
        return Err(StorageError::AuthenticationFailed {
            status: status.as_u16(),
        });
    }

    let headers = response.headers();
    let token = required_header(headers, AUTH_TOKEN_HEADER)?;
    let storage_url = required_header(headers, STORAGE_URL_HEADER)?;
    let lifetime = required_header(headers, EXPIRE_AUTH_TOKEN_HEADER)?;

    let credential = Credential::new(token, storage_url, lifetime)?;

    tracing::info!(
        storage_url = %credential.storage_url(),
        "Authenticated, token expires: {}",
        credential.expires_at().to_rfc3339()
    );

    Ok(credential)
}

fn required_header<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(StorageError::MissingHeader(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_required_header_present() {
        let mut headers = HeaderMap::new();
        headers.insert("x-auth-token", HeaderValue::from_static("tok"));
        assert_eq!(required_header(&headers, AUTH_TOKEN_HEADER).unwrap(), "tok");
    }

    #[test]
    fn test_required_header_missing() {
        let headers = HeaderMap::new();
        assert!(matches!(
            required_header(&headers, STORAGE_URL_HEADER),
            Err(StorageError::MissingHeader(STORAGE_URL_HEADER))
        ));
    }

    #[test]
    fn test_required_header_not_utf8() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-expire-auth-token",
            HeaderValue::from_bytes(&[0xff, 0xfe]).unwrap(),
        );
        assert!(matches!(
            required_header(&headers, EXPIRE_AUTH_TOKEN_HEADER),
            Err(StorageError::MissingHeader(EXPIRE_AUTH_TOKEN_HEADER))
        ));
    }
}
