// URL and checksum helpers

use md5::{Digest, Md5};

/// `{storage_url}/{container}/`, used for listings
pub fn container_url(storage_url: &str, container: &str) -> String {
    format!("{}/{}/", storage_url.trim_end_matches('/'), container)
}

/// `{storage_url}/{container}/{path}`
pub fn object_url(storage_url: &str, container: &str, path: &str) -> String {
    format!(
        "{}/{}/{}",
        storage_url.trim_end_matches('/'),
        container,
        path
    )
}

/// Value for `X-Copy-From`: `{container}/{path}`
pub fn copy_source(container: &str, path: &str) -> String {
    format!("{}/{}", container, path)
}

/// Lowercase hex MD5 of `data`, sent as the object ETag
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_url() {
        assert_eq!(
            object_url("https://s.example.com/v1/SEL_1/", "photos", "2024/a.jpg"),
            "https://s.example.com/v1/SEL_1/photos/2024/a.jpg"
        );
        // Endpoint without trailing slash
        assert_eq!(
            object_url("https://s.example.com/v1/SEL_1", "photos", "a.jpg"),
            "https://s.example.com/v1/SEL_1/photos/a.jpg"
        );
    }

    #[test]
    fn test_container_url() {
        assert_eq!(
            container_url("https://s.example.com/v1/SEL_1/", "photos"),
            "https://s.example.com/v1/SEL_1/photos/"
        );
        assert_eq!(
            container_url("https://s.example.com/v1/SEL_1", "photos"),
            "https://s.example.com/v1/SEL_1/photos/"
        );
    }

    #[test]
    fn test_copy_source() {
        assert_eq!(copy_source("photos", "2024/a.jpg"), "photos/2024/a.jpg");
    }

    #[test]
    fn test_md5_hex() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(md5_hex(b"hello world"), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }
}
