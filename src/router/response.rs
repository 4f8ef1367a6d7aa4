//! The HTTP-level answer for a resolved asset.

use std::path::PathBuf;

pub const LAST_MODIFIED: &str = "Last-Modified";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";

/// A 200 with body or a 304 with only `Last-Modified`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
    /// Artifact the response was served from.
    pub artifact: PathBuf,
}

impl AssetResponse {
    pub fn ok(artifact: PathBuf, content_type: String, last_modified: String, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            headers: vec![
                (CONTENT_TYPE, content_type),
                (CONTENT_LENGTH, body.len().to_string()),
                (LAST_MODIFIED, last_modified),
            ],
            body,
            artifact,
        }
    }

    pub fn not_modified(artifact: PathBuf, last_modified: String) -> Self {
        Self {
            status: 304,
            headers: vec![(LAST_MODIFIED, last_modified)],
            body: Vec::new(),
            artifact,
        }
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_not_modified(&self) -> bool {
        self.status == 304
    }
}
