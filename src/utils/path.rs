//! Path normalization utilities.
//!
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `normalize_request` - request path → root-relative candidate
//! - `sanitize_target` - logical target → cache-safe base name

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Normalize a request path: decode, strip query string, trim leading slashes.
///
/// `/js/app.js?v=123` → `js/app.js`
pub fn normalize_request(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split('?').next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| path.to_string());

    decoded.trim_start_matches('/').to_string()
}

/// Length of the target digest suffix in cache base names.
const TARGET_DIGEST_LEN: usize = 8;

/// Turn a logical target (`js/app.js`) into a flat cache base name
/// (`js_app-<8 hex>`).
///
/// The readable part drops the extension and maps every character outside
/// `[A-Za-z0-9_-]` to `_`. The suffix is a blake3 digest of the whole
/// target, so distinct targets never share a base name.
pub fn sanitize_target(target: &str) -> String {
    let target = target.trim_start_matches('/');
    let stem = match target.rfind('.') {
        Some(dot) if dot > target.rfind('/').map_or(0, |slash| slash + 1) => &target[..dot],
        _ => target,
    };
    let readable: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let digest = blake3::hash(target.as_bytes()).to_hex();
    let readable = if readable.is_empty() { "_" } else { readable.as_str() };
    format!("{readable}-{}", &digest.as_str()[..TARGET_DIGEST_LEN])
}

/// Path as a `/`-separated string, for registry keys and listings.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
