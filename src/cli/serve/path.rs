//! Request path to public file resolution.

use std::path::{Path, PathBuf};

use sluice::utils::path::normalize_request;

/// File under `public` for `url`, with `index.html` for directories.
///
/// Paths that escape `public` (via `..` or symlinks) resolve to nothing.
pub fn resolve_path(url: &str, public: &Path) -> Option<PathBuf> {
    let clean = normalize_request(url);
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let canonical = public.join(&clean).canonicalize().ok()?;
    let root = public.canonicalize().ok()?;
    if !canonical.starts_with(&root) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    let index = canonical.join("index.html");
    index.is_file().then_some(index)
}
