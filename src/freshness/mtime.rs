//! Mtime helpers for `Last-Modified` and cache busters.

use std::path::Path;
use std::time::SystemTime;

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Latest mtime among `paths`, skipping unreadable ones.
pub fn newest<I, P>(paths: I) -> Option<SystemTime>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    paths
        .into_iter()
        .filter_map(|path| get_mtime(path.as_ref()))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    #[test]
    fn test_newest() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old");
        let new = dir.path().join("new");
        fs::write(&old, "").unwrap();
        fs::write(&new, "").unwrap();
        for (path, secs) in [(&old, 100), (&new, 200)] {
            File::options()
                .write(true)
                .open(path)
                .unwrap()
                .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
                .unwrap();
        }

        let missing = dir.path().join("missing");
        assert_eq!(
            newest([&old, &new, &missing]),
            Some(UNIX_EPOCH + Duration::from_secs(200))
        );
        assert_eq!(newest([&missing]), None);
    }
}
