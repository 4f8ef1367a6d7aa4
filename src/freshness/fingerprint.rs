//! Source-set fingerprints using blake3.
//!
//! A fingerprint hashes every source's path and modification time, in
//! order. Touching a source changes the fingerprint, which changes the
//! artifact path derived from it, so a stale artifact is never found.

use std::fmt;
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::error::{PipelineError, Result};

/// A 256-bit fingerprint (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Hex digits kept in artifact file names.
    pub const NAME_LEN: usize = 16;

    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash `sources` in order.
    ///
    /// A source that cannot be stat'ed because it no longer exists yields
    /// [`PipelineError::Missing`].
    pub fn of_sources<P: AsRef<Path>>(sources: &[P]) -> Result<Self> {
        let mut hasher = blake3::Hasher::new();
        for source in sources {
            let path = source.as_ref();
            let mtime = path
                .metadata()
                .and_then(|m| m.modified())
                .map_err(|err| PipelineError::io(path, err))?;
            let nanos = mtime
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_nanos());

            hasher.update(path.as_os_str().as_encoded_bytes());
            hasher.update(&[0]);
            hasher.update(&nanos.to_le_bytes());
        }
        Ok(Self(*hasher.finalize().as_bytes()))
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Short form used in artifact names.
    pub fn short(self) -> String {
        self.to_hex()[..Self::NAME_LEN].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn touch(path: &Path, secs: u64) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_display_is_short_hex() {
        let fp = Fingerprint::new([0xab; 32]);
        assert_eq!(format!("{fp}"), "abababababababab");
        assert_eq!(fp.to_hex().len(), 64);
    }

    #[test]
    fn test_stable_without_changes() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.js");
        fs::write(&a, "a").unwrap();

        let first = Fingerprint::of_sources(&[&a]).unwrap();
        let second = Fingerprint::of_sources(&[&a]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_mtime_change_changes_fingerprint() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.js");
        fs::write(&a, "a").unwrap();
        touch(&a, 1_000);
        let before = Fingerprint::of_sources(&[&a]).unwrap();

        touch(&a, 2_000);
        let after = Fingerprint::of_sources(&[&a]).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_order_matters() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.js");
        let b = dir.path().join("b.js");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let ab = Fingerprint::of_sources(&[&a, &b]).unwrap();
        let ba = Fingerprint::of_sources(&[&b, &a]).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_missing_source() {
        let dir = TempDir::new().unwrap();
        let err = Fingerprint::of_sources(&[dir.path().join("gone.js")]).unwrap_err();
        assert!(err.is_missing());
    }
}
