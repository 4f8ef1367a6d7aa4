//! Cache removal.

use anyhow::{Context, Result};
use sluice::cache::ArtifactCache;
use sluice::{PipelineConfig, log};

/// Delete the cache directory and everything in it.
pub fn clean(config: &PipelineConfig) -> Result<()> {
    let dir = config.cache_dir();
    if !dir.exists() {
        log!("cache"; "{} already clean", dir.display());
        return Ok(());
    }

    ArtifactCache::new(&dir)
        .and_then(|cache| cache.clear())
        .with_context(|| format!("failed to clean {}", dir.display()))?;
    log!("cache"; "removed {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_cache() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("cache");
        fs::create_dir_all(&cache).unwrap();
        fs::write(cache.join("app.combine.0123456789abcdef.js"), "x").unwrap();

        let mut config = PipelineConfig::with_root(dir.path());
        config.temp = Some(cache.clone());

        clean(&config).unwrap();
        assert!(!cache.exists());
        clean(&config).unwrap();
    }
}
