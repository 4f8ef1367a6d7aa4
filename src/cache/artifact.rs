use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use super::Stage;
use crate::error::{PipelineError, Result};
use crate::freshness::Fingerprint;
use crate::utils::path::sanitize_target;

/// Fingerprint-addressed artifact store in one directory.
#[derive(Debug)]
pub struct ArtifactCache {
    dir: PathBuf,
    /// Raised whenever a builder actually ran.
    busted: AtomicBool,
}

impl ArtifactCache {
    /// Open (and create if needed) the cache directory.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|err| PipelineError::CacheDir(dir.clone(), err))?;
        Ok(Self {
            dir,
            busted: AtomicBool::new(false),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Deterministic artifact path for `target` at `stage`.
    pub fn artifact_path(&self, target: &str, stage: Stage, fingerprint: Fingerprint) -> PathBuf {
        self.dir.join(format!(
            "{}.{}.{}{}",
            sanitize_target(target),
            stage,
            fingerprint.short(),
            target_extension(target)
        ))
    }

    /// Return the artifact for (`sources`, `target`, `stage`), building it
    /// on a miss.
    ///
    /// `build` receives a temp path in the cache directory and returns the
    /// path it produced. When that is the temp path, the file is renamed
    /// onto the artifact path. Any other path is a passthrough and is
    /// returned without caching.
    ///
    /// Stale artifacts of the same target and stage are evicted before
    /// building.
    pub fn resolve<P, F>(&self, sources: &[P], target: &str, stage: Stage, build: F) -> Result<PathBuf>
    where
        P: AsRef<Path>,
        F: FnOnce(&Path) -> Result<PathBuf>,
    {
        let fingerprint = Fingerprint::of_sources(sources)?;
        let artifact = self.artifact_path(target, stage, fingerprint);
        if artifact.is_file() {
            return Ok(artifact);
        }

        fs::create_dir_all(&self.dir)
            .map_err(|err| PipelineError::CacheDir(self.dir.clone(), err))?;
        self.evict(target, stage, &artifact)?;

        let ext = target_extension(target);
        let temp = tempfile::Builder::new()
            .prefix(".")
            .suffix(&ext)
            .tempfile_in(&self.dir)
            .map_err(|err| PipelineError::CacheDir(self.dir.clone(), err))?;

        let produced = build(temp.path())?;
        if produced != temp.path() {
            crate::debug!("cache"; "{} {} passed through", stage, target);
            return Ok(produced);
        }

        temp.persist(&artifact)
            .map_err(|err| PipelineError::Io(artifact.clone(), err.error))?;
        self.busted.store(true, Ordering::Release);
        crate::debug!("cache"; "built {}", artifact.display());
        Ok(artifact)
    }

    /// Remove every artifact of `target` at `stage` except `keep`.
    fn evict(&self, target: &str, stage: Stage, keep: &Path) -> Result<()> {
        let prefix = format!("{}.{}.", sanitize_target(target), stage);
        let ext = target_extension(target);

        for path in self.artifacts_matching(&prefix, &ext)? {
            if path == keep {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => crate::debug!("cache"; "evicted {}", path.display()),
                // A concurrent builder got there first
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => return Err(PipelineError::Io(path, err)),
            }
        }
        Ok(())
    }

    /// Artifact files named `{prefix}{16 hex}{ext}`.
    fn artifacts_matching(&self, prefix: &str, ext: &str) -> Result<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(PipelineError::CacheDir(self.dir.clone(), err)),
        };

        let paths = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name();
                let Some(name) = name.to_str() else {
                    return false;
                };
                name.strip_prefix(prefix)
                    .and_then(|rest| rest.strip_suffix(ext))
                    .is_some_and(is_fingerprint)
            })
            .map(|entry| entry.path())
            .collect();
        Ok(paths)
    }

    /// Latest mtime among the artifacts of `target`, any stage.
    pub fn newest_artifact(&self, target: &str) -> Option<SystemTime> {
        let base = sanitize_target(target);
        let ext = target_extension(target);
        crate::freshness::newest(
            Stage::ALL
                .iter()
                .filter_map(|stage| self.artifacts_matching(&format!("{base}.{stage}."), &ext).ok())
                .flatten(),
        )
    }

    /// Whether a build happened since the last call; clears the flag.
    pub fn take_busted(&self) -> bool {
        self.busted.swap(false, Ordering::AcqRel)
    }

    /// Delete the whole cache directory.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PipelineError::CacheDir(self.dir.clone(), err)),
        }
    }
}

/// `.js` for `assets/app.js`; empty when the target has no extension.
fn target_extension(target: &str) -> String {
    Path::new(target)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

fn is_fingerprint(s: &str) -> bool {
    s.len() == Fingerprint::NAME_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs::File;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn setup() -> (TempDir, ArtifactCache, PathBuf) {
        let dir = TempDir::new().unwrap();
        let cache = ArtifactCache::new(dir.path().join("cache")).unwrap();
        let source = dir.path().join("a.js");
        fs::write(&source, "a = function(){}").unwrap();
        set_mtime(&source, 1_000);
        (dir, cache, source)
    }

    fn set_mtime(path: &Path, secs: u64) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    fn copy_builder<'a>(source: &'a Path, calls: &'a Cell<u32>) -> impl FnOnce(&Path) -> Result<PathBuf> + 'a {
        move |target| {
            calls.set(calls.get() + 1);
            fs::copy(source, target).map_err(|e| PipelineError::io(target, e))?;
            Ok(target.to_path_buf())
        }
    }

    fn cache_files(cache: &ArtifactCache) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(cache.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_second_resolve_is_a_hit() {
        let (_dir, cache, source) = setup();
        let calls = Cell::new(0);

        let first = cache
            .resolve(&[&source], "assets/a.js", Stage::Compress, copy_builder(&source, &calls))
            .unwrap();
        assert!(cache.take_busted());

        let second = cache
            .resolve(&[&source], "assets/a.js", Stage::Compress, copy_builder(&source, &calls))
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert!(!cache.take_busted());
        assert_eq!(fs::read_to_string(&first).unwrap(), "a = function(){}");

        let name = first.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("assets_a-"), "{name}");
        assert!(name.contains(".compress."), "{name}");
        assert!(name.ends_with(".js"));
    }

    #[test]
    fn test_mtime_change_rebuilds_and_evicts() {
        let (_dir, cache, source) = setup();
        let calls = Cell::new(0);

        let old = cache
            .resolve(&[&source], "a.js", Stage::Compile, copy_builder(&source, &calls))
            .unwrap();
        set_mtime(&source, 2_000);
        let new = cache
            .resolve(&[&source], "a.js", Stage::Compile, copy_builder(&source, &calls))
            .unwrap();

        assert_ne!(old, new);
        assert!(!old.exists());
        assert!(new.is_file());
        assert_eq!(calls.get(), 2);
        assert_eq!(cache_files(&cache).len(), 1);
    }

    #[test]
    fn test_eviction_is_scoped_to_target_and_stage() {
        let (_dir, cache, source) = setup();
        let calls = Cell::new(0);

        let compile = cache
            .resolve(&[&source], "a.js", Stage::Compile, copy_builder(&source, &calls))
            .unwrap();
        let compress = cache
            .resolve(&[&source], "a.js", Stage::Compress, copy_builder(&source, &calls))
            .unwrap();
        let other = cache
            .resolve(&[&source], "a_b.js", Stage::Compile, copy_builder(&source, &calls))
            .unwrap();

        set_mtime(&source, 3_000);
        cache
            .resolve(&[&source], "a.js", Stage::Compile, copy_builder(&source, &calls))
            .unwrap();

        assert!(!compile.exists());
        assert!(compress.exists());
        assert!(other.exists());
    }

    #[test]
    fn test_lookalike_targets_keep_their_own_artifacts() {
        let (_dir, cache, source) = setup();
        let calls = Cell::new(0);

        let dotted = cache
            .resolve(&[&source], "x.y/a.js", Stage::Compress, copy_builder(&source, &calls))
            .unwrap();
        let underscored = cache
            .resolve(&[&source], "x_y/a.js", Stage::Compress, copy_builder(&source, &calls))
            .unwrap();
        let nested = cache
            .resolve(&[&source], "x/y_a.js", Stage::Compress, copy_builder(&source, &calls))
            .unwrap();

        assert_ne!(dotted, underscored);
        assert!(dotted.is_file());
        assert!(underscored.is_file());
        assert!(nested.is_file());

        let again = cache
            .resolve(&[&source], "x.y/a.js", Stage::Compress, copy_builder(&source, &calls))
            .unwrap();
        assert_eq!(again, dotted);
        assert_eq!(calls.get(), 3);
        assert_eq!(cache_files(&cache).len(), 3);
    }

    #[test]
    fn test_busted_only_after_a_real_build() {
        let (_dir, cache, source) = setup();

        let failed = cache.resolve(&[&source], "a.js", Stage::Compile, |_| {
            Err(PipelineError::Processor {
                path: source.clone(),
                message: "boom".into(),
            })
        });
        assert!(failed.is_err());
        assert!(!cache.take_busted());

        cache
            .resolve(&[&source], "a.js", Stage::Compress, |_| Ok(source.clone()))
            .unwrap();
        assert!(!cache.take_busted());

        let calls = Cell::new(0);
        cache
            .resolve(&[&source], "a.js", Stage::Compile, copy_builder(&source, &calls))
            .unwrap();
        assert!(cache.take_busted());
    }

    #[test]
    fn test_partial_artifact_never_visible() {
        let (_dir, cache, source) = setup();
        let fingerprint = Fingerprint::of_sources(&[&source]).unwrap();
        let expected = cache.artifact_path("a.js", Stage::Compile, fingerprint);

        let result = cache.resolve(&[&source], "a.js", Stage::Compile, |temp| {
            assert_ne!(temp, expected);
            assert!(!expected.exists());
            assert!(temp.file_name().unwrap().to_str().unwrap().starts_with('.'));
            fs::write(temp, "half").unwrap();
            Err(PipelineError::Processor {
                path: temp.to_path_buf(),
                message: "boom".into(),
            })
        });

        assert!(result.is_err());
        assert!(!expected.exists());
        assert!(cache_files(&cache).is_empty());
    }

    #[test]
    fn test_passthrough_is_not_cached() {
        let (_dir, cache, source) = setup();
        let produced = cache
            .resolve(&[&source], "a.js", Stage::Compress, |_| Ok(source.clone()))
            .unwrap();
        assert_eq!(produced, source);
        assert!(cache_files(&cache).is_empty());
    }

    #[test]
    fn test_missing_source_signals_repopulate() {
        let (dir, cache, _source) = setup();
        let gone = dir.path().join("gone.js");
        let err = cache
            .resolve(&[&gone], "gone.js", Stage::Compile, |t| Ok(t.to_path_buf()))
            .unwrap_err();
        assert!(err.is_missing());
    }

    #[test]
    fn test_unusable_cache_dir() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let err = ArtifactCache::new(blocker.join("cache")).unwrap_err();
        assert!(matches!(err, PipelineError::CacheDir(..)));
    }

    #[test]
    fn test_newest_artifact_and_clear() {
        let (_dir, cache, source) = setup();
        assert!(cache.newest_artifact("a.js").is_none());

        let calls = Cell::new(0);
        cache
            .resolve(&[&source], "a.js", Stage::Compress, copy_builder(&source, &calls))
            .unwrap();
        assert!(cache.newest_artifact("a.js").is_some());

        cache.clear().unwrap();
        assert!(!cache.dir().exists());
        assert!(cache.newest_artifact("a.js").is_none());
    }
}
