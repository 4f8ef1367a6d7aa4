//! Asset listing and cache busters for markup helpers.

use std::time::SystemTime;

use rustc_hash::FxHashSet;

use super::Router;
use crate::asset::AssetType;
use crate::freshness::get_mtime;
use crate::utils::date::unix_secs;
use crate::utils::path::normalize_request;

impl Router {
    /// Request paths (root-relative, no leading `/`) a page should include
    /// for `pipes` of type `ty`, in order and without duplicates.
    ///
    /// With `combine` on, one bundle path per pipe; otherwise every member
    /// under its servable path. Unknown pipes contribute nothing.
    pub fn assets_for<S: AsRef<str>>(&self, pipes: &[S], ty: AssetType) -> Vec<String> {
        let registry = self.snapshot();
        let mut seen = FxHashSet::default();
        let mut assets = Vec::new();

        for name in pipes {
            let Some(pipe) = registry.pipe(ty, name.as_ref()) else {
                continue;
            };
            let paths: Vec<String> = if self.config.combine {
                vec![pipe.bundle_path()]
            } else {
                pipe.entries.iter().map(|e| e.servable.clone()).collect()
            };
            for path in paths {
                if seen.insert(path.clone()) {
                    assets.push(path);
                }
            }
        }
        assets
    }

    /// `?{unix secs}` query suffix that changes whenever `path` does.
    ///
    /// Uncompressed files that exist under `root` use their own mtime.
    /// Everything else uses the newest artifact built for the same target,
    /// or the current time when none exists yet.
    pub fn cache_buster(&self, path: &str) -> String {
        let relative = normalize_request(path);

        let raw = if self.config.compress {
            None
        } else {
            let file = self.config.root.join(&relative);
            if file.is_file() { get_mtime(&file) } else { None }
        };

        let stamp = raw
            .or_else(|| self.pipeline.cache().newest_artifact(&relative))
            .unwrap_or_else(SystemTime::now);
        format!("?{}", unix_secs(stamp))
    }
}
