//! Registry population (pure, no side effects).
//!
//! For every asset type and every configured pipe, each glob is expanded
//! against `root`, its matches sorted lexicographically, and the results
//! appended in pattern order. A file matched by two patterns of the same
//! pipe keeps its first position.
//!
//! # Pure Function
//!
//! Population only reads the filesystem and returns a new [`Registry`].
//! Running it twice over an unchanged tree yields equal asset maps.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;
use rustc_hash::FxHashSet;

use super::{AssetEntry, AssetMap, AssetType, GlobPattern, Pipe, Registry};
use crate::config::{ConfigError, PipeSpec, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::utils::path::to_slash;

/// Build a fresh registry stamped with `generation`.
pub fn populate(config: &PipelineConfig, generation: u64) -> Result<Registry> {
    let root = &config.root;
    if !root.is_dir() {
        return Err(PipelineError::Config(ConfigError::Validation(format!(
            "root directory '{}' does not exist",
            root.display()
        ))));
    }

    let mut assets = AssetMap::new();
    for ty in AssetType::ALL {
        let mut pipes = BTreeMap::new();
        for (name, spec) in config.pipes(ty).iter() {
            let entries = expand_pipe(root, spec, ty)?;
            pipes.insert(
                name.to_string(),
                Pipe {
                    name: name.to_string(),
                    ty,
                    entries,
                },
            );
        }
        assets.insert(ty, pipes);
    }

    let registry = Registry::new(generation, assets);
    crate::debug!("registry"; "generation {}: {} servable paths", generation, registry.servable_paths().len());
    Ok(registry)
}

/// Expand every pattern of one pipe, in order.
fn expand_pipe(root: &Path, spec: &PipeSpec, ty: AssetType) -> Result<Vec<AssetEntry>> {
    let mut seen = FxHashSet::default();
    let mut entries = Vec::new();

    for pattern in spec.patterns() {
        let glob = GlobPattern::new(pattern).map_err(|e| {
            PipelineError::Config(ConfigError::Validation(format!(
                "invalid glob '{pattern}': {e}"
            )))
        })?;

        for (path, relative) in expand_glob(root, &glob) {
            if seen.insert(relative.clone()) {
                entries.push(AssetEntry::new(path, relative, ty));
            }
        }
    }

    Ok(entries)
}

/// Files under `root` matching `glob`, sorted by relative path.
///
/// Hidden entries are skipped. Symlinks are listed without being followed,
/// so a dangling link surfaces later as a vanished file.
pub fn expand_glob(root: &Path, glob: &GlobPattern) -> Vec<(PathBuf, String)> {
    let base = root.join(glob.literal_prefix());
    if !base.is_dir() {
        return Vec::new();
    }

    let mut matches: Vec<_> = WalkDir::new(&base)
        .skip_hidden(true)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let file_type = entry.file_type();
            file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir())
        })
        .filter_map(|entry| {
            let path = entry.path();
            let relative = to_slash(path.strip_prefix(root).ok()?);
            glob.is_match(&relative).then_some((path, relative))
        })
        .collect();

    matches.sort_by(|a, b| a.1.cmp(&b.1));
    matches
}
