//! Registry: the immutable result of one population.
//!
//! ```text
//! Registry (generation N)
//! ├── css
//! │   └── app  → [a.css (raw), b.css (raw)]
//! └── js
//!     ├── app  → [a.js (raw), c.coffee (source, served as c.js)]
//!     └── admin → [...]
//! ```
//!
//! A registry is never mutated after construction. Repopulation builds a
//! new one and swaps it in whole.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Serialize;

use super::AssetType;

/// How a member reaches its pipe's target format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Already in target format, served or combined as-is.
    Raw,
    /// Needs compilation first.
    Source,
}

/// One discovered file belonging to a pipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetEntry {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Root-relative, `/`-separated path as matched by the glob.
    pub relative: String,
    /// Request path (root-relative) this entry answers to. Equal to
    /// `relative` for raw entries; source entries swap in the target
    /// extension.
    pub servable: String,
    pub kind: EntryKind,
}

impl AssetEntry {
    /// Classify a matched file for a pipe of type `ty`.
    pub fn new(path: PathBuf, relative: String, ty: AssetType) -> Self {
        if AssetType::from_path(&relative) == Some(ty) {
            Self {
                path,
                servable: relative.clone(),
                relative,
                kind: EntryKind::Raw,
            }
        } else {
            let stem = match relative.rfind('.') {
                Some(dot) if !relative[dot..].contains('/') => &relative[..dot],
                _ => relative.as_str(),
            };
            Self {
                servable: format!("{stem}.{}", ty.extension()),
                path,
                relative,
                kind: EntryKind::Source,
            }
        }
    }

    pub fn is_raw(&self) -> bool {
        self.kind == EntryKind::Raw
    }
}

/// A named, ordered group of members of one asset type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pipe {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AssetType,
    /// Pattern order, lexicographic within each pattern, first match wins.
    pub entries: Vec<AssetEntry>,
}

impl Pipe {
    /// Request path of the combined bundle (`app.js`).
    pub fn bundle_path(&self) -> String {
        format!("{}.{}", self.name, self.ty.extension())
    }
}

/// Asset type → pipe name → pipe.
pub type AssetMap = BTreeMap<AssetType, BTreeMap<String, Pipe>>;

/// One population's snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Registry {
    generation: u64,
    assets: AssetMap,
}

impl Registry {
    pub fn new(generation: u64, assets: AssetMap) -> Self {
        Self { generation, assets }
    }

    /// The population cycle that produced this snapshot.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn assets(&self) -> &AssetMap {
        &self.assets
    }

    /// Pipes of one type, in name order.
    pub fn pipes(&self, ty: AssetType) -> impl Iterator<Item = &Pipe> {
        self.assets.get(&ty).into_iter().flat_map(|pipes| pipes.values())
    }

    pub fn pipe(&self, ty: AssetType, name: &str) -> Option<&Pipe> {
        self.assets.get(&ty)?.get(name)
    }

    /// First entry, across the pipes of `ty`, served at `request`.
    pub fn find_single(&self, ty: AssetType, request: &str) -> Option<&AssetEntry> {
        self.pipes(ty)
            .flat_map(|pipe| pipe.entries.iter())
            .find(|entry| entry.servable == request)
    }

    /// Every request path this snapshot can answer: members and bundles.
    pub fn servable_paths(&self) -> BTreeSet<String> {
        let mut paths = BTreeSet::new();
        for pipes in self.assets.values() {
            for pipe in pipes.values() {
                paths.insert(pipe.bundle_path());
                paths.extend(pipe.entries.iter().map(|e| e.servable.clone()));
            }
        }
        paths
    }

    /// Same discovered assets, regardless of generation.
    pub fn same_assets(&self, other: &Self) -> bool {
        self.assets == other.assets
    }
}
