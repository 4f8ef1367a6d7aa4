//! Asset discovery: types, globs and the registry.
//!
//! ```text
//! sluice.toml [css]/[js] ──► scan::populate ──► Registry (generation N)
//! ```

mod glob;
mod kind;
pub mod minify;
mod registry;
mod scan;

// Types
pub use glob::{GlobError, GlobPattern};
pub use kind::AssetType;
pub use registry::{AssetEntry, AssetMap, EntryKind, Pipe, Registry};

// Population (pure functions)
pub use scan::{expand_glob, populate};
