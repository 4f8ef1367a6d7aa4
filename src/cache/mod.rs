//! Fingerprint Cache: built artifacts keyed by source fingerprints.
//!
//! An artifact's file name encodes its validity:
//!
//! ```text
//! {cache_dir}/{sanitized target}-{target digest}.{stage}.{fingerprint}{ext}
//!             js_app            -9c41d07e       .combine.3f9a0c12d4e5b6a7.js
//! ```
//!
//! Existence at that path means "built and valid". There is no index file.
//! Writes land in a dot-prefixed temp file in the same directory and are
//! renamed into place, so a half-written artifact is never visible.

mod artifact;
mod stage;

pub use artifact::ArtifactCache;
pub use stage::Stage;
