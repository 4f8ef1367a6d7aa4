//! Freshness detection: fingerprints over source paths and mtimes.

mod fingerprint;
pub mod mtime;

pub use fingerprint::Fingerprint;
pub use mtime::{get_mtime, newest};
