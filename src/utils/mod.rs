//! Shared helpers.
//!
//! - [`date`]: HTTP dates for `Last-Modified`
//! - [`exec`]: external command execution
//! - [`mime`]: content types for downstream static files
//! - [`path`]: path normalization and cache-safe names

pub mod date;
pub mod exec;
pub mod mime;
pub mod path;
