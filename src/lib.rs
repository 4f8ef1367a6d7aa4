//! Sluice - an on-demand asset build cache for HTTP servers.
//!
//! Requests for stylesheets and scripts are resolved against configured
//! pipes, compiled, combined and compressed on first use, and served from a
//! fingerprint-addressed cache afterwards.
//!
//! ```ignore
//! let config = PipelineConfig::load(Path::new("sluice.toml"))?;
//! let router = Router::new(config)?;
//!
//! match router.call("/app.js", None)? {
//!     Some(asset) => { /* 200 or 304 */ }
//!     None => { /* fall through to the next handler */ }
//! }
//! ```

pub mod asset;
pub mod cache;
pub mod config;
pub mod error;
pub mod freshness;
pub mod logger;
pub mod pipeline;
pub mod router;
pub mod utils;

pub use asset::{AssetType, Registry};
pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use router::{AssetResponse, Router, RouterBuilder};
