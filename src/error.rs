//! Pipeline error taxonomy.
//!
//! | Variant             | Class                                        |
//! |---------------------|----------------------------------------------|
//! | `Missing`           | transient: registry is stale, repopulate     |
//! | `NoCompiler`        | configuration, never retried                 |
//! | `Processor`         | external compiler/compressor failed          |
//! | `CacheDir` / `Io`   | cache filesystem unusable                    |
//! | `GenerationCeiling` | too many repopulations, never retried        |
//! | `Config`            | configuration rejected at construction       |

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::ConfigError;

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A file the registry or the cache believed to exist has vanished.
    #[error("file vanished: `{}`", .0.display())]
    Missing(PathBuf),

    #[error("no compiler for {} => {target}", input.display())]
    NoCompiler { input: PathBuf, target: String },

    #[error("processor failed for `{}`: {message}", path.display())]
    Processor { path: PathBuf, message: String },

    #[error("cache directory `{}` is unusable", .0.display())]
    CacheDir(PathBuf, #[source] io::Error),

    #[error("IO error at `{}`", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error("too many registry generations (ceiling {0})")]
    GenerationCeiling(u32),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Map an IO error on `path`: `NotFound` means the registry is stale.
    pub fn io(path: &Path, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::Missing(path.to_path_buf())
        } else {
            Self::Io(path.to_path_buf(), err)
        }
    }

    /// Whether this error is the "must repopulate" signal.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing(_))
    }
}
