//! Processing pipeline: compile → combine → compress.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   source ext    ┌──────────────────┐
//! │  compile()   │ ──────────────► │ compilers table  │
//! └──────┬───────┘                 └──────────────────┘
//!        │ (Source members)
//! ┌──────▼───────┐
//! │  combine()   │  members joined by a blank line, pipe order
//! └──────┬───────┘
//! ┌──────▼───────┐   artifact ext  ┌──────────────────┐
//! │  compress()  │ ──────────────► │ compressors table│
//! └──────────────┘                 └──────────────────┘
//! ```
//!
//! Every stage goes through the [`ArtifactCache`]; a stage whose inputs
//! have not changed returns the existing artifact without running its
//! processor.
//!
//! # Failure policy
//!
//! - compile without a compiler: [`PipelineError::NoCompiler`], never retried
//! - compress without a compressor: warned once per extension, input passed through

mod processor;

pub use processor::{CommandProcessor, Processor, ProcessorTable, path_extension};

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::asset::AssetEntry;
use crate::cache::{ArtifactCache, Stage};
use crate::error::{PipelineError, Result};

/// Separator between combined members.
pub const COMBINE_SEPARATOR: &[u8] = b"\n\n";

/// The three stages over one artifact cache.
#[derive(Debug)]
pub struct Pipeline {
    cache: ArtifactCache,
    compilers: ProcessorTable,
    compressors: ProcessorTable,
    compress: bool,
    /// Extensions already warned about (no compressor).
    warned: Mutex<FxHashSet<String>>,
}

impl Pipeline {
    pub fn new(
        cache: ArtifactCache,
        compilers: ProcessorTable,
        compressors: ProcessorTable,
        compress: bool,
    ) -> Self {
        Self {
            cache,
            compilers,
            compressors,
            compress,
            warned: Mutex::new(FxHashSet::default()),
        }
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Compile `source` into the logical `target` (`js/c.js`).
    pub fn compile(&self, source: &Path, target: &str) -> Result<PathBuf> {
        let compiler = self
            .compilers
            .for_path(source)
            .ok_or_else(|| PipelineError::NoCompiler {
                input: source.to_path_buf(),
                target: target.to_string(),
            })?;

        self.cache.resolve(&[source], target, Stage::Compile, |out| {
            crate::debug!("build"; "compile {} => {}", source.display(), target);
            compiler.process(source, out)
        })
    }

    /// Concatenate `members` in order into the bundle `target` (`app.js`).
    pub fn combine(&self, members: &[AssetEntry], target: &str) -> Result<PathBuf> {
        let sources: Vec<&Path> = members.iter().map(|m| m.path.as_path()).collect();

        self.cache.resolve(&sources, target, Stage::Combine, |out| {
            crate::debug!("build"; "combine {} members => {}", members.len(), target);
            let mut bundle = Vec::new();
            for (i, member) in members.iter().enumerate() {
                let path = self.member_content(member)?;
                let bytes = fs::read(&path).map_err(|err| PipelineError::io(&path, err))?;
                if i > 0 {
                    bundle.extend_from_slice(COMBINE_SEPARATOR);
                }
                bundle.extend_from_slice(&bytes);
            }
            fs::write(out, bundle).map_err(|err| PipelineError::Io(out.to_path_buf(), err))?;
            Ok(out.to_path_buf())
        })
    }

    /// The file holding `entry`'s content in target format.
    pub fn member_content(&self, entry: &AssetEntry) -> Result<PathBuf> {
        if entry.is_raw() {
            Ok(entry.path.clone())
        } else {
            self.compile(&entry.path, &entry.servable)
        }
    }

    /// Compress `source` for `target`; returns `source` when disabled or
    /// when no compressor handles its extension.
    pub fn compress(&self, source: &Path, target: &str) -> Result<PathBuf> {
        if !self.compress {
            return Ok(source.to_path_buf());
        }

        let Some(compressor) = self.compressors.for_path(source) else {
            let ext = path_extension(source);
            if self.warned.lock().insert(ext.clone()) {
                crate::log!("warning"; "no compressor for `{}`, serving uncompressed", ext);
            }
            return Ok(source.to_path_buf());
        };

        self.cache.resolve(&[source], target, Stage::Compress, |out| {
            crate::debug!("build"; "compress {}", target);
            compressor.process(source, out)
        })
    }
}
