//! Request router: request path → served artifact.
//!
//! # State machine
//!
//! ```text
//! Idle ──► Resolving ──► Resolved ──► (200 | 304)
//!              │    └──► NoMatch  ──► fall through
//!              │    └──► Fatal    ──► error
//!              ▼
//!       NeedsRepopulation ──► repopulate (generation + 1) ──► Resolving
//!                             (at most `max_generations` times)
//! ```
//!
//! # Registry ownership
//!
//! The registry is an immutable snapshot behind an [`ArcSwap`]. Readers
//! load a snapshot and keep it for the whole attempt; repopulation builds
//! a new snapshot and swaps it in. A failed population leaves the previous
//! snapshot in place.
//!
//! The generation counter sits under the same mutex as repopulation, so
//! the check and the increment are one step. A request that finds a newer
//! snapshot than the one it failed on retries on it without rebuilding.

mod listing;
mod response;
#[cfg(test)]
mod tests;

pub use response::{AssetResponse, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED};

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::Mutex;

use crate::asset::{AssetType, Registry, populate};
use crate::cache::ArtifactCache;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::pipeline::{Pipeline, Processor, ProcessorTable};
use crate::utils::date::http_date;
use crate::utils::path::normalize_request;

/// Outcome of one resolution attempt against one snapshot.
#[derive(Debug)]
enum Attempt<T> {
    Resolved(T),
    NoMatch,
    /// A file the snapshot relied on has vanished.
    NeedsRepopulation(PathBuf),
    Fatal(PipelineError),
}

impl<T> From<Result<Option<T>>> for Attempt<T> {
    fn from(result: Result<Option<T>>) -> Self {
        match result {
            Ok(Some(resolved)) => Self::Resolved(resolved),
            Ok(None) => Self::NoMatch,
            Err(PipelineError::Missing(path)) => Self::NeedsRepopulation(path),
            Err(err) => Self::Fatal(err),
        }
    }
}

/// Long-lived, shareable asset router.
#[derive(Debug)]
pub struct Router {
    config: PipelineConfig,
    pipeline: Pipeline,
    registry: ArcSwap<Registry>,
    /// Latest generation handed out; guards repopulation.
    generation: Mutex<u64>,
}

impl Router {
    /// Router with command processors from `config` and the built-in
    /// minifiers.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: PipelineConfig) -> RouterBuilder {
        RouterBuilder::new(config)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Current registry snapshot.
    pub fn snapshot(&self) -> Arc<Registry> {
        self.registry.load_full()
    }

    /// Number of populations run so far (the first is generation 1).
    ///
    /// The counter is unbounded; `max_generations` caps the repopulations
    /// of a single call, not this total.
    pub fn generation(&self) -> u64 {
        *self.generation.lock()
    }

    /// Whether any artifact was built since the last call.
    pub fn take_cache_busted(&self) -> bool {
        self.pipeline.cache().take_busted()
    }

    /// Resolve `request` (path, optionally with a query string).
    ///
    /// `Ok(None)` means no asset matches and the caller should fall
    /// through to its downstream handler. `if_modified_since` is compared
    /// verbatim against the artifact's `Last-Modified`.
    pub fn call(&self, request: &str, if_modified_since: Option<&str>) -> Result<Option<AssetResponse>> {
        self.with_retries(|registry| self.try_serve(registry, request, if_modified_since))
    }

    /// Resolve `request` to its final artifact path, building it if needed.
    pub fn resolve(&self, request: &str) -> Result<Option<PathBuf>> {
        self.with_retries(|registry| self.find_artifact(registry, request))
    }

    /// Run `attempt` against the current snapshot, repopulating and
    /// retrying while it reports a vanished file.
    fn with_retries<T>(&self, attempt: impl Fn(&Registry) -> Result<Option<T>>) -> Result<Option<T>> {
        let ceiling = self.config.max_generations;
        let mut snapshot = self.snapshot();
        let mut repopulations = 0;

        loop {
            match Attempt::from(attempt(snapshot.as_ref())) {
                Attempt::Resolved(resolved) => return Ok(Some(resolved)),
                Attempt::NoMatch => return Ok(None),
                Attempt::Fatal(err) => return Err(err),
                Attempt::NeedsRepopulation(path) => {
                    if repopulations >= ceiling {
                        crate::log!("error"; "{} still missing after {} repopulations", path.display(), ceiling);
                        return Err(PipelineError::GenerationCeiling(ceiling));
                    }
                    repopulations += 1;
                    crate::debug!("registry"; "{} vanished, repopulating", path.display());
                    snapshot = self.repopulate(snapshot.generation())?;
                }
            }
        }
    }

    /// Rebuild the registry unless a snapshot newer than `seen` exists.
    fn repopulate(&self, seen: u64) -> Result<Arc<Registry>> {
        let mut generation = self.generation.lock();
        let current = self.registry.load_full();
        if current.generation() > seen {
            return Ok(current);
        }

        let next = *generation + 1;
        let registry = Arc::new(populate(&self.config, next)?);
        *generation = next;
        self.registry.store(Arc::clone(&registry));
        Ok(registry)
    }

    /// One attempt against `registry`.
    fn try_serve(
        &self,
        registry: &Registry,
        request: &str,
        if_modified_since: Option<&str>,
    ) -> Result<Option<AssetResponse>> {
        match self.find_artifact(registry, request)? {
            Some(artifact) => self.serve(artifact, if_modified_since).map(Some),
            None => Ok(None),
        }
    }

    /// Asset type, then single lookup, then bundle lookup; compressed.
    fn find_artifact(&self, registry: &Registry, request: &str) -> Result<Option<PathBuf>> {
        let candidate = normalize_request(request);
        let Some(ty) = AssetType::from_path(&candidate) else {
            return Ok(None);
        };

        let (resolved, target) = if let Some(entry) = registry.find_single(ty, &candidate) {
            (self.pipeline.member_content(entry)?, candidate)
        } else {
            let Some(pipe) = bundle_name(&candidate).and_then(|name| registry.pipe(ty, name)) else {
                return Ok(None);
            };
            let target = pipe.bundle_path();
            (self.pipeline.combine(&pipe.entries, &target)?, target)
        };

        self.pipeline.compress(&resolved, &target).map(Some)
    }

    /// Conditional GET over the artifact.
    fn serve(&self, artifact: PathBuf, if_modified_since: Option<&str>) -> Result<AssetResponse> {
        let modified = fs::metadata(&artifact)
            .and_then(|meta| meta.modified())
            .map_err(|err| PipelineError::io(&artifact, err))?;
        let last_modified = http_date(modified);

        if if_modified_since == Some(last_modified.as_str()) {
            return Ok(AssetResponse::not_modified(artifact, last_modified));
        }

        let body = fs::read(&artifact).map_err(|err| PipelineError::io(&artifact, err))?;
        let content_type = format!("{}; charset=utf-8", self.config.content_type_for(&artifact));
        Ok(AssetResponse::ok(artifact, content_type, last_modified, body))
    }
}

/// `js/app.js` → `app`
fn bundle_name(candidate: &str) -> Option<&str> {
    Path::new(candidate).file_stem().and_then(|stem| stem.to_str())
}

// ============================================================================
// builder
// ============================================================================

/// Wires processors into a [`Router`].
///
/// ```ignore
/// let router = Router::builder(config)
///     .compiler(".coffee", CoffeeCompiler::default())
///     .build()?;
/// ```
pub struct RouterBuilder {
    config: PipelineConfig,
    compilers: ProcessorTable,
    compressors: ProcessorTable,
}

impl RouterBuilder {
    fn new(config: PipelineConfig) -> Self {
        let mut compilers = ProcessorTable::new();
        compilers.register_commands(&config.compilers, &config.root);

        let mut compressors = ProcessorTable::builtin_compressors();
        compressors.register_commands(&config.compressors, &config.root);

        Self {
            config,
            compilers,
            compressors,
        }
    }

    /// Register (or replace) the compiler for a source extension.
    pub fn compiler(mut self, ext: &str, processor: impl Processor + 'static) -> Self {
        self.compilers.register(ext, processor);
        self
    }

    /// Register (or replace) the compressor for an artifact extension.
    pub fn compressor(mut self, ext: &str, processor: impl Processor + 'static) -> Self {
        self.compressors.register(ext, processor);
        self
    }

    /// Validate the config, open the cache and run the first population.
    pub fn build(self) -> Result<Router> {
        self.config.validate()?;

        let cache = ArtifactCache::new(self.config.cache_dir())?;
        let registry = populate(&self.config, 1)?;
        crate::debug!(
            "registry";
            "compilers {:?}, compressors {:?}",
            self.compilers,
            self.compressors
        );

        let pipeline = Pipeline::new(cache, self.compilers, self.compressors, self.config.compress);
        Ok(Router {
            config: self.config,
            pipeline,
            registry: ArcSwap::from_pointee(registry),
            generation: Mutex::new(1),
        })
    }
}
