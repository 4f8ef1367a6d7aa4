//! Pipeline configuration management for `sluice.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [css]/[js], [compilers]/[compressors], [serve]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # config file discovery
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! # Example
//!
//! ```toml
//! root = "assets"
//! compress = true
//! combine = true
//!
//! [content_type]
//! ".js" = "text/javascript"
//!
//! [js]
//! app = ["vendor/*.js", "**/*.coffee"]
//!
//! [compilers.".coffee"]
//! command = ["coffee", "--compile", "--print", "--stdio"]
//! ```
//!
//! Unknown keys are rejected: a typo must never silently fall back to a
//! default.

pub mod section;
pub mod types;
mod util;

pub use section::{
    CommandSpec, PipeSpec, PipeTable, ProcessorSection, ServeConfig, normalize_extension,
};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};
pub use util::find_config_file;

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use crate::asset::AssetType;

/// Default config file name.
pub const CONFIG_FILE: &str = "sluice.toml";

/// Ceiling on registry repopulations per resolution.
pub const DEFAULT_MAX_GENERATIONS: u32 = 5;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing sluice.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Base directory that glob patterns and request paths are relative to.
    pub root: PathBuf,

    /// Cache directory. `None` means `{system temp}/sluice`.
    pub temp: Option<PathBuf>,

    /// Run the compress stage on every served artifact.
    pub compress: bool,

    /// Whether the asset listing names bundles (`app.js`) or members.
    pub combine: bool,

    /// Repopulations one resolution may trigger before failing.
    pub max_generations: u32,

    /// Extension (`.css`) → Content-Type, merged over the defaults.
    pub content_type: BTreeMap<String, String>,

    /// Stylesheet pipes.
    pub css: PipeTable,

    /// Script pipes.
    pub js: PipeTable,

    /// Extension → external compiler.
    pub compilers: ProcessorSection,

    /// Extension → external compressor (replaces the built-in minifier).
    pub compressors: ProcessorSection,

    /// HTTP host settings.
    pub serve: ServeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::from("assets"),
            temp: None,
            compress: false,
            combine: false,
            max_generations: DEFAULT_MAX_GENERATIONS,
            content_type: default_content_types(),
            css: PipeTable::default_for(AssetType::Style),
            js: PipeTable::default_for(AssetType::Script),
            compilers: ProcessorSection::default(),
            compressors: ProcessorSection::default(),
            serve: ServeConfig::default(),
        }
    }
}

fn default_content_types() -> BTreeMap<String, String> {
    AssetType::ALL
        .iter()
        .map(|ty| (ty.dotted_extension(), ty.default_content_type().to_string()))
        .collect()
}

impl PipelineConfig {
    /// Load, finalize and validate a config file.
    ///
    /// Relative paths inside the file resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str_strict(&content)?;

        config.config_path = crate::utils::path::normalize_path(path);
        let base = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.finalize(&base);
        config.validate()?;
        Ok(config)
    }

    /// Parse TOML, rejecting unknown keys. Paths are left as written.
    pub fn from_str_strict(content: &str) -> Result<Self, ConfigError> {
        let (config, ignored) = Self::parse_with_ignored(content)?;
        if !ignored.is_empty() {
            return Err(ConfigError::UnknownFields(ignored));
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Resolve relative paths against `base` and fill in defaults.
    pub fn finalize(&mut self, base: &Path) {
        self.root = crate::utils::path::normalize_path(&base.join(&self.root));
        self.temp = self
            .temp
            .take()
            .map(|temp| crate::utils::path::normalize_path(&base.join(temp)));
        self.serve.public = crate::utils::path::normalize_path(&base.join(&self.serve.public));

        let overrides = std::mem::take(&mut self.content_type);
        self.content_type = default_content_types();
        for (ext, value) in overrides {
            self.content_type.insert(normalize_extension(&ext), value);
        }

        self.compilers.normalize();
        self.compressors.normalize();
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the configuration, collecting all errors at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        if !self.root.is_dir() {
            diag.error_with_hint(
                FieldPath::new("root"),
                format!("root directory '{}' does not exist", self.root.display()),
                "point `root` at the directory your globs are relative to",
            );
        }

        if self.max_generations == 0 {
            diag.error(FieldPath::new("max_generations"), "must be at least 1");
        }

        for ty in AssetType::ALL {
            self.pipes(ty).validate(ty, &mut diag);
        }
        self.compilers.validate("compilers", &mut diag);
        self.compressors.validate("compressors", &mut diag);

        diag.into_result().map_err(ConfigError::Diagnostics)
    }

    // ========================================================================
    // accessors
    // ========================================================================

    /// Pipes configured for an asset type.
    pub fn pipes(&self, ty: AssetType) -> &PipeTable {
        match ty {
            AssetType::Style => &self.css,
            AssetType::Script => &self.js,
        }
    }

    /// Cache directory (configured or the process-wide default).
    pub fn cache_dir(&self) -> PathBuf {
        self.temp
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("sluice"))
    }

    /// Content-Type for a served file, without charset.
    pub fn content_type_for(&self, path: &Path) -> &str {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.content_type.get(&format!(".{}", ext.to_ascii_lowercase())))
            .map_or("text/plain", String::as_str)
    }

    /// Config rooted at `root` with every other field defaulted, for
    /// embedding without a config file.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let mut config = Self::default();
        config.root = root.as_ref().to_path_buf();
        config.finalize(Path::new(""));
        config
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from TOML. Panics on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
