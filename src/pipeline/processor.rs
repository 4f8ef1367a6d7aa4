//! Pluggable transformers keyed by file extension.
//!
//! # Registration
//!
//! ```ignore
//! let mut compilers = ProcessorTable::new();
//! compilers.register(".coffee", |source: &Path, target: &Path| -> Result<PathBuf> {
//!     // write the compiled bytes to `target`
//!     Ok(target.to_path_buf())
//! });
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::asset::{AssetType, minify};
use crate::config::{ProcessorSection, normalize_extension};
use crate::error::{PipelineError, Result};
use crate::utils::exec::Cmd;

/// Transform `source` into `target`.
///
/// Implementations write to `target` and return it. Returning any other
/// path means "nothing was produced, use this one instead".
pub trait Processor: Send + Sync {
    fn process(&self, source: &Path, target: &Path) -> Result<PathBuf>;
}

impl<F> Processor for F
where
    F: Fn(&Path, &Path) -> Result<PathBuf> + Send + Sync,
{
    fn process(&self, source: &Path, target: &Path) -> Result<PathBuf> {
        self(source, target)
    }
}

/// Extension (`.coffee`) → processor.
#[derive(Clone, Default)]
pub struct ProcessorTable {
    table: FxHashMap<String, Arc<dyn Processor>>,
}

impl ProcessorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `.js` and `.css` minifiers.
    pub fn builtin_compressors() -> Self {
        let mut table = Self::new();
        for ty in AssetType::ALL {
            table.register(&ty.dotted_extension(), BuiltinMinifier(ty));
        }
        table
    }

    /// Register (or replace) the processor for `ext`.
    pub fn register(&mut self, ext: &str, processor: impl Processor + 'static) {
        self.table.insert(normalize_extension(ext), Arc::new(processor));
    }

    /// Register one [`CommandProcessor`] per configured entry.
    pub fn register_commands(&mut self, section: &ProcessorSection, cwd: &Path) {
        for (ext, spec) in section.iter() {
            self.register(ext, CommandProcessor::new(spec.command.clone(), cwd));
        }
    }

    pub fn get(&self, ext: &str) -> Option<&Arc<dyn Processor>> {
        self.table.get(&normalize_extension(ext))
    }

    /// Processor for `path`'s extension.
    pub fn for_path(&self, path: &Path) -> Option<&Arc<dyn Processor>> {
        self.get(&path_extension(path))
    }

    pub fn contains(&self, ext: &str) -> bool {
        self.get(ext).is_some()
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<_> = self.table.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

impl fmt::Debug for ProcessorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.extensions()).finish()
    }
}

/// `.js` for `a/b.js`, empty without an extension.
pub fn path_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
        .unwrap_or_default()
}

// ============================================================================
// command processor
// ============================================================================

/// Runs an external program: source bytes on stdin, stdout to target.
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    command: Vec<String>,
    cwd: PathBuf,
}

impl CommandProcessor {
    pub fn new(command: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command,
            cwd: cwd.into(),
        }
    }
}

impl Processor for CommandProcessor {
    fn process(&self, source: &Path, target: &Path) -> Result<PathBuf> {
        let input = fs::read(source).map_err(|err| PipelineError::io(source, err))?;
        let output = Cmd::from_slice(&self.command)
            .cwd(&self.cwd)
            .stdin(input)
            .run()
            .map_err(|err| PipelineError::Processor {
                path: source.to_path_buf(),
                message: format!("{err:#}"),
            })?;
        fs::write(target, output.stdout).map_err(|err| PipelineError::Io(target.to_path_buf(), err))?;
        Ok(target.to_path_buf())
    }
}

// ============================================================================
// built-in minifier
// ============================================================================

/// oxc / lightningcss. Input that fails to parse is copied through.
#[derive(Debug, Clone, Copy)]
struct BuiltinMinifier(AssetType);

impl Processor for BuiltinMinifier {
    fn process(&self, source: &Path, target: &Path) -> Result<PathBuf> {
        let content = fs::read_to_string(source).map_err(|err| PipelineError::io(source, err))?;
        let output = minify::minify(self.0, &content).unwrap_or_else(|| {
            crate::log!("warning"; "could not minify {}, serving it as-is", source.display());
            content
        });
        fs::write(target, output).map_err(|err| PipelineError::Io(target.to_path_buf(), err))?;
        Ok(target.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_closure_processor_and_lookup() {
        let mut table = ProcessorTable::new();
        table.register("coffee", |_: &Path, target: &Path| -> Result<PathBuf> {
            Ok(target.to_path_buf())
        });

        assert!(table.contains(".coffee"));
        assert!(table.contains("COFFEE"));
        assert!(table.for_path(Path::new("x/a.coffee")).is_some());
        assert!(table.for_path(Path::new("x/a.ts")).is_none());

        let out = table
            .get(".coffee")
            .unwrap()
            .process(Path::new("a.coffee"), Path::new("out.js"))
            .unwrap();
        assert_eq!(out, PathBuf::from("out.js"));
    }

    #[test]
    fn test_builtin_compressors_replaceable() {
        let mut table = ProcessorTable::builtin_compressors();
        assert_eq!(table.extensions(), [".css", ".js"]);

        table.register(".js", |source: &Path, _: &Path| -> Result<PathBuf> {
            Ok(source.to_path_buf())
        });
        let out = table
            .get(".js")
            .unwrap()
            .process(Path::new("a.js"), Path::new("b.js"))
            .unwrap();
        assert_eq!(out, PathBuf::from("a.js"));
    }

    #[test]
    fn test_builtin_minifier_falls_back_on_parse_error() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("broken.js");
        let target = dir.path().join("out.js");
        fs::write(&source, "function (").unwrap();

        let table = ProcessorTable::builtin_compressors();
        table.get(".js").unwrap().process(&source, &target).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "function (");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_processor() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.coffee");
        let target = dir.path().join("a.js");
        fs::write(&source, "a = -> 1").unwrap();

        let upper = CommandProcessor::new(vec!["tr".into(), "a-z".into(), "A-Z".into()], dir.path());
        upper.process(&source, &target).unwrap();
        assert_eq!(fs::read_to_string(&target).unwrap(), "A = -> 1");

        let failing = CommandProcessor::new(vec!["false".into()], dir.path());
        let err = failing.process(&source, &target).unwrap_err();
        assert!(matches!(err, PipelineError::Processor { .. }));
    }
}
