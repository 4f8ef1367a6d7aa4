//! `[css]` and `[js]` pipe definitions.
//!
//! Each key names a pipe; the value is one glob or a list of globs,
//! matched relative to `root`. Patterns apply in the order written.
//!
//! # Example
//!
//! ```toml
//! [css]
//! app = "**/*.css"
//!
//! [js]
//! app = ["vendor/*.js", "app/**/*.js", "app/**/*.coffee"]
//! admin = "admin/*.js"
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::asset::{AssetType, GlobPattern};
use crate::config::{ConfigDiagnostics, FieldPath};

/// One glob or an ordered list of globs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PipeSpec {
    One(String),
    Many(Vec<String>),
}

impl PipeSpec {
    /// Patterns in configured order.
    pub fn patterns(&self) -> &[String] {
        match self {
            Self::One(pattern) => std::slice::from_ref(pattern),
            Self::Many(patterns) => patterns,
        }
    }
}

impl From<&str> for PipeSpec {
    fn from(pattern: &str) -> Self {
        Self::One(pattern.to_string())
    }
}

/// Pipe name → globs, for one asset type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipeTable(pub BTreeMap<String, PipeSpec>);

impl PipeTable {
    /// The stock table: a single `app` pipe matching every file of the type.
    pub fn default_for(ty: AssetType) -> Self {
        let mut pipes = BTreeMap::new();
        pipes.insert(
            "app".to_string(),
            PipeSpec::One(format!("**/*.{}", ty.extension())),
        );
        Self(pipes)
    }

    pub fn get(&self, pipe: &str) -> Option<&PipeSpec> {
        self.0.get(pipe)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PipeSpec)> {
        self.0.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self, ty: AssetType, diag: &mut ConfigDiagnostics) {
        for (name, spec) in self.iter() {
            let field = FieldPath::key(ty.extension(), name);
            if name.is_empty() || name.contains('/') {
                diag.error(field.clone(), format!("invalid pipe name '{name}'"));
            }
            if spec.patterns().is_empty() {
                diag.error(field.clone(), "pipe has no glob patterns");
            }
            for pattern in spec.patterns() {
                if let Err(e) = GlobPattern::new(pattern) {
                    diag.error_with_hint(
                        field.clone(),
                        format!("invalid glob '{pattern}': {e}"),
                        "supported syntax: `*`, `**`, `?`, `[abc]`, `{a,b}`",
                    );
                }
            }
        }
    }
}
