//! `[compilers]` and `[compressors]` sections.
//!
//! Map a source extension to an external command. The command receives the
//! source on stdin and must print the transformed content on stdout.
//!
//! # Example
//!
//! ```toml
//! [compilers.".coffee"]
//! command = ["coffee", "--compile", "--print", "--stdio"]
//!
//! [compressors.".js"]
//! command = ["terser", "--compress", "--mangle"]
//! ```
//!
//! Keys are normalized to a leading-dot extension, so `coffee` and
//! `.coffee` are equivalent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// An external processor invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSpec {
    /// Program followed by its arguments.
    pub command: Vec<String>,
}

/// Extension → command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessorSection(pub BTreeMap<String, CommandSpec>);

impl ProcessorSection {
    /// Rewrite keys to `.ext` form.
    pub fn normalize(&mut self) {
        let entries = std::mem::take(&mut self.0);
        self.0 = entries
            .into_iter()
            .map(|(ext, spec)| (normalize_extension(&ext), spec))
            .collect();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CommandSpec)> {
        self.0.iter().map(|(ext, spec)| (ext.as_str(), spec))
    }

    pub fn validate(&self, section: &str, diag: &mut ConfigDiagnostics) {
        for (ext, spec) in self.iter() {
            if spec.command.first().is_none_or(|program| program.is_empty()) {
                diag.error(
                    FieldPath::key(section, ext),
                    "command must name a program",
                );
            }
        }
    }
}

/// `coffee` / `.coffee` → `.coffee`
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}
