//! Asset type definitions.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

/// Target format of a pipe. Exactly one type per recognized extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    /// Stylesheets (`.css`).
    Style,
    /// Scripts (`.js`).
    Script,
}

impl AssetType {
    pub const ALL: [Self; 2] = [Self::Style, Self::Script];

    /// Target extension without the dot; also the config section name.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Style => "css",
            Self::Script => "js",
        }
    }

    /// `.css` / `.js`
    pub fn dotted_extension(self) -> String {
        format!(".{}", self.extension())
    }

    pub const fn default_content_type(self) -> &'static str {
        match self {
            Self::Style => "text/css",
            Self::Script => "application/javascript",
        }
    }

    /// Match an extension, with or without the leading dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        Self::ALL
            .into_iter()
            .find(|ty| ty.extension().eq_ignore_ascii_case(ext))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AssetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "style" | "css" => Ok(Self::Style),
            "script" | "js" => Ok(Self::Script),
            other => Err(format!("unknown asset type '{other}' (expected css or js)")),
        }
    }
}
