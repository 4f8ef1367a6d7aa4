use std::fmt;

/// Pipeline stage an artifact belongs to.
///
/// Part of the artifact name, so a target's compiled, combined and
/// compressed forms never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Compile,
    Combine,
    Compress,
}

impl Stage {
    pub const ALL: [Self; 3] = [Self::Compile, Self::Combine, Self::Compress];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compile => "compile",
            Self::Combine => "combine",
            Self::Compress => "compress",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
