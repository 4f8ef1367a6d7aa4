//! Configuration section definitions.
//!
//! | Module       | TOML Section                      | Purpose                      |
//! |--------------|-----------------------------------|------------------------------|
//! | `pipes`      | `[css]`, `[js]`                   | Pipe name → glob patterns    |
//! | `processors` | `[compilers]`, `[compressors]`    | External command processors  |
//! | `serve`      | `[serve]`                         | HTTP host                    |

mod pipes;
mod processors;
mod serve;

pub use pipes::{PipeSpec, PipeTable};
pub use processors::{CommandSpec, ProcessorSection, normalize_extension};
pub use serve::ServeConfig;
