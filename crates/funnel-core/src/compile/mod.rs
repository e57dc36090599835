//! Compile - everything around one Closure Compiler invocation.
//!
//! - **config**: `CompilerConfig` from `FUNNEL_*` env vars
//! - **sources**: `--js` globs, dead-code stubs, externs
//! - **wrapper**: `--output_wrapper` templates
//! - **flags**: full flag set for one unit
//! - **scratch**: `build/` staging (reset, stubs, register-element patch)
//! - **closure**: `ClosureRunner`, the production `TaskRunner`

pub mod closure;
pub mod config;
pub mod flags;
pub mod scratch;
pub mod sources;
pub mod wrapper;

pub use self::closure::{ClosureRunner, CompiledUnit};
pub use self::config::{CompilerConfig, ConfigError};
pub use self::flags::CompilerFlags;
pub use self::scratch::Scratch;
