//! Process-level switches and the runtime stamp baked into outputs.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Flags read once per process; never re-validated per unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSwitches {
    /// A release build type was requested (prod or canary).
    pub production: bool,
    /// Run the compiler for type errors only; write no output.
    pub typecheck_only: bool,
    /// Ask the compiler for readable pseudo names.
    pub pseudo_names: bool,
    /// Testing build (`FORTESTING=true`).
    pub for_testing: bool,
}

/// Version and token substituted for `$internalRuntimeVersion$` and
/// `$internalRuntimeToken$` in compiled output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStamp {
    pub version: String,
    pub token: String,
}

impl RuntimeStamp {
    pub const VERSION_PLACEHOLDER: &'static str = "$internalRuntimeVersion$";
    pub const TOKEN_PLACEHOLDER: &'static str = "$internalRuntimeToken$";

    pub fn new(version: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            token: token.into(),
        }
    }

    /// Version from the current time (epoch millis), random hex token.
    pub fn generate() -> Self {
        let version = chrono::Utc::now().timestamp_millis().to_string();
        let token = format!("{:016x}", rand::thread_rng().r#gen::<u64>());
        Self { version, token }
    }

    pub fn is_development(&self) -> bool {
        self.token.contains("development")
    }

    /// Substitute both placeholders everywhere in `source`.
    pub fn stamp(&self, source: &str) -> String {
        source
            .replace(Self::VERSION_PLACEHOLDER, &self.version)
            .replace(Self::TOKEN_PLACEHOLDER, &self.token)
    }
}
