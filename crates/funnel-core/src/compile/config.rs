//! Compiler configuration loaded from the environment.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::RuntimeStamp;
use crate::queue::DEFAULT_MAX_PARALLEL;

pub const DEFAULT_COMPILER_JAR: &str = "build-system/runner/dist/runner.jar";
pub const DEFAULT_SOURCE_MAP_REPO: &str = "https://raw.githubusercontent.com/ampproject/amphtml/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("cannot read window config template {}: {source}", .path.display())]
    WindowConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything the Closure runner needs besides the request itself.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Project root; all relative paths (sources, scratch dirs, outputs)
    /// resolve against it and the compiler runs inside it.
    pub root: PathBuf,
    pub java: String,
    pub compiler_jar: PathBuf,
    pub tiered_compilation: bool,
    /// Prepended to the default wrapper when a unit asks for it.
    pub window_config: String,
    /// Release source maps point at `<repo><version>/`.
    pub source_map_repo: String,
    /// No limit when `None`.
    pub compile_timeout: Option<Duration>,
    pub max_parallel: NonZeroUsize,
    /// Pinned runtime version; generated per build when unset.
    pub runtime_version: Option<String>,
    pub runtime_token: Option<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            java: "java".to_string(),
            compiler_jar: PathBuf::from(DEFAULT_COMPILER_JAR),
            tiered_compilation: true,
            window_config: String::new(),
            source_map_repo: DEFAULT_SOURCE_MAP_REPO.to_string(),
            compile_timeout: None,
            max_parallel: DEFAULT_MAX_PARALLEL,
            runtime_version: None,
            runtime_token: None,
        }
    }
}

impl CompilerConfig {
    /// Read `FUNNEL_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(root) = lookup("FUNNEL_ROOT") {
            config.root = PathBuf::from(root);
        }
        if let Some(java) = lookup("FUNNEL_JAVA") {
            config.java = java;
        }
        if let Some(jar) = lookup("FUNNEL_COMPILER_JAR") {
            config.compiler_jar = PathBuf::from(jar);
        }
        if let Some(value) = lookup("FUNNEL_TIERED_COMPILATION") {
            config.tiered_compilation = parse_bool("FUNNEL_TIERED_COMPILATION", &value)?;
        }
        if let Some(repo) = lookup("FUNNEL_SOURCE_MAP_REPO") {
            config.source_map_repo = if repo.ends_with('/') {
                repo
            } else {
                format!("{repo}/")
            };
        }
        if let Some(value) = lookup("FUNNEL_MAX_PARALLEL") {
            config.max_parallel = value
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|_| invalid("FUNNEL_MAX_PARALLEL", "a positive integer", &value))?;
        }
        if let Some(value) = lookup("FUNNEL_COMPILE_TIMEOUT_SECS") {
            let secs = value
                .trim()
                .parse::<u64>()
                .map_err(|_| invalid("FUNNEL_COMPILE_TIMEOUT_SECS", "a number of seconds", &value))?;
            // 0 disables the limit
            config.compile_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        config.runtime_version = lookup("FUNNEL_RUNTIME_VERSION");
        config.runtime_token = lookup("FUNNEL_RUNTIME_TOKEN");
        if let Some(path) = lookup("FUNNEL_WINDOW_CONFIG_FILE") {
            let path = PathBuf::from(path);
            config.window_config = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::WindowConfig { path, source })?;
        }

        Ok(config)
    }

    /// Pinned version and token, each generated when not configured.
    pub fn runtime_stamp(&self) -> RuntimeStamp {
        let generated = RuntimeStamp::generate();
        RuntimeStamp::new(
            self.runtime_version.clone().unwrap_or(generated.version),
            self.runtime_token.clone().unwrap_or(generated.token),
        )
    }
}

fn invalid(name: &'static str, expected: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        expected,
        value: value.to_string(),
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(name, "a boolean", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = CompilerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.max_parallel.get(), 4);
        assert_eq!(config.java, "java");
        assert_eq!(config.compiler_jar, PathBuf::from(DEFAULT_COMPILER_JAR));
        assert!(config.tiered_compilation);
        assert!(config.compile_timeout.is_none());
        assert!(config.window_config.is_empty());
    }

    #[test]
    fn overrides_are_applied() {
        let config = CompilerConfig::from_lookup(lookup(&[
            ("FUNNEL_MAX_PARALLEL", "2"),
            ("FUNNEL_COMPILE_TIMEOUT_SECS", "90"),
            ("FUNNEL_SOURCE_MAP_REPO", "https://example.test/repo"),
            ("FUNNEL_TIERED_COMPILATION", "off"),
        ]))
        .unwrap();
        assert_eq!(config.max_parallel.get(), 2);
        assert_eq!(config.compile_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.source_map_repo, "https://example.test/repo/");
        assert!(!config.tiered_compilation);
    }

    #[test]
    fn runtime_stamp_prefers_configured_values() {
        let config = CompilerConfig::from_lookup(lookup(&[
            ("FUNNEL_RUNTIME_VERSION", "1461"),
            ("FUNNEL_RUNTIME_TOKEN", "prod-token"),
        ]))
        .unwrap();
        let stamp = config.runtime_stamp();
        assert_eq!(stamp.version, "1461");
        assert_eq!(stamp.token, "prod-token");
    }

    #[test]
    fn runtime_stamp_is_generated_when_unset() {
        let config = CompilerConfig::from_lookup(lookup(&[("FUNNEL_RUNTIME_TOKEN", "tok")])).unwrap();
        assert!(config.runtime_version.is_none());
        let stamp = config.runtime_stamp();
        assert!(!stamp.version.is_empty());
        assert!(stamp.version.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(stamp.token, "tok");
    }

    #[test]
    fn zero_timeout_means_unlimited() {
        let config =
            CompilerConfig::from_lookup(lookup(&[("FUNNEL_COMPILE_TIMEOUT_SECS", "0")])).unwrap();
        assert!(config.compile_timeout.is_none());
    }

    #[test]
    fn zero_parallelism_is_rejected() {
        let err = CompilerConfig::from_lookup(lookup(&[("FUNNEL_MAX_PARALLEL", "0")])).unwrap_err();
        assert!(err.to_string().contains("FUNNEL_MAX_PARALLEL"));
    }

    #[test]
    fn window_config_is_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("window-config.js");
        std::fs::write(&path, "self.AMP_CONFIG||(self.AMP_CONFIG={});").unwrap();

        let config = CompilerConfig::from_lookup(lookup(&[(
            "FUNNEL_WINDOW_CONFIG_FILE",
            path.to_str().unwrap(),
        )]))
        .unwrap();
        assert_eq!(config.window_config, "self.AMP_CONFIG||(self.AMP_CONFIG={});");
    }

    #[test]
    fn missing_window_config_file_is_an_error() {
        let err = CompilerConfig::from_lookup(lookup(&[(
            "FUNNEL_WINDOW_CONFIG_FILE",
            "/definitely/not/here.js",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::WindowConfig { .. }));
    }
}
