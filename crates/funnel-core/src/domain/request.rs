//! Compile requests: one per compilation unit.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Per-unit knobs. Every field is optional in a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Force type-check mode for this unit.
    pub check_types: bool,

    /// Skip the scratch-directory reset before compiling.
    pub prevent_remove_and_make_dir: bool,

    /// Custom output wrapper; `<%= contents %>` marks where the code goes.
    pub wrapper: Option<String>,

    /// Prepend the window-config template to the default wrapper.
    pub include_window_config: bool,

    /// Compile the real polyfills instead of dead-code stubs.
    pub include_polyfills: bool,

    /// Extra extern files on top of the defaults.
    pub externs: Vec<String>,
}

/// One compilation unit handed to the admission queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileRequest {
    /// Module path of the entry point, e.g. `./src/amp.js`.
    pub entry_module: String,
    pub output_dir: PathBuf,
    pub output_filename: String,
    #[serde(default)]
    pub options: CompileOptions,
}

impl CompileRequest {
    pub fn new(
        entry_module: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        output_filename: impl Into<String>,
    ) -> Self {
        Self {
            entry_module: entry_module.into(),
            output_dir: output_dir.into(),
            output_filename: output_filename.into(),
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Scratch file name under `build/cc/`.
    ///
    /// `./src/amp.js` -> `_src_amp.js`: slashes become underscores, then one
    /// leading dot is dropped.
    pub fn intermediate_name(&self) -> String {
        let flat = self.entry_module.replace('/', "_");
        match flat.strip_prefix('.') {
            Some(rest) => rest.to_string(),
            None => flat,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_filename)
    }

    pub fn source_map_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.map", self.output_filename))
    }
}

/// Manifest file read by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildManifest {
    pub units: Vec<CompileRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::relative("./src/amp.js", "_src_amp.js")]
    #[case::extension("./extensions/amp-ad/0.1/amp-ad.js", "_extensions_amp-ad_0.1_amp-ad.js")]
    #[case::no_dot("src/amp.js", "src_amp.js")]
    #[case::single_dot_only("../3p/frame.js", "._3p_frame.js")]
    fn intermediate_name_flattens_entry(#[case] entry: &str, #[case] expected: &str) {
        let req = CompileRequest::new(entry, "dist", "v0.js");
        assert_eq!(req.intermediate_name(), expected);
    }

    #[test]
    fn output_paths_follow_filename() {
        let req = CompileRequest::new("./src/amp.js", "dist", "v0.js");
        assert_eq!(req.output_path(), PathBuf::from("dist/v0.js"));
        assert_eq!(req.source_map_path(), PathBuf::from("dist/v0.js.map"));
    }

    #[test]
    fn manifest_options_default_when_missing() {
        let manifest: BuildManifest = serde_json::from_value(serde_json::json!({
            "units": [
                { "entry_module": "./src/amp.js", "output_dir": "dist", "output_filename": "v0.js",
                  "options": { "include_polyfills": true } },
                { "entry_module": "./3p/integration.js", "output_dir": "dist.3p", "output_filename": "f.js" }
            ]
        }))
        .unwrap();

        assert_eq!(manifest.units.len(), 2);
        assert!(manifest.units[0].options.include_polyfills);
        assert!(!manifest.units[0].options.check_types);
        assert_eq!(manifest.units[1].options, CompileOptions::default());
    }
}
