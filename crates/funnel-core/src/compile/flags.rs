//! Compiler flag assembly.

use crate::domain::{BuildSwitches, CompileRequest, RuntimeStamp};

use super::config::CompilerConfig;
use super::sources;
use super::wrapper::output_wrapper;

/// Dev server that serves sources for local source maps.
pub const LOCAL_SOURCE_MAP_BASE: &str = "http://localhost:8000/";

const JS_MODULE_ROOTS: &[&str] = &["node_modules/", "build/patched-module/", "build/fake-module/"];

const HIDE_WARNINGS_FOR: &[&str] = &[
    "node_modules/",
    "build/patched-module/",
    // real type errors, silenced until fixed upstream
    "src/service.js",
    "3p/environment.js",
    "src/document-state.js",
];

/// Release builds fetch sources from the tagged repository.
pub fn source_map_base(switches: &BuildSwitches, stamp: &RuntimeStamp, repo: &str) -> String {
    if switches.production {
        format!("{repo}{}/", stamp.version)
    } else {
        LOCAL_SOURCE_MAP_BASE.to_string()
    }
}

/// Closure Compiler flags for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerFlags {
    pub compilation_level: &'static str,
    pub assume_function_wrapper: bool,
    pub language_in: &'static str,
    pub language_out: &'static str,
    pub externs: Vec<String>,
    pub js_module_root: Vec<String>,
    pub entry_point: String,
    pub process_common_js_modules: bool,
    /// Drops every input the entry point does not require.
    pub only_closure_dependencies: bool,
    pub output_wrapper: String,
    pub create_source_map: String,
    pub source_map_location_mapping: String,
    pub warning_level: &'static str,
    pub define: Vec<String>,
    pub jscomp_error: Option<&'static str>,
    pub hide_warnings_for: Vec<String>,
    pub js_output_file: String,
    pub js: Vec<String>,
}

impl CompilerFlags {
    /// `intermediate` is the scratch output path relative to the root.
    pub fn for_request(
        request: &CompileRequest,
        intermediate: &str,
        switches: &BuildSwitches,
        stamp: &RuntimeStamp,
        config: &CompilerConfig,
    ) -> Self {
        let options = &request.options;
        let check_types = options.check_types || switches.typecheck_only;

        let mut define = Vec::new();
        let mut jscomp_error = None;
        if check_types {
            // compilation level stays: whitespace-only would skip strict checks
            define.push("TYPECHECK_ONLY=true".to_string());
            jscomp_error = Some("checkTypes");
        }
        if switches.pseudo_names {
            define.push("PSEUDO_NAMES=true".to_string());
        }
        if switches.for_testing {
            define.push("FORTESTING=true".to_string());
        }

        Self {
            compilation_level: "SIMPLE_OPTIMIZATIONS",
            assume_function_wrapper: true,
            language_in: "ECMASCRIPT6",
            language_out: "ECMASCRIPT5",
            externs: sources::externs(&options.externs),
            js_module_root: JS_MODULE_ROOTS.iter().map(|s| s.to_string()).collect(),
            entry_point: request.entry_module.clone(),
            process_common_js_modules: true,
            only_closure_dependencies: true,
            output_wrapper: output_wrapper(options, &config.window_config, &request.output_filename),
            create_source_map: format!("{intermediate}.map"),
            source_map_location_mapping: format!(
                "|{}",
                source_map_base(switches, stamp, &config.source_map_repo)
            ),
            warning_level: "DEFAULT",
            define,
            jscomp_error,
            hide_warnings_for: HIDE_WARNINGS_FOR.iter().map(|s| s.to_string()).collect(),
            js_output_file: intermediate.to_string(),
            js: sources::source_globs(options.include_polyfills),
        }
    }

    /// Command-line form, `--name=value` per flag, lists repeated.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        push_value(&mut args, "compilation_level", self.compilation_level);
        push_value(&mut args, "language_in", self.language_in);
        push_value(&mut args, "language_out", self.language_out);
        push_list(&mut args, "externs", &self.externs);
        push_list(&mut args, "js_module_root", &self.js_module_root);
        push_value(&mut args, "entry_point", &self.entry_point);
        push_value(&mut args, "output_wrapper", &self.output_wrapper);
        push_value(&mut args, "create_source_map", &self.create_source_map);
        push_value(&mut args, "source_map_location_mapping", &self.source_map_location_mapping);
        push_value(&mut args, "warning_level", self.warning_level);
        push_list(&mut args, "define", &self.define);
        if let Some(check) = self.jscomp_error {
            push_value(&mut args, "jscomp_error", check);
        }
        push_list(&mut args, "hide_warnings_for", &self.hide_warnings_for);
        push_value(&mut args, "js_output_file", &self.js_output_file);
        push_list(&mut args, "js", &self.js);

        push_switch(&mut args, "assume_function_wrapper", self.assume_function_wrapper);
        push_switch(&mut args, "process_common_js_modules", self.process_common_js_modules);
        push_switch(&mut args, "only_closure_dependencies", self.only_closure_dependencies);

        args
    }
}

fn push_value(args: &mut Vec<String>, name: &str, value: &str) {
    args.push(format!("--{name}={value}"));
}

fn push_list(args: &mut Vec<String>, name: &str, values: &[String]) {
    for value in values {
        push_value(args, name, value);
    }
}

fn push_switch(args: &mut Vec<String>, name: &str, on: bool) {
    if on {
        args.push(format!("--{name}"));
    }
}
