//! Output wrapper templates.

use crate::domain::CompileOptions;

/// Where user templates put the compiled code.
pub const CONTENTS_PLACEHOLDER: &str = "<%= contents %>";

/// Code prefix every wrapper carries; `%output%` is the compiler's own
/// placeholder.
const PROCESS_SHIM: &str = "var process={env:{NODE_ENV:\"production\"}};%output%";

/// Build the `--output_wrapper` value for one unit.
///
/// A custom `wrapper` replaces the default (window config included); only
/// its first placeholder is filled. The source-map comment is always
/// appended.
pub fn output_wrapper(options: &CompileOptions, window_config: &str, output_filename: &str) -> String {
    let mut wrapper = match &options.wrapper {
        Some(template) => template.replacen(CONTENTS_PLACEHOLDER, PROCESS_SHIM, 1),
        None => {
            let prefix = if options.include_window_config {
                window_config
            } else {
                ""
            };
            format!("{prefix}(function(){{{PROCESS_SHIM}}})();")
        }
    };
    wrapper.push_str(&format!("\n//# sourceMappingURL={output_filename}.map\n"));
    wrapper
}
