//! Source globs, dead-code stubs and externs handed to the compiler.
//!
//! Globs are passed through as `--js` arguments; the compiler expands them
//! itself (a leading `!` excludes).

/// Patched copy of document-register-element that the compiler can resolve.
pub const PATCHED_REGISTER_ELEMENT: &str =
    "build/patched-module/document-register-element/build/document-register-element.max.js";

/// Upstream file the patched copy is made from.
pub const UPSTREAM_REGISTER_ELEMENT: &str =
    "node_modules/document-register-element/build/document-register-element.max.js";

const BASE_SOURCES: &[&str] = &[
    "3p/**/*.js",
    "ads/**/*.js",
    "extensions/**/*.js",
    "build/**/*.js",
    "!build/cc/**",
    "!build/polyfills.js",
    "!build/polyfills/**/*.js",
    "src/**/*.js",
    "!third_party/babel/custom-babel-helpers.js",
    // not part of the runtime or extension binaries
    "!extensions/amp-access/0.1/amp-login-done.js",
    "builtins/**.js",
    "third_party/caja/html-sanitizer.js",
    "third_party/closure-library/sha384-generated.js",
    "third_party/mustache/**/*.js",
    "node_modules/promise-pjs/promise.js",
    PATCHED_REGISTER_ELEMENT,
    "node_modules/core-js/modules/**.js",
    // duplicates of the modules one level up
    "!node_modules/core-js/modules/library/**.js",
    "!**_test.js",
    "!**/test-*.js",
    "!**/*.extern.js",
];

const ALWAYS_STUBBED: &[&str] = &["build/fake-module/third_party/babel/custom-babel-helpers.js"];

const POLYFILL_STUBS: &[&str] = &[
    "build/fake-module/src/polyfills.js",
    "build/fake-module/src/polyfills/promise.js",
    "build/fake-module/src/polyfills/math-sign.js",
];

const DEFAULT_EXTERNS: &[&str] = &[
    "build-system/amp.extern.js",
    "third_party/closure-compiler/externs/intersection_observer.js",
];

/// Contents written into every stub.
pub const DEAD_CODE_STUB: &str = "// Not needed in closure compiler\nexport function deadCode() {}";

/// `--js` globs for one unit.
///
/// Polyfills ship once, with the main binary: units that include them skip
/// the fake stubs, every other unit skips the real sources.
pub fn source_globs(include_polyfills: bool) -> Vec<String> {
    let mut globs: Vec<String> = BASE_SOURCES.iter().map(|s| s.to_string()).collect();
    if include_polyfills {
        globs.push("!build/fake-module/src/polyfills.js".into());
        globs.push("!build/fake-module/src/polyfills/**/*.js".into());
    } else {
        globs.push("!src/polyfills.js".into());
        globs.push("!src/polyfills/**/*.js".into());
    }
    globs
}

/// Files that must exist (as stubs) so module resolution succeeds for
/// sources this unit leaves out.
pub fn dead_code_stubs(include_polyfills: bool) -> Vec<&'static str> {
    let mut stubs = ALWAYS_STUBBED.to_vec();
    if !include_polyfills {
        stubs.extend_from_slice(POLYFILL_STUBS);
    }
    stubs
}

/// Default externs followed by the unit's extras.
pub fn externs(extra: &[String]) -> Vec<String> {
    DEFAULT_EXTERNS
        .iter()
        .map(|s| s.to_string())
        .chain(extra.iter().cloned())
        .collect()
}
