//! Closure Compiler task runner.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::domain::{BuildSwitches, CompileRequest, FunnelError, RuntimeStamp};
use crate::ports::TaskRunner;

use super::config::CompilerConfig;
use super::flags::CompilerFlags;
use super::scratch::{BUILD_CC, Scratch};
use super::sources;

/// What one successful unit produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledUnit {
    pub entry_module: String,
    /// Scratch output, relative to the project root.
    pub intermediate: String,
    /// `None` in typecheck-only builds.
    pub output: Option<PathBuf>,
    pub source_map: Option<PathBuf>,
    pub elapsed_ms: u64,
}

/// Runs the external compiler for one [`CompileRequest`].
///
/// Side effects, in order: optional build-dir reset, register-element
/// patch, stale intermediate removal, dead-code stubs, compiler run, then
/// (unless typecheck-only) the stamped output and its source map.
///
/// Staging touches directories shared by every unit, so it runs under a
/// lock; the compiler runs themselves overlap freely.
pub struct ClosureRunner {
    config: CompilerConfig,
    switches: BuildSwitches,
    stamp: RuntimeStamp,
    scratch: Scratch,
    staging: Mutex<()>,
}

impl ClosureRunner {
    pub fn new(config: CompilerConfig, switches: BuildSwitches, stamp: RuntimeStamp) -> Self {
        let scratch = Scratch::new(&config.root);
        Self {
            config,
            switches,
            stamp,
            scratch,
            staging: Mutex::new(()),
        }
    }

    pub fn switches(&self) -> &BuildSwitches {
        &self.switches
    }

    pub fn stamp(&self) -> &RuntimeStamp {
        &self.stamp
    }

    pub fn scratch(&self) -> &Scratch {
        &self.scratch
    }

    async fn stage(&self, request: &CompileRequest, intermediate: &str) -> Result<(), FunnelError> {
        let _staging = self.staging.lock().await;
        if !request.options.prevent_remove_and_make_dir {
            self.scratch.cleanup_build_dir().await?;
        }
        self.scratch.patch_register_element().await?;
        self.scratch.remove_file_if_exists(intermediate).await?;
        self.scratch
            .write_dead_code_stubs(&sources::dead_code_stubs(request.options.include_polyfills))
            .await
    }

    async fn invoke(&self, request: &CompileRequest, flags: &CompilerFlags) -> Result<(), FunnelError> {
        let mut cmd = Command::new(&self.config.java);
        if self.config.tiered_compilation {
            cmd.arg("-XX:+TieredCompilation");
        }
        cmd.arg("-jar")
            .arg(&self.config.compiler_jar)
            .args(flags.to_args())
            .current_dir(&self.config.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| FunnelError::io(&self.config.java, e))?;

        let waited = match self.config.compile_timeout {
            // Dropping the child on timeout kills it.
            Some(after) => tokio::time::timeout(after, child.wait_with_output())
                .await
                .map_err(|_| FunnelError::Timeout {
                    entry: request.entry_module.clone(),
                    after,
                })?,
            None => child.wait_with_output().await,
        };
        let output = waited.map_err(|e| FunnelError::io(&self.config.java, e))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            let message = match stderr.trim() {
                "" => format!("compiler exited with {}", output.status),
                s => s.to_string(),
            };
            return Err(FunnelError::Compilation {
                entry: request.entry_module.clone(),
                message,
            });
        }
        if !stderr.trim().is_empty() {
            // continue with warnings
            tracing::warn!(entry = %request.entry_module, warnings = %stderr.trim(), "compiler warnings");
        }
        Ok(())
    }

    /// Stamp the intermediate into the output dir and copy its source map.
    async fn emit(&self, request: &CompileRequest, intermediate: &str) -> Result<(PathBuf, PathBuf), FunnelError> {
        let compiled_path = self.scratch.path(intermediate);
        let compiled = tokio::fs::read_to_string(&compiled_path)
            .await
            .map_err(|e| FunnelError::io(&compiled_path, e))?;

        let out_dir = self.scratch.path(&request.output_dir);
        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(|e| FunnelError::io(&out_dir, e))?;

        let output = self.scratch.path(request.output_path());
        tokio::fs::write(&output, self.stamp.stamp(&compiled))
            .await
            .map_err(|e| FunnelError::io(&output, e))?;

        let map_from = self.scratch.path(format!("{intermediate}.map"));
        let map_to = self.scratch.path(request.source_map_path());
        tokio::fs::copy(&map_from, &map_to)
            .await
            .map_err(|e| FunnelError::io(&map_from, e))?;

        Ok((output, map_to))
    }
}

#[async_trait]
impl TaskRunner for ClosureRunner {
    type Task = CompileRequest;
    type Output = CompiledUnit;

    async fn run(&self, request: CompileRequest) -> Result<CompiledUnit, FunnelError> {
        let started = Instant::now();
        let intermediate = format!("{BUILD_CC}/{}", request.intermediate_name());
        tracing::info!(entry = %request.entry_module, "starting closure compiler");

        self.stage(&request, &intermediate).await?;

        let flags = CompilerFlags::for_request(
            &request,
            &intermediate,
            &self.switches,
            &self.stamp,
            &self.config,
        );
        self.invoke(&request, &flags).await?;

        let (output, source_map) = if self.switches.typecheck_only {
            tracing::info!(entry = %request.entry_module, "type check passed");
            (None, None)
        } else {
            let (output, map) = self.emit(&request, &intermediate).await?;
            tracing::info!(
                entry = %request.entry_module,
                output = %output.display(),
                via = %intermediate,
                "compiled"
            );
            (Some(output), Some(map))
        };

        Ok(CompiledUnit {
            entry_module: request.entry_module,
            intermediate,
            output,
            source_map,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::domain::{CompileOptions, ErrorKind};
    use std::path::Path;
    use std::time::Duration;

    /// Shell stand-in for `java -jar runner.jar`: writes the output file and
    /// map it was asked for, fails for entry points containing "broken",
    /// hangs for ones containing "slow".
    fn fake_java() -> String {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures/fake-closure.sh")
            .to_string_lossy()
            .into_owned()
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let upstream = dir.path().join(sources::UPSTREAM_REGISTER_ELEMENT);
        std::fs::create_dir_all(upstream.parent().unwrap()).unwrap();
        std::fs::write(upstream, "/* dre */").unwrap();
        dir
    }

    fn runner(root: &Path, switches: BuildSwitches) -> ClosureRunner {
        let config = CompilerConfig {
            root: root.to_path_buf(),
            java: fake_java(),
            tiered_compilation: false,
            compile_timeout: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        ClosureRunner::new(config, switches, RuntimeStamp::new("1461", "tok"))
    }

    #[tokio::test]
    async fn writes_stamped_output_and_map() {
        let dir = project();
        let runner = runner(dir.path(), BuildSwitches::default());

        let unit = runner
            .run(CompileRequest::new("./src/amp.js", "dist", "v0.js"))
            .await
            .unwrap();

        assert_eq!(unit.intermediate, "build/cc/_src_amp.js");
        let js = std::fs::read_to_string(dir.path().join("dist/v0.js")).unwrap();
        assert_eq!(js, "var version=\"1461\",token=\"tok\";");
        assert!(dir.path().join("dist/v0.js.map").exists());
        assert_eq!(unit.output, Some(dir.path().join("dist/v0.js")));

        // staging happened before the compiler ran
        assert!(dir.path().join(sources::PATCHED_REGISTER_ELEMENT).exists());
        assert!(dir.path().join("build/fake-module/src/polyfills/promise.js").exists());
    }

    #[tokio::test]
    async fn typecheck_only_writes_nothing() {
        let dir = project();
        let switches = BuildSwitches {
            typecheck_only: true,
            ..Default::default()
        };
        let unit = runner(dir.path(), switches)
            .run(CompileRequest::new("./src/amp.js", "dist", "v0.js"))
            .await
            .unwrap();

        assert!(unit.output.is_none());
        assert!(!dir.path().join("dist/v0.js").exists());
    }

    #[tokio::test]
    async fn compiler_failure_carries_stderr() {
        let dir = project();
        let err = runner(dir.path(), BuildSwitches::default())
            .run(CompileRequest::new("./src/broken.js", "dist", "b.js"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Compilation);
        assert!(err.to_string().contains("ERROR - parse error"));
    }

    #[tokio::test]
    async fn hung_compiler_times_out() {
        let dir = project();
        let mut runner = runner(dir.path(), BuildSwitches::default());
        runner.config.compile_timeout = Some(Duration::from_millis(200));

        let err = runner
            .run(CompileRequest::new("./src/slow.js", "dist", "s.js"))
            .await
            .unwrap_err();
        assert!(matches!(err, FunnelError::Timeout { .. }));
    }

    #[tokio::test]
    async fn prevent_reset_keeps_scratch_files() {
        let dir = project();
        let runner = runner(dir.path(), BuildSwitches::default());
        let marker = dir.path().join("build/fake-module/marker.js");
        std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
        std::fs::write(&marker, "keep").unwrap();

        let request = CompileRequest::new("./src/amp.js", "dist", "v0.js").with_options(CompileOptions {
            prevent_remove_and_make_dir: true,
            include_polyfills: true,
            ..Default::default()
        });
        runner.run(request).await.unwrap();

        assert!(marker.exists());
        // polyfills included: no polyfill stubs
        assert!(!dir.path().join("build/fake-module/src/polyfills/promise.js").exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_units_stage_without_clobbering_each_other() {
        use crate::queue::{AdmissionQueue, DEFAULT_MAX_PARALLEL};

        let dir = project();
        let queue = AdmissionQueue::new(
            runner(dir.path(), BuildSwitches::default()),
            DEFAULT_MAX_PARALLEL,
        );

        let subs: Vec<_> = (0..40)
            .map(|i| {
                queue.submit(CompileRequest::new(
                    format!("./src/unit-{i}.js"),
                    "dist",
                    format!("unit-{i}.js"),
                ))
            })
            .collect();

        let mut failures = Vec::new();
        for sub in subs {
            if let Err(e) = sub.await {
                failures.push(e.to_string());
            }
        }
        assert!(failures.is_empty(), "{failures:?}");

        for i in 0..40 {
            assert!(dir.path().join(format!("dist/unit-{i}.js")).exists(), "unit-{i}");
        }
        assert!(queue.counts().is_idle());
        assert_eq!(queue.counts().succeeded, 40);
    }
}
