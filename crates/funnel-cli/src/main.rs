use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use funnel_core::compile::{CompilerConfig, Scratch};
use funnel_core::domain::BuildManifest;
use funnel_core::impls::{AbortOnFirstFailure, KeepGoing};
use funnel_core::ports::FailurePolicy;
use funnel_core::{BuildDriver, BuildSwitches};

#[derive(Parser, Debug)]
#[command(name = "funnel")]
#[command(about = "Rate-limited Closure Compiler builds")]
struct Args {
    /// Release build type (prod, canary, ...). Any value marks a production build.
    #[arg(long = "type", global = true, value_name = "TYPE")]
    build_type: Option<String>,

    /// Only type-check; no output files are written
    #[arg(long, alias = "typecheck_only", global = true)]
    typecheck_only: bool,

    /// Compile with readable pseudo names
    #[arg(long, alias = "pseudo_names", global = true)]
    pseudo_names: bool,

    /// Testing build
    #[arg(long, global = true)]
    fortesting: bool,

    /// Concurrent compiler invocations (overrides FUNNEL_MAX_PARALLEL)
    #[arg(long, global = true, value_name = "N")]
    max_parallel: Option<NonZeroUsize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile every unit listed in a JSON manifest
    Compile {
        #[arg(long, value_name = "PATH")]
        manifest: PathBuf,

        /// Keep compiling after a failure and report all failures at the end
        #[arg(long)]
        keep_going: bool,

        /// Write the build report as JSON
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// Reset the scratch directories under build/
    Clean,
}

impl Args {
    fn switches(&self) -> BuildSwitches {
        BuildSwitches {
            production: self.build_type.is_some(),
            typecheck_only: self.typecheck_only,
            pseudo_names: self.pseudo_names,
            for_testing: self.fortesting,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn read_manifest(path: &Path) -> Result<BuildManifest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading manifest {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing manifest {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let switches = args.switches();

    let mut config = CompilerConfig::from_env().context("loading FUNNEL_* configuration")?;
    if let Some(n) = args.max_parallel {
        config.max_parallel = n;
    }

    match args.command {
        Command::Clean => {
            Scratch::new(&config.root).cleanup_build_dir().await?;
            tracing::info!(root = %config.root.display(), "build dir reset");
        }
        Command::Compile {
            manifest,
            keep_going,
            report,
        } => {
            let manifest = read_manifest(&manifest)?;
            let stamp = config.runtime_stamp();
            tracing::info!(version = %stamp.version, production = switches.production, "runtime stamp");

            let driver = BuildDriver::closure(config, switches, stamp);
            let policy: &dyn FailurePolicy = if keep_going {
                &KeepGoing
            } else {
                &AbortOnFirstFailure
            };
            let build = driver.run(manifest.units, policy).await?;

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&build)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("writing report {}", path.display()))?;
            }
            if !build.is_success() {
                bail!(
                    "{} of {} units failed",
                    build.failures.len(),
                    build.failures.len() + build.compiled.len()
                );
            }
        }
    }

    Ok(())
}
