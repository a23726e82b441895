//! Wheelhouse CLI - download, verify, and prune Python wheels for
//! offline installation.
//!
//! Each subcommand is a thin driver over the library: it reads the
//! well-known relative layout (a requirements file, a `downloads/`
//! directory, a failures file), processes packages one at a time, and
//! exits 0 only on full success. Per-package failures are collected
//! into the failures file rather than aborting the batch; Ctrl-C exits
//! cleanly and leaves partial downloads resumable.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use error::CliError;
use wheelhouse::BundleConfig;

#[derive(Parser)]
#[command(
    name = "wheelhouse",
    version,
    about = "Download, verify, and prune Python wheels for offline installation"
)]
struct Cli {
    /// Target interpreter version as MAJOR.MINOR; probed from python3 when omitted
    #[arg(long, global = true, value_name = "VERSION")]
    python: Option<String>,

    /// Directory downloaded artifacts are stored in
    #[arg(long, global = true, default_value = "downloads", value_name = "DIR")]
    downloads: PathBuf,

    /// File recording packages that failed to download
    #[arg(
        long,
        global = true,
        default_value = "failed_packages.txt",
        value_name = "FILE"
    )]
    failures_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the requirements file and download every wheel
    Download {
        /// Requirements file (default: requirements_full.txt when
        /// present, else requirements.txt)
        #[arg(long, value_name = "FILE")]
        requirements: Option<PathBuf>,
    },

    /// Delegate bulk fetching to `pip download`, then sweep the result
    Simple {
        /// Requirements file (same default as `download`)
        #[arg(long, value_name = "FILE")]
        requirements: Option<PathBuf>,
    },

    /// Retry every package recorded in the failures file
    Retry,

    /// Show the recorded failures
    Failed,

    /// Delete wheels that cannot run on the target platform
    Clean,

    /// Delete corrupt wheel archives
    Check,

    /// Download a single package
    Fetch {
        /// Package name as known to the registry
        name: String,

        /// Specific version (default: latest)
        #[arg(long, value_name = "VERSION")]
        version: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    // Partial files are append-only, so bailing out here cannot corrupt
    // anything; the next run resumes where this one stopped.
    ctrlc::set_handler(|| {
        eprintln!("\ninterrupted; partial downloads are kept and will resume on the next run");
        process::exit(1);
    })
    .expect("failed to install interrupt handler");

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let base_config = BundleConfig::new(cli.downloads).with_failures_file(cli.failures_file);
    let python = cli.python.as_deref();

    match cli.command {
        Commands::Download { requirements } => {
            let config = with_requirements(base_config, requirements);
            let target = commands::common::resolve_target(python)?;
            commands::download::run(&config, &target)
        }
        Commands::Simple { requirements } => {
            let config = with_requirements(base_config, requirements);
            let target = commands::common::resolve_target(python)?;
            commands::simple::run(&config, &target)
        }
        Commands::Retry => {
            let target = commands::common::resolve_target(python)?;
            commands::retry::run(&base_config, &target)
        }
        Commands::Failed => commands::failed::run(&base_config),
        Commands::Clean => {
            let target = commands::common::resolve_target(python)?;
            commands::clean::run(&base_config, &target)
        }
        Commands::Check => commands::check::run(&base_config),
        Commands::Fetch { name, version } => {
            let target = commands::common::resolve_target(python)?;
            commands::fetch::run(&base_config, &target, &name, version.as_deref())
        }
    }
}

fn with_requirements(config: BundleConfig, requirements: Option<PathBuf>) -> BundleConfig {
    match requirements {
        Some(path) => config.with_requirements_file(path),
        None => config,
    }
}
