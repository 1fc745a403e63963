// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! otwgen main entry point - CLI and commands.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio::sync::watch;
use tracing::info;

use otwgen::config::{self, CliOptions, ResolvedConfig};
use otwgen::error::GenerateError;
use otwgen::generate::{Grouping, Pipeline};
use otwgen::loader::{self, LoadOptions};
use otwgen::output::{self, WriteOutcome};
use otwgen::telemetry::{init_telemetry, TelemetryConfig};

/// otwgen version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// otwgen - tracing wrappers for Go packages.
#[derive(Parser)]
#[command(name = "otwgen")]
#[command(author, version, about = "Generate tracing-span wrappers for Go packages", long_about = None)]
struct Cli {
    /// Show info-level logs
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Show debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Print a metrics report when done
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Subcommands for otwgen.
#[derive(Subcommand)]
enum Commands {
    /// Generate wrappers for the packages matching PATTERNS
    #[command(alias = "g")]
    Generate {
        /// Package patterns (directories, import paths, `./...`)
        #[arg(default_value = ".")]
        patterns: Vec<String>,

        /// Output directory
        #[arg(short = 'd', long = "dir", env = "OTWGEN_OUTPUT_DIR")]
        dir: Option<String>,

        /// Emit one file per package instead of one per source file
        #[arg(long)]
        per_package: bool,

        /// Print generated files instead of writing them
        #[arg(long)]
        stdout: bool,

        /// Number of generator workers
        #[arg(short = 'j', long)]
        jobs: Option<usize>,

        /// Glob of files or directories to skip (repeatable)
        #[arg(long = "exclude", value_name = "GLOB")]
        exclude: Vec<String>,
    },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Show version information
    Version,
}

/// Config subcommand actions.
#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Write an example .otwgen.json to the current directory
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_telemetry(&TelemetryConfig::from_flags(
        cli.verbose,
        cli.debug,
        cli.stats,
    ))?;

    match cli.command {
        Commands::Generate {
            patterns,
            dir,
            per_package,
            stdout,
            jobs,
            exclude,
        } => {
            let cli_options = CliOptions {
                output_dir: dir,
                grouping: per_package.then_some(Grouping::PerPackage),
                parallel_jobs: jobs,
                exclude,
                ..Default::default()
            };
            run_generate(&patterns, cli_options, stdout).await
        }
        Commands::Config { action } => handle_config(action),
        Commands::Version => {
            println!("otwgen {}", VERSION);
            Ok(())
        }
    }
}

fn workspace_root() -> anyhow::Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(config::find_workspace_root(&cwd).unwrap_or(cwd))
}

fn handle_config(action: Option<ConfigAction>) -> anyhow::Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            let config = config::load_config(&workspace_root()?, CliOptions::default())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Some(ConfigAction::Init) => {
            let cwd = std::env::current_dir()?;
            let path = config::init_config(&cwd, None)?;
            println!("Created config file: {}", path.display());
        }
    }
    Ok(())
}

async fn run_generate(
    patterns: &[String],
    cli_options: CliOptions,
    stdout: bool,
) -> anyhow::Result<()> {
    let config = config::load_config(&workspace_root()?, cli_options)?;

    let load_options = LoadOptions {
        root: std::env::current_dir()?,
        exclude: config.exclude.clone(),
    };
    let packages = loader::load_packages(patterns, &load_options)?;
    let errors = loader::print_errors(&packages);
    if errors > 0 {
        return Err(GenerateError::PackageDiagnostics(errors).into());
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    if stdout {
        print_to_stdout(&config, packages, cancel_rx).await
    } else {
        write_to_dir(&config, packages, cancel_rx).await
    }
}

async fn write_to_dir(
    config: &ResolvedConfig,
    packages: Vec<loader::Package>,
    cancel: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let dir = config.output_path();
    output::setup_dir(&dir).await?;

    let pipeline = Pipeline::new(config.generate_options());
    let mut rx = pipeline.run(packages, cancel.clone());

    let mut written = 0usize;
    while let Some(file) = rx.recv().await {
        match output::write_file(&dir, &file).await? {
            WriteOutcome::Written(path) => {
                written += 1;
                info!(source = %file.source, "Wrote {}", path.display());
                println!("{} {}", "wrote".green(), display_path(&path));
            }
            WriteOutcome::Unchanged(path) => {
                info!(source = %file.source, "Unchanged {}", path.display());
                println!("{} {}", "unchanged".dimmed(), display_path(&path));
            }
        }
    }

    if *cancel.borrow() {
        return Err(GenerateError::Cancelled.into());
    }
    info!("{} files written", written);
    Ok(())
}

async fn print_to_stdout(
    config: &ResolvedConfig,
    packages: Vec<loader::Package>,
    cancel: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let files =
        otwgen::generate::generate_all(packages, config.generate_options(), cancel.clone()).await;
    if *cancel.borrow() {
        return Err(GenerateError::Cancelled.into());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    output::print_files(&mut out, &files)?;
    Ok(())
}

fn display_path(path: &Path) -> String {
    let cwd = std::env::current_dir().unwrap_or_default();
    path.strip_prefix(&cwd).unwrap_or(path).display().to_string()
}
