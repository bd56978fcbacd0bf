//! tiercopy - adaptive concurrent file copying tool
//!
//! Copies a file or a directory tree, spreading small and medium files over a worker
//! pool and copying large files one at a time, with live progress and Ctrl-C
//! cancellation.

mod json_output;
mod progress;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use dialoguer::Confirm;
use json_output::CopyResultJson;
use progress::ProgressRenderer;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tiercopy_config::{Config, ConfigLoader};
use tiercopy_engine::{CopyEngine, CopyReport, CopyRequest, JobHandle};
use tiercopy_types::{format_bytes, Cancellable, Error, JobStatus, SourceKind};
use tracing::{info, warn};

/// tiercopy - adaptive concurrent file copying tool
#[derive(Parser)]
#[command(
    name = "tiercopy",
    version = env!("CARGO_PKG_VERSION"),
    about = "Adaptive concurrent file copying tool",
    long_about = "tiercopy copies a file or a directory tree.\n\
                  Small and medium files are copied by a worker pool sized to the machine,\n\
                  large files one at a time, and unchanged files are skipped."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a file or directory
    Copy {
        /// Source path
        source: PathBuf,
        /// Destination path
        destination: PathBuf,
        /// Source kind; detected from the source when omitted
        #[arg(short, long, value_enum)]
        kind: Option<KindArg>,
        /// Overwrite an existing destination file without asking
        #[arg(short, long)]
        yes: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum KindArg {
    File,
    Dir,
}

impl From<KindArg> for SourceKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::File => SourceKind::File,
            KindArg::Dir => SourceKind::Directory,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ConfigLoader::load_default().context("Failed to load configuration")?,
    };

    init_logging(&config, cli.debug, cli.quiet, cli.verbose)?;

    info!("tiercopy v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Copy {
            source,
            destination,
            kind,
            yes,
            json,
        } => {
            let mut request = CopyRequest::new(source, destination);
            if let Some(kind) = kind {
                request = request.with_kind(kind.into());
            }
            copy_command(config, request, yes, json, cli.quiet).await
        }
        Commands::Config { default } => {
            config_command(&config, default)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(config: &Config, debug: bool, quiet: bool, verbose: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log filter")?;

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    if config.logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }

    Ok(())
}

async fn copy_command(
    config: Config,
    request: CopyRequest,
    yes: bool,
    json: bool,
    quiet: bool,
) -> Result<ExitCode> {
    let show_current_file = config.progress.show_current_file;
    let refresh = config.progress.refresh_interval();
    let engine = CopyEngine::with_config(config);
    let chatty = !quiet && !json;

    if chatty {
        println!(
            "{} Copying {} to {}",
            style("→").green().bold(),
            style(request.source.display()).cyan(),
            style(request.destination.display()).cyan()
        );
    }

    let (handle, request) = match engine.start_copy(request.clone()).await {
        Ok(handle) => (handle, request),
        Err(Error::DestinationExists { path }) => {
            if !(yes || confirm_overwrite(&path)?) {
                if chatty {
                    println!("{} Copy aborted, nothing was changed", style("ℹ").yellow());
                }
                return Ok(ExitCode::SUCCESS);
            }
            let request = request.overwrite(true);
            (engine.start_copy(request.clone()).await?, request)
        }
        Err(e) => return Err(e.into()),
    };

    let ctrl_c = {
        let handle = handle.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling copy");
                handle.cancel();
            }
        })
    };

    let renderer = ProgressRenderer::new(!chatty, show_current_file);
    let report = watch_job(&handle, &renderer, refresh).await?;
    ctrl_c.abort();
    renderer.finish(&report.snapshot);

    if json {
        let output = CopyResultJson::from_report(&request, &report);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !quiet {
        print_report(&report);
    }

    Ok(ExitCode::from(exit_code(&report.status)))
}

/// Poll the job at the configured cadence until it reports
async fn watch_job(
    handle: &JobHandle,
    renderer: &ProgressRenderer,
    refresh: std::time::Duration,
) -> Result<CopyReport> {
    let mut ticker = tokio::time::interval(refresh);
    let wait = handle.wait();
    tokio::pin!(wait);

    loop {
        tokio::select! {
            report = &mut wait => return Ok(report?),
            _ = ticker.tick() => renderer.update(&handle.poll()),
        }
    }
}

fn confirm_overwrite(path: &Path) -> Result<bool> {
    Confirm::new()
        .with_prompt(format!("Target file {} exists. Overwrite?", path.display()))
        .default(false)
        .interact()
        .context("Failed to read confirmation")
}

fn exit_code(status: &JobStatus) -> u8 {
    match status {
        JobStatus::Completed => 0,
        JobStatus::Cancelled => 130,
        _ => 1,
    }
}

fn config_command(config: &Config, default: bool) -> Result<()> {
    let (title, shown) = if default {
        ("Default configuration:", Config::default())
    } else {
        ("Current configuration:", config.clone())
    };

    println!("{} {}", style("⚙").blue().bold(), title);
    print!("{}", serde_yaml::to_string(&shown)?);

    if !default {
        match ConfigLoader::config_exists() {
            Some(path) => println!("# loaded from {}", path.display()),
            None => println!("# no configuration file found, using defaults"),
        }
    }

    println!();
    println!(
        "{} {} logical / {} physical CPUs",
        style("ℹ").cyan(),
        num_cpus::get(),
        num_cpus::get_physical()
    );
    Ok(())
}

fn print_report(report: &CopyReport) {
    let snapshot = &report.snapshot;
    let headline = match &report.status {
        JobStatus::Completed => style(snapshot.status_text.clone()).green().bold(),
        JobStatus::Cancelled => style(snapshot.status_text.clone()).yellow().bold(),
        _ => style(snapshot.status_text.clone()).red().bold(),
    };

    println!();
    println!("{}", headline);
    println!("{}", style("Copy Statistics:").bold().underlined());
    println!(
        "  Files: {}/{}",
        style(snapshot.files_completed).green(),
        snapshot.files_total
    );
    println!("  Files copied: {}", style(report.summary.files_copied).green());
    println!(
        "  Files skipped (unchanged): {}",
        style(report.summary.files_skipped).yellow()
    );
    println!(
        "  Bytes: {} of {}",
        style(format_bytes(snapshot.copied_bytes)).green(),
        format_bytes(snapshot.total_bytes)
    );
    println!(
        "  Duration: {}",
        style(format_duration(snapshot.elapsed)).blue()
    );
    println!(
        "  Transfer rate: {}",
        style(format!("{:.2} MB/s", snapshot.throughput_mib_per_sec())).blue()
    );
    if report.summary.workers > 0 {
        println!("  Workers: {}", style(report.summary.workers).cyan());
    }
}

fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
