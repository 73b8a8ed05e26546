//! `folio build` command implementation.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use clap::Args;
use folio_build::{BuildReport, SiteBuilder};
use folio_config::{CliSettings, Config};
use folio_theme::StaticInstall;

use super::ensure_project_dir;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the build command.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to configuration file (default: auto-discover folio.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Output directory (overrides config).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Disable caching; every document is interpreted again.
    #[arg(long)]
    no_cache: bool,

    /// Worker threads (default: all cores).
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Rebuild when sources change, until Ctrl-C.
    #[arg(short, long)]
    watch: bool,
}

impl BuildArgs {
    /// Execute the build command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails, the build aborts, or any
    /// document failed (outside watch mode).
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            source_dir: self.source_dir,
            output_dir: self.output_dir,
            cache_enabled: self.no_cache.then_some(false),
            threads: self.threads,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        ensure_project_dir(&config.project_dir)?;

        output.info(&format!(
            "Source: {}",
            config.source_resolved.path.display()
        ));
        output.info(&format!(
            "Output: {}",
            config.output_resolved.path.display()
        ));
        if config.cache_resolved.enabled {
            output.info(&format!(
                "Cache directory: {}",
                config.cache_resolved.dir.display()
            ));
        } else {
            output.info("Cache: disabled");
        }

        let source_dir = config.source_resolved.path.clone();
        let output_dir = config.output_resolved.path.clone();
        let debounce = Duration::from_millis(config.watch.debounce_ms);

        let builder = SiteBuilder::new(config)?;
        let start = Instant::now();
        let report = builder.run()?;
        print_report(&output, &report, start.elapsed());

        if self.watch {
            return watch_and_rebuild(builder, &source_dir, &output_dir, debounce);
        }

        if report.is_success() {
            output.success("Site built successfully");
            Ok(())
        } else {
            Err(CliError::Failed(report.failures.len()))
        }
    }
}

/// Rebuild once per batch of source changes until Ctrl-C.
fn watch_and_rebuild(
    builder: SiteBuilder,
    source_dir: &Path,
    output_dir: &Path,
    debounce: Duration,
) -> Result<(), CliError> {
    let output = Output::new();
    let (changes, handle) =
        folio_build::watch(source_dir, debounce, &[output_dir.to_path_buf()])?;
    output.info("Watching for changes (press Ctrl-C to stop)");

    let rebuilder = thread::spawn(move || {
        let output = Output::new();
        for batch in changes.iter() {
            for change in &batch {
                output.detail(&format!("{:?}: {}", change.kind, change.path.display()));
            }
            let start = Instant::now();
            match builder.run() {
                Ok(report) => print_report(&output, &report, start.elapsed()),
                Err(err) => output.error(&format!("Error: {err}")),
            }
        }
    });

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(tokio::signal::ctrl_c())?;

    output.info("Stopping");
    handle.stop();
    if rebuilder.join().is_err() {
        tracing::error!("Rebuild thread panicked");
    }
    Ok(())
}

fn print_report(output: &Output, report: &BuildReport, elapsed: Duration) {
    output.info(&format!(
        "Indexed {} nodes: {} interpreted, {} reused, {} rendered, {} copied in {elapsed:.2?}",
        report.indexed, report.interpreted, report.reused, report.rendered, report.copied,
    ));
    if let StaticInstall::Copied(count) = report.static_assets {
        output.detail(&format!("Installed {count} static asset(s)"));
    }
    for path in &report.skipped {
        output.warning(&format!("Skipped {path}: its place in the tree is taken"));
    }
    for failure in &report.failures {
        output.error(&format!("{}: {}", failure.reference_path, failure.error));
    }
}
