use crate::cli::SweepArgs;
use crate::config::PartialSweepConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use lyao::engine::command::SystemRunner;
use lyao::engine::progress::ProgressReporter;
use lyao::workflows::sweep::{self, SweepSummary};
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: SweepArgs) -> Result<()> {
    let partial_config = PartialSweepConfig::from_file(&args.config)?;
    let base_dir = args.config.parent().unwrap_or(Path::new("."));
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args, base_dir)?;

    let total = config.total_runs();
    println!(
        "Sweeping {} run(s) for {} into {}",
        total,
        config.location,
        config.paths.archive_root.display()
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_sink(progress_handler.get_callback());
    let summary = sweep::run(&config, &mut SystemRunner, &reporter)?;

    println!("{}", render_summary(&summary));
    if summary.failed.is_empty() {
        Ok(())
    } else {
        warn!(failed = summary.failed.len(), "Sweep finished with failed runs");
        Err(CliError::IncompleteSweep {
            failed: summary.failed.len(),
            total,
        })
    }
}

fn render_summary(summary: &SweepSummary) -> String {
    let mut out = format!(
        "{} run(s) archived under {}",
        summary.completed,
        summary.archive_root.display()
    );
    if !summary.failed.is_empty() {
        out.push_str(&format!("\n{} run(s) failed:", summary.failed.len()));
        for failure in &summary.failed {
            out.push_str(&format!("\n  {}: {}", failure.key, failure.reason));
        }
    }
    out
}
