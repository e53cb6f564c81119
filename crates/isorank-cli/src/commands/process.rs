use crate::cli::ProcessArgs;
use crate::config::PartialAnalysisConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use isorank::{
    core::elements::PeriodicTable, engine::aggregate::AggregationSummary,
    engine::progress::ProgressReporter, workflows,
};
use tracing::{info, warn};

pub fn run(args: ProcessArgs) -> Result<()> {
    let table = PeriodicTable::new();

    let partial_config = PartialAnalysisConfig::load(args.input.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args.input, Some(&args), &table)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Processing {} input path(s) for {} ...",
        args.input.inputs.len(),
        config.elements.symbols().join("-")
    );
    info!("Invoking the core process workflow...");
    let result = workflows::process::run(&args.input.inputs, &config, &table, &reporter)?;

    report_skipped(&result.summary);
    if result.selections.is_empty() {
        warn!("Workflow completed but no composition had any accepted job.");
        println!("Warning: no jobs were accepted; the summary tables are empty.");
    }

    println!(
        "Ranked {} composition(s) from {} job(s); {} file(s) written to {}",
        result.selections.len(),
        result.summary.jobs_accepted,
        result.written.len(),
        config.output.directory.display()
    );
    for selection in result.selections.iter().filter(|s| s.offset_from_global_min) {
        println!(
            "  {}: lead isomer shifted to energy rank {}",
            selection.composition.formula(&config.elements),
            selection.start_rank
        );
    }
    println!("Skipped jobs: {}", result.summary.skipped_count());

    Ok(())
}

pub(crate) fn report_skipped(summary: &AggregationSummary) {
    for (archive, reason) in &summary.archives_failed {
        println!("  Unreadable archive {}: {}", archive, reason);
    }
    if summary.nonfinite_gaps_kept > 0 {
        info!(
            "{} job(s) with a non-finite gap were kept.",
            summary.nonfinite_gaps_kept
        );
    }
    if summary.nonfinite_gaps_dropped > 0 {
        println!(
            "  {} job(s) dropped for a non-finite gap",
            summary.nonfinite_gaps_dropped
        );
    }
}
