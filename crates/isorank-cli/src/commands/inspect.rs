use super::process::report_skipped;
use crate::cli::InspectArgs;
use crate::config::PartialAnalysisConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use isorank::{
    core::{elements::PeriodicTable, models::composition::ElementSelection},
    engine::{
        aggregate::{AggregationSummary, CompositionGroups},
        progress::ProgressReporter,
        rank::energy_order,
    },
    workflows,
};
use std::io::{self, Write};
use tracing::info;

pub fn run(args: InspectArgs) -> Result<()> {
    let table = PeriodicTable::new();

    let partial_config = PartialAnalysisConfig::load(args.input.config.as_deref())?;
    let config = partial_config.merge_with_cli(&args.input, None, &table)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the aggregation workflow...");
    let (groups, summary) =
        workflows::process::aggregate(&args.input.inputs, &config, &table, &reporter)?;

    report_skipped(&summary);
    write_overview(&mut io::stdout().lock(), &groups, &summary, &config.elements)?;

    Ok(())
}

/// One line per composition with its isomer count and lowest energy, then totals.
fn write_overview<W: Write>(
    out: &mut W,
    groups: &CompositionGroups,
    summary: &AggregationSummary,
    elements: &ElementSelection,
) -> io::Result<()> {
    writeln!(out, "{:<16} {:>8} {:>18}", "Composition", "Isomers", "Lowest Etot, eV")?;
    for (composition, jobs) in groups.iter() {
        let lowest = energy_order(jobs)
            .first()
            .map_or(f64::NAN, |&i| jobs[i].total_energy);
        writeln!(
            out,
            "{:<16} {:>8} {:>18.6}",
            composition.formula(elements),
            jobs.len(),
            lowest
        )?;
    }
    writeln!(
        out,
        "{} composition(s), {} job(s) accepted, {} skipped",
        groups.len(),
        summary.jobs_accepted,
        summary.skipped_count()
    )
}
