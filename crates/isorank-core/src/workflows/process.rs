use crate::core::elements::PeriodicTable;
use crate::core::io::archive::discover_archives;
use crate::core::io::poscar::PoscarMetadata;
use crate::engine::aggregate::{
    AggregationOptions, AggregationSummary, CompositionAggregator, CompositionGroups,
};
use crate::engine::config::AnalysisConfig;
use crate::engine::error::EngineError;
use crate::engine::export::StructureExporter;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::rank::{IsomerRanker, RankedSelection};
use crate::engine::report::{Report, ReportEmitter};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone)]
pub struct ProcessResult {
    pub groups: CompositionGroups,
    pub selections: Vec<RankedSelection>,
    pub report: Report,
    pub summary: AggregationSummary,
    /// Every table and structure file written, in the order they were written.
    pub written: Vec<PathBuf>,
}

/// Runs aggregation, ranking and reporting over every archive found under `inputs`.
///
/// # Errors
///
/// Fails when the output directory cannot be created, an input path is
/// missing, a connectivity offset leaves a composition with an empty window,
/// or an output file cannot be written. Unreadable archives and malformed
/// jobs are only counted in the returned summary.
#[instrument(skip_all, name = "process_workflow")]
pub fn run(
    inputs: &[PathBuf],
    config: &AnalysisConfig,
    table: &PeriodicTable,
    reporter: &ProgressReporter,
) -> Result<ProcessResult, EngineError> {
    let out_dir = &config.output.directory;
    std::fs::create_dir_all(out_dir).map_err(|e| EngineError::OutputDirectory {
        path: out_dir.clone(),
        source: e,
    })?;

    // === Phase 1: Fold archives into composition groups ===
    let options = AggregationOptions {
        skip_nan_gap: config.selection.skip_nan_gap,
        poscar_directory: config.output.write_poscars.then(|| out_dir.clone()),
        poscar: PoscarMetadata {
            vacuum: config.output.vacuum,
        },
    };
    let (groups, summary) = aggregate_with(inputs, config, table, options, reporter)?;

    // === Phase 2: Rank every composition ===
    reporter.report(Progress::PhaseStart { name: "Ranking" });
    let ranker = IsomerRanker::new(config.selection.isomer_count);
    let selections = ranker.rank_all(&groups, config.selection.connectivity.as_ref())?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Write tables and structures ===
    reporter.report(Progress::PhaseStart { name: "Reporting" });
    let report = ReportEmitter::build(&selections, &config.elements);
    let mut written = ReportEmitter::write(&report, out_dir)?;
    if config.output.write_xyz {
        let exporter = StructureExporter::new(out_dir, table);
        written.extend(exporter.export_all(&selections, &groups)?);
    }
    reporter.report(Progress::PhaseFinish);

    info!(
        "Ranked {} composition(s) from {} job(s); {} job(s) skipped.",
        selections.len(),
        summary.jobs_accepted,
        summary.skipped_count()
    );

    Ok(ProcessResult {
        groups,
        selections,
        report,
        summary,
        written,
    })
}

/// Folds every archive found under `inputs` into composition groups without writing any file.
#[instrument(skip_all, name = "aggregate_workflow")]
pub fn aggregate(
    inputs: &[PathBuf],
    config: &AnalysisConfig,
    table: &PeriodicTable,
    reporter: &ProgressReporter,
) -> Result<(CompositionGroups, AggregationSummary), EngineError> {
    let options = AggregationOptions {
        skip_nan_gap: config.selection.skip_nan_gap,
        ..Default::default()
    };
    aggregate_with(inputs, config, table, options, reporter)
}

fn aggregate_with(
    inputs: &[PathBuf],
    config: &AnalysisConfig,
    table: &PeriodicTable,
    options: AggregationOptions,
    reporter: &ProgressReporter,
) -> Result<(CompositionGroups, AggregationSummary), EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Aggregation",
    });
    let archives = discover_archives(inputs, &config.archive_pattern)?;
    if archives.is_empty() {
        warn!(
            "No archives matching '{}' were found in the given inputs.",
            config.archive_pattern
        );
        reporter.report(Progress::Message(format!(
            "No archives matching '{}' found",
            config.archive_pattern
        )));
    }
    reporter.report(Progress::ArchivesFound {
        total: archives.len() as u64,
    });

    let mut aggregator = CompositionAggregator::new(&config.elements, table, options);
    for path in &archives {
        let (accepted_before, skipped_before, failed_before) = {
            let s = aggregator.summary();
            (s.jobs_accepted, s.skipped_count(), s.archives_failed.len())
        };
        aggregator.add_path(path)?;
        let s = aggregator.summary();
        if s.archives_failed.len() > failed_before {
            reporter.report(Progress::Message(format!(
                "{}: unreadable archive skipped",
                display_name(path)
            )));
        }
        reporter.report(Progress::ArchiveProcessed {
            source: display_name(path),
            accepted: s.jobs_accepted - accepted_before,
            skipped: s.skipped_count() - skipped_before,
        });
    }
    reporter.report(Progress::PhaseFinish);

    let (groups, summary) = aggregator.finish();
    info!(
        "Read {} archive(s): {} job(s) in {} composition(s).",
        summary.archives_read,
        groups.total_jobs(),
        groups.len()
    );
    Ok((groups, summary))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
