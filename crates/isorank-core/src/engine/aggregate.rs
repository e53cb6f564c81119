use super::error::EngineError;
use crate::core::elements::PeriodicTable;
use crate::core::io::archive::ResultArchive;
use crate::core::io::poscar::{PoscarFile, PoscarMetadata};
use crate::core::io::traits::StructureFile;
use crate::core::models::composition::{CompositionKey, ElementSelection};
use crate::core::models::job::JobRecord;
use crate::core::utils::geometry::recenter;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const POSCAR_SUFFIX: &str = "_res_POSCARS";

/// Jobs grouped by composition, remembering the order in which compositions were first seen.
#[derive(Debug, Clone, Default)]
pub struct CompositionGroups {
    order: Vec<CompositionKey>,
    groups: HashMap<CompositionKey, Vec<JobRecord>>,
}

impl CompositionGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: CompositionKey, job: JobRecord) {
        match self.groups.get_mut(&key) {
            Some(jobs) => jobs.push(job),
            None => {
                self.order.push(key.clone());
                self.groups.insert(key, vec![job]);
            }
        }
    }

    pub fn get(&self, key: &CompositionKey) -> Option<&[JobRecord]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Compositions in first-seen order.
    pub fn keys(&self) -> &[CompositionKey] {
        &self.order
    }

    /// Groups in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&CompositionKey, &[JobRecord])> + '_ {
        self.order
            .iter()
            .map(|key| (key, self.groups[key].as_slice()))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn total_jobs(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

/// A job that was read but left out of every group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedJob {
    pub job_name: String,
    pub source_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationSummary {
    pub archives_read: usize,
    /// Archives that could not be opened at all, with the reason.
    pub archives_failed: Vec<(String, String)>,
    pub jobs_accepted: usize,
    pub skipped: Vec<SkippedJob>,
    /// Jobs kept even though their gap is not finite.
    pub nonfinite_gaps_kept: usize,
    /// Jobs dropped by the non-finite gap filter.
    pub nonfinite_gaps_dropped: usize,
}

impl AggregationSummary {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregationOptions {
    pub skip_nan_gap: bool,
    /// Directory receiving `<archive>_res_POSCARS`; `None` disables structure export.
    pub poscar_directory: Option<PathBuf>,
    pub poscar: PoscarMetadata,
}

/// Folds job records from many archives into composition groups.
pub struct CompositionAggregator<'a> {
    selection: &'a ElementSelection,
    table: &'a PeriodicTable,
    options: AggregationOptions,
    groups: CompositionGroups,
    summary: AggregationSummary,
}

impl<'a> CompositionAggregator<'a> {
    pub fn new(
        selection: &'a ElementSelection,
        table: &'a PeriodicTable,
        options: AggregationOptions,
    ) -> Self {
        Self {
            selection,
            table,
            options,
            groups: CompositionGroups::new(),
            summary: AggregationSummary::default(),
        }
    }

    /// Opens and folds one archive. An unreadable archive is recorded and skipped.
    pub fn add_path(&mut self, path: &Path) -> Result<(), EngineError> {
        match ResultArchive::open(path) {
            Ok(archive) => self.add_archive(&archive),
            Err(e) => {
                warn!("Skipping archive {:?}: {}", path, e);
                self.summary
                    .archives_failed
                    .push((path.to_string_lossy().to_string(), e.to_string()));
                Ok(())
            }
        }
    }

    /// Folds every job of an archive into the groups.
    ///
    /// Only structure-export I/O failures are returned as errors; bad jobs are
    /// logged and counted.
    pub fn add_archive(&mut self, archive: &ResultArchive) -> Result<(), EngineError> {
        self.summary.archives_read += 1;
        let poscar_path = self
            .options
            .poscar_directory
            .as_ref()
            .map(|dir| dir.join(format!("{}{}", archive.stem(), POSCAR_SUFFIX)));

        for (name, parsed) in archive.jobs() {
            let job = match parsed {
                Ok(job) => job,
                Err(e) => {
                    self.skip(name, archive.source_id(), e.to_string());
                    continue;
                }
            };
            if let Some(&z) = job
                .atomic_numbers
                .iter()
                .find(|&&z| self.table.symbol(z).is_none())
            {
                self.skip(
                    name,
                    archive.source_id(),
                    format!("unknown atomic number {}", z),
                );
                continue;
            }
            self.add_job(job, poscar_path.as_deref())?;
        }
        Ok(())
    }

    fn add_job(&mut self, mut job: JobRecord, poscar_path: Option<&Path>) -> Result<(), EngineError> {
        recenter(&mut job.coordinates);
        let key = self.selection.composition_of(&job.atomic_numbers);

        if let Some(path) = poscar_path {
            PoscarFile::append_to_path(&job, &self.options.poscar, self.table, path).map_err(
                |e| EngineError::StructureExport {
                    path: path.to_path_buf(),
                    source: e,
                },
            )?;
        }

        if !job.has_finite_gap() {
            if self.options.skip_nan_gap {
                debug!(
                    "Dropping {} in {}: gap is not finite",
                    job.job_name, job.source_id
                );
                self.summary.nonfinite_gaps_dropped += 1;
                return Ok(());
            }
            debug!(
                "Keeping {} in {} with non-finite gap",
                job.job_name, job.source_id
            );
            self.summary.nonfinite_gaps_kept += 1;
        }

        self.summary.jobs_accepted += 1;
        self.groups.push(key, job);
        Ok(())
    }

    fn skip(&mut self, job_name: &str, source_id: &str, reason: String) {
        warn!("{} in {} : job failed ({})", job_name, source_id, reason);
        self.summary.skipped.push(SkippedJob {
            job_name: job_name.to_string(),
            source_id: source_id.to_string(),
            reason,
        });
    }

    pub fn groups(&self) -> &CompositionGroups {
        &self.groups
    }

    pub fn summary(&self) -> &AggregationSummary {
        &self.summary
    }

    pub fn finish(self) -> (CompositionGroups, AggregationSummary) {
        (self.groups, self.summary)
    }
}
