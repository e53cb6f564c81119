use super::aggregate::CompositionGroups;
use super::error::EngineError;
use super::rank::RankedSelection;
use crate::core::elements::PeriodicTable;
use crate::core::io::traits::StructureFile;
use crate::core::io::xyz::{XyzFile, XyzMetadata};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes the geometries of selected isomers as individual XYZ files.
pub struct StructureExporter<'a> {
    directory: &'a Path,
    table: &'a PeriodicTable,
}

impl<'a> StructureExporter<'a> {
    pub fn new(directory: &'a Path, table: &'a PeriodicTable) -> Self {
        Self { directory, table }
    }

    /// File name of the isomer at `rank` in its composition's energy order.
    pub fn file_name(job_name: &str, rank: usize) -> String {
        format!("{}_g{}.xyz", job_name, rank)
    }

    /// Writes every isomer in the selection window, overwriting existing files.
    ///
    /// The comment line carries each isomer's energy relative to the lead.
    pub fn export(
        &self,
        selection: &RankedSelection,
        groups: &CompositionGroups,
    ) -> Result<Vec<PathBuf>, EngineError> {
        let Some(jobs) = groups.get(&selection.composition) else {
            return Ok(Vec::new());
        };

        let mut written = Vec::with_capacity(selection.window_indices.len());
        for (pos, &idx) in selection.window_indices.iter().enumerate() {
            let job = &jobs[idx];
            let path = self
                .directory
                .join(Self::file_name(&job.job_name, pos + selection.start_rank));
            let meta = XyzMetadata::energy_delta(job.total_energy - selection.lead_energy);
            XyzFile::write_to_path(job, &meta, self.table, &path).map_err(|e| {
                EngineError::StructureExport {
                    path: path.clone(),
                    source: e,
                }
            })?;
            debug!("Wrote {:?}", path);
            written.push(path);
        }
        Ok(written)
    }

    pub fn export_all(
        &self,
        selections: &[RankedSelection],
        groups: &CompositionGroups,
    ) -> Result<Vec<PathBuf>, EngineError> {
        let mut written = Vec::new();
        for selection in selections {
            written.extend(self.export(selection, groups)?);
        }
        Ok(written)
    }
}
