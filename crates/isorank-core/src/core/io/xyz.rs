use super::traits::{StructureFile, StructureWriteError, element_symbols};
use crate::core::elements::PeriodicTable;
use crate::core::models::job::JobRecord;
use std::io::Write;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XyzMetadata {
    /// Single-line comment written after the atom count. Newlines are replaced by spaces.
    pub comment: String,
}

impl XyzMetadata {
    /// Comment carrying the energy of an isomer relative to its window's lead.
    pub fn energy_delta(delta: f64) -> Self {
        Self {
            comment: format!("dE = {:6.5}", delta),
        }
    }
}

pub struct XyzFile;

impl StructureFile for XyzFile {
    type Metadata = XyzMetadata;
    type Error = StructureWriteError;

    fn write_to(
        job: &JobRecord,
        metadata: &Self::Metadata,
        table: &PeriodicTable,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let symbols = element_symbols(job, table)?;
        writeln!(writer, "{}", job.atom_count())?;
        writeln!(writer, "{}", metadata.comment.replace(['\n', '\r'], " "))?;
        for (sym, p) in symbols.iter().zip(&job.coordinates) {
            writeln!(writer, "{:<3}{:>15.6}{:>15.6}{:>15.6}", sym, p.x, p.y, p.z)?;
        }
        Ok(())
    }
}
