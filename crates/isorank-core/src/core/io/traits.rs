use crate::core::elements::PeriodicTable;
use crate::core::models::job::JobRecord;
use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StructureWriteError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Job '{job}' contains an atom with unknown atomic number {number}")]
    UnknownElement { job: String, number: u8 },
}

/// Defines the interface for writing a job's geometry in a structure file format.
///
/// Implementors handle only the serialization of a single structure; the
/// provided methods take care of opening files either for a fresh write or for
/// appending to an existing multi-structure file.
pub trait StructureFile {
    /// Per-write options specific to the format.
    type Metadata;

    /// The error type for write operations.
    type Error: Error + From<io::Error>;

    /// Writes one structure to a writer.
    ///
    /// # Arguments
    ///
    /// * `job` - The job whose (already recentered) geometry is written.
    /// * `metadata` - Format-specific options such as a comment or vacuum padding.
    /// * `table` - Periodic table used to turn atomic numbers into symbols.
    /// * `writer` - The writer to output to.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the job holds an unknown element.
    fn write_to(
        job: &JobRecord,
        metadata: &Self::Metadata,
        table: &PeriodicTable,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error>;

    /// Creates (or truncates) `path` and writes one structure to it.
    fn write_to_path<P: AsRef<Path>>(
        job: &JobRecord,
        metadata: &Self::Metadata,
        table: &PeriodicTable,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(job, metadata, table, &mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Appends one structure to `path`, creating the file if it does not exist.
    fn append_to_path<P: AsRef<Path>>(
        job: &JobRecord,
        metadata: &Self::Metadata,
        table: &PeriodicTable,
        path: P,
    ) -> Result<(), Self::Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(job, metadata, table, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

pub(crate) fn element_symbols(
    job: &JobRecord,
    table: &PeriodicTable,
) -> Result<Vec<&'static str>, StructureWriteError> {
    job.atomic_numbers
        .iter()
        .map(|&z| {
            table.symbol(z).ok_or_else(|| StructureWriteError::UnknownElement {
                job: job.job_name.clone(),
                number: z,
            })
        })
        .collect()
}
