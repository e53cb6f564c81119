use nalgebra::Point3;

/// One computed structure read from a result archive.
///
/// Records are immutable once produced. The gap is `NaN` when the archive did
/// not carry enough orbital data to define it.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    /// Job name, unique within its archive (e.g. `"C6H12_0042"`).
    pub job_name: String,
    /// File name of the archive the job was read from.
    pub source_id: String,
    /// Atomic number of each atom.
    pub atomic_numbers: Vec<u8>,
    /// Cartesian coordinates in Angstroms, one per atom.
    pub coordinates: Vec<Point3<f64>>,
    /// Final total energy in eV.
    pub total_energy: f64,
    /// Frontier-orbital gap in eV, possibly non-finite.
    pub gap: f64,
    /// Index parsed from the trailing `_N` suffix of the job name.
    pub old_index: u32,
}

impl JobRecord {
    pub fn atom_count(&self) -> usize {
        self.atomic_numbers.len()
    }

    pub fn has_finite_gap(&self) -> bool {
        self.gap.is_finite()
    }
}

/// Extracts the integer after the last `_` in a job name.
pub fn parse_old_index(job_name: &str) -> Option<u32> {
    let (_, suffix) = job_name.rsplit_once('_')?;
    suffix.trim().parse().ok()
}
