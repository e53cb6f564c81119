use super::traits::{StructureFile, StructureWriteError, element_symbols};
use crate::core::elements::PeriodicTable;
use crate::core::models::job::JobRecord;
use crate::core::utils::geometry::padded_box;
use std::io::Write;

pub const DEFAULT_VACUUM: f64 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PoscarMetadata {
    /// Padding added to the coordinate range on every axis, in Angstroms.
    pub vacuum: f64,
}

impl Default for PoscarMetadata {
    fn default() -> Self {
        Self {
            vacuum: DEFAULT_VACUUM,
        }
    }
}

/// VASP 5 POSCAR writer for isolated clusters.
///
/// The cell is an orthogonal box sized to the cluster plus vacuum, so the
/// structure is periodic along all three axes with images far apart.
/// Consecutive atoms of the same element share one species block, which keeps
/// the original atom order intact.
pub struct PoscarFile;

impl StructureFile for PoscarFile {
    type Metadata = PoscarMetadata;
    type Error = StructureWriteError;

    fn write_to(
        job: &JobRecord,
        metadata: &Self::Metadata,
        table: &PeriodicTable,
        writer: &mut impl Write,
    ) -> Result<(), Self::Error> {
        let symbols = element_symbols(job, table)?;
        let edges = padded_box(&job.coordinates, metadata.vacuum);

        let mut species: Vec<(&str, usize)> = Vec::new();
        for &sym in &symbols {
            match species.last_mut() {
                Some((last, count)) if *last == sym => *count += 1,
                _ => species.push((sym, 1)),
            }
        }

        writeln!(writer, "{}", job.job_name)?;
        writeln!(writer, "{:>19.16}", 1.0)?;
        for axis in 0..3 {
            for col in 0..3 {
                let value = if axis == col { edges[axis] } else { 0.0 };
                write!(writer, " {:>21.16}", value)?;
            }
            writeln!(writer)?;
        }
        for (sym, _) in &species {
            write!(writer, " {:>3}", sym)?;
        }
        writeln!(writer)?;
        for (_, count) in &species {
            write!(writer, " {:>3}", count)?;
        }
        writeln!(writer)?;
        writeln!(writer, "Cartesian")?;
        for p in &job.coordinates {
            writeln!(writer, " {:>19.16} {:>19.16} {:>19.16}", p.x, p.y, p.z)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use tempfile::tempdir;

    fn water(name: &str) -> JobRecord {
        JobRecord {
            job_name: name.to_string(),
            source_id: "db.json".to_string(),
            atomic_numbers: vec![8, 1, 1],
            coordinates: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.96, 0.0, 0.0),
                Point3::new(-0.24, 0.93, 0.0),
            ],
            total_energy: -2000.0,
            gap: 7.0,
            old_index: 1,
        }
    }

    #[test]
    fn writes_box_species_and_cartesian_block() {
        let mut buf = Vec::new();
        PoscarFile::write_to(
            &water("H2O_1"),
            &PoscarMetadata::default(),
            &PeriodicTable::new(),
            &mut buf,
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "H2O_1");
        let a: Vec<f64> = lines[2]
            .split_whitespace()
            .map(|v| v.parse().unwrap())
            .collect();
        assert!((a[0] - 16.2).abs() < 1e-9);
        assert_eq!(a[1], 0.0);
        let c: Vec<f64> = lines[4]
            .split_whitespace()
            .map(|v| v.parse().unwrap())
            .collect();
        assert!((c[2] - 15.0).abs() < 1e-9);
        assert_eq!(lines[5].split_whitespace().collect::<Vec<_>>(), ["O", "H"]);
        assert_eq!(lines[6].split_whitespace().collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(lines[7], "Cartesian");
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn append_accumulates_structures_in_one_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db_res_POSCARS");
        let table = PeriodicTable::new();
        let meta = PoscarMetadata::default();

        PoscarFile::append_to_path(&water("H2O_1"), &meta, &table, &path).unwrap();
        PoscarFile::append_to_path(&water("H2O_2"), &meta, &table, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("Cartesian").count(), 2);
        assert!(text.starts_with("H2O_1\n"));
        assert!(text.contains("\nH2O_2\n"));
    }

    #[test]
    fn unknown_element_is_reported() {
        let mut job = water("bad_1");
        job.atomic_numbers[0] = 0;
        let err = PoscarFile::write_to(
            &job,
            &PoscarMetadata::default(),
            &PeriodicTable::new(),
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            StructureWriteError::UnknownElement { number: 0, .. }
        ));
    }
}
