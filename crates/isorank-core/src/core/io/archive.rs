use crate::core::models::job::{JobRecord, parse_old_index};
use globset::{Glob, GlobMatcher};
use nalgebra::Point3;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_ARCHIVE_PATTERN: &str = "*.json";

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("JSON parsing error for '{path}': {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("Archive '{path}' must hold an object mapping job names to records")]
    NotAnObject { path: String },
    #[error("Input path does not exist: '{0}'")]
    MissingSource(String),
    #[error("Invalid archive pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: globset::Error,
    },
}

/// Why a single job inside an otherwise readable archive was rejected.
#[derive(Debug, Error)]
pub enum JobParseError {
    #[error("record could not be deserialized: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("record has no SCF energies")]
    MissingEnergy,
    #[error("record has no atoms")]
    MissingAtoms,
    #[error("record has no coordinate frames")]
    MissingGeometry,
    #[error("last frame has {coords} coordinates for {atoms} atoms")]
    AtomCountMismatch { atoms: usize, coords: usize },
    #[error("job name has no trailing '_<index>' suffix")]
    MissingIndex,
    #[error("HOMO index {homo} is outside the {levels} orbital levels of spin channel {channel}")]
    HomoOutOfRange {
        channel: usize,
        homo: usize,
        levels: usize,
    },
}

#[derive(Debug, Deserialize)]
struct RawJob {
    scf_energies: Vec<f64>,
    atomic_numbers: Vec<u8>,
    atom_coords: Vec<Vec<[f64; 3]>>,
    #[serde(default)]
    mo_energies: Vec<Vec<f64>>,
    #[serde(default)]
    homos: Vec<usize>,
    #[serde(default)]
    gap: Option<f64>,
}

/// Gap between the lowest unoccupied and the highest occupied orbital over all spin channels.
///
/// Returns `NaN` when no channel has both a HOMO and a LUMO.
pub fn frontier_gap(mo_energies: &[Vec<f64>], homos: &[usize]) -> f64 {
    let mut homo = f64::NEG_INFINITY;
    let mut lumo = f64::INFINITY;
    let mut found = false;
    for (levels, &h) in mo_energies.iter().zip(homos) {
        let lumo_level = h.checked_add(1).and_then(|i| levels.get(i));
        if let (Some(&occ), Some(&virt)) = (levels.get(h), lumo_level) {
            homo = homo.max(occ);
            lumo = lumo.min(virt);
            found = true;
        }
    }
    if found { lumo - homo } else { f64::NAN }
}

/// A result archive: a JSON object mapping job names to computation records.
///
/// Job order follows the order in the file, which is the discovery order used
/// when grouping.
#[derive(Debug, Clone)]
pub struct ResultArchive {
    source_id: String,
    entries: Map<String, Value>,
}

impl ResultArchive {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let display = path.to_string_lossy().to_string();
        let content = fs::read_to_string(path).map_err(|e| ArchiveError::Io {
            path: display.clone(),
            source: e,
        })?;
        let source_id = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| display.clone());
        Self::from_json(source_id, &content).map_err(|e| match e {
            ArchiveError::Json { source, .. } => ArchiveError::Json {
                path: display,
                source,
            },
            ArchiveError::NotAnObject { .. } => ArchiveError::NotAnObject { path: display },
            other => other,
        })
    }

    pub fn from_json(source_id: impl Into<String>, content: &str) -> Result<Self, ArchiveError> {
        let source_id = source_id.into();
        let value: Value = serde_json::from_str(content).map_err(|e| ArchiveError::Json {
            path: source_id.clone(),
            source: e,
        })?;
        match value {
            Value::Object(entries) => Ok(Self { source_id, entries }),
            _ => Err(ArchiveError::NotAnObject { path: source_id }),
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// File stem of the archive, used to name its structure export file.
    pub fn stem(&self) -> &str {
        self.source_id
            .split_once('.')
            .map_or(self.source_id.as_str(), |(stem, _)| stem)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Yields every job in file order, each either parsed or with the reason it was rejected.
    pub fn jobs(&self) -> impl Iterator<Item = (&str, Result<JobRecord, JobParseError>)> + '_ {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), self.parse_job(name, value)))
    }

    fn parse_job(&self, name: &str, value: &Value) -> Result<JobRecord, JobParseError> {
        let raw = RawJob::deserialize(value)?;
        let total_energy = *raw.scf_energies.last().ok_or(JobParseError::MissingEnergy)?;
        if raw.atomic_numbers.is_empty() {
            return Err(JobParseError::MissingAtoms);
        }
        let frame = raw.atom_coords.last().ok_or(JobParseError::MissingGeometry)?;
        if frame.len() != raw.atomic_numbers.len() {
            return Err(JobParseError::AtomCountMismatch {
                atoms: raw.atomic_numbers.len(),
                coords: frame.len(),
            });
        }
        let old_index = parse_old_index(name).ok_or(JobParseError::MissingIndex)?;
        for (channel, (levels, &homo)) in raw.mo_energies.iter().zip(&raw.homos).enumerate() {
            if homo >= levels.len() {
                return Err(JobParseError::HomoOutOfRange {
                    channel,
                    homo,
                    levels: levels.len(),
                });
            }
        }
        let gap = raw
            .gap
            .unwrap_or_else(|| frontier_gap(&raw.mo_energies, &raw.homos));

        Ok(JobRecord {
            job_name: name.to_string(),
            source_id: self.source_id.clone(),
            coordinates: frame.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect(),
            atomic_numbers: raw.atomic_numbers,
            total_energy,
            gap,
            old_index,
        })
    }
}

/// Expands input paths into the ordered list of archives to read.
///
/// Directories are scanned recursively for file names matching `pattern` and
/// their matches are sorted by path, so the result does not depend on the
/// platform's directory enumeration order. Explicit files are taken as given.
pub fn discover_archives(roots: &[PathBuf], pattern: &str) -> Result<Vec<PathBuf>, ArchiveError> {
    let matcher = Glob::new(pattern)
        .map_err(|e| ArchiveError::Pattern {
            pattern: pattern.to_string(),
            source: e,
        })?
        .compile_matcher();

    let mut archives = Vec::new();
    for root in roots {
        if root.is_file() {
            archives.push(root.clone());
        } else if root.is_dir() {
            let mut found = Vec::new();
            collect_matching(root, &matcher, &mut found)?;
            found.sort();
            archives.extend(found);
        } else {
            return Err(ArchiveError::MissingSource(
                root.to_string_lossy().to_string(),
            ));
        }
    }
    Ok(archives)
}

fn collect_matching(
    dir: &Path,
    matcher: &GlobMatcher,
    found: &mut Vec<PathBuf>,
) -> Result<(), ArchiveError> {
    let entries = fs::read_dir(dir).map_err(|e| ArchiveError::Io {
        path: dir.to_string_lossy().to_string(),
        source: e,
    })?;
    for entry in entries {
        let path = entry
            .map_err(|e| ArchiveError::Io {
                path: dir.to_string_lossy().to_string(),
                source: e,
            })?
            .path();
        if path.is_dir() {
            collect_matching(&path, matcher, found)?;
        } else if path.file_name().is_some_and(|name| matcher.is_match(name)) {
            found.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const ARCHIVE: &str = r#"{
        "C2H4_3": {
            "scf_energies": [-2130.0, -2135.5],
            "atomic_numbers": [6, 6, 1, 1, 1, 1],
            "atom_coords": [[[0,0,0],[1.3,0,0],[-0.5,0.9,0],[-0.5,-0.9,0],[1.8,0.9,0],[1.8,-0.9,0]]],
            "mo_energies": [[-20.0, -12.0, -7.1, -0.9, 2.0]],
            "homos": [2]
        },
        "C2H4_1": {
            "scf_energies": [-2134.0],
            "atomic_numbers": [6, 6, 1, 1, 1, 1],
            "atom_coords": [[[0,0,0],[1.3,0,0],[-0.5,0.9,0],[-0.5,-0.9,0],[1.8,0.9,0],[1.8,-0.9,0]]],
            "gap": null
        },
        "C2H4_2": null,
        "C2H4_4": {
            "scf_energies": [],
            "atomic_numbers": [6],
            "atom_coords": [[[0,0,0]]]
        },
        "C2H4_5": {
            "scf_energies": [-1.0],
            "atomic_numbers": [6, 6],
            "atom_coords": [[[0,0,0]]]
        },
        "C2H4": {
            "scf_energies": [-1.0],
            "atomic_numbers": [6],
            "atom_coords": [[[0,0,0]]]
        }
    }"#;

    #[test]
    fn jobs_are_yielded_in_file_order() {
        let archive = ResultArchive::from_json("run1.json", ARCHIVE).unwrap();
        let names: Vec<&str> = archive.jobs().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            ["C2H4_3", "C2H4_1", "C2H4_2", "C2H4_4", "C2H4_5", "C2H4"]
        );
        assert_eq!(archive.stem(), "run1");
    }

    #[test]
    fn parses_last_energy_last_frame_and_orbital_gap() {
        let archive = ResultArchive::from_json("run1.json", ARCHIVE).unwrap();
        let (_, first) = archive.jobs().next().unwrap();
        let job = first.unwrap();
        assert_eq!(job.total_energy, -2135.5);
        assert_eq!(job.old_index, 3);
        assert_eq!(job.source_id, "run1.json");
        assert_eq!(job.coordinates.len(), 6);
        assert!((job.gap - 6.2).abs() < 1e-12);
    }

    #[test]
    fn missing_gap_data_becomes_nan() {
        let archive = ResultArchive::from_json("run1.json", ARCHIVE).unwrap();
        let (_, second) = archive.jobs().nth(1).unwrap();
        assert!(second.unwrap().gap.is_nan());
    }

    #[test]
    fn malformed_jobs_are_reported_individually() {
        let archive = ResultArchive::from_json("run1.json", ARCHIVE).unwrap();
        let results: Vec<_> = archive.jobs().map(|(_, r)| r).collect();
        assert!(matches!(results[2], Err(JobParseError::Malformed(_))));
        assert!(matches!(results[3], Err(JobParseError::MissingEnergy)));
        assert!(matches!(
            results[4],
            Err(JobParseError::AtomCountMismatch {
                atoms: 2,
                coords: 1
            })
        ));
        assert!(matches!(results[5], Err(JobParseError::MissingIndex)));
    }

    #[test]
    fn homo_index_past_the_orbital_levels_rejects_the_job() {
        let content = r#"{
            "CH_1": {
                "scf_energies": [-1.0],
                "atomic_numbers": [6, 1],
                "atom_coords": [[[0,0,0],[1.1,0,0]]],
                "mo_energies": [[-10.0, -5.0], [-9.0, 1.0]],
                "homos": [0, 18446744073709551615]
            }
        }"#;
        let archive = ResultArchive::from_json("run1.json", content).unwrap();
        let (_, result) = archive.jobs().next().unwrap();
        assert!(matches!(
            result,
            Err(JobParseError::HomoOutOfRange {
                channel: 1,
                homo: usize::MAX,
                levels: 2
            })
        ));
    }

    #[test]
    fn frontier_gap_tolerates_extreme_homo_indices() {
        let levels = vec![vec![-10.0, -5.0, 1.0]];
        assert!(frontier_gap(&levels, &[usize::MAX]).is_nan());
        assert!(frontier_gap(&levels, &[2]).is_nan());
        assert_eq!(frontier_gap(&levels, &[1]), 6.0);
    }

    #[test]
    fn non_object_archive_is_rejected() {
        let err = ResultArchive::from_json("list.json", "[1, 2]").unwrap_err();
        assert!(matches!(err, ArchiveError::NotAnObject { .. }));
    }

    #[test]
    fn frontier_gap_uses_highest_homo_and_lowest_lumo() {
        let alpha = vec![-10.0, -5.0, -1.0, 0.5];
        let beta = vec![-10.0, -4.5, -2.0];
        let gap = frontier_gap(&[alpha, beta], &[1, 0]);
        assert!((gap - (-4.5 - -5.0)).abs() < 1e-12);
        assert!(frontier_gap(&[vec![-1.0]], &[0]).is_nan());
        assert!(frontier_gap(&[], &[]).is_nan());
    }

    #[test]
    fn discovery_is_recursive_sorted_and_filtered() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("b_batch");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("z.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(nested.join("m.json"), "{}").unwrap();

        let found = discover_archives(&[dir.path().to_path_buf()], DEFAULT_ARCHIVE_PATTERN).unwrap();
        let rel: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            rel,
            [
                PathBuf::from("a.json"),
                PathBuf::from("b_batch/m.json"),
                PathBuf::from("z.json")
            ]
        );
    }

    #[test]
    fn discovery_keeps_explicit_files_and_rejects_missing_paths() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("only.json");
        fs::write(&file, "{}").unwrap();
        assert_eq!(
            discover_archives(&[file.clone()], "*.json").unwrap(),
            vec![file]
        );
        let missing = dir.path().join("nope");
        assert!(matches!(
            discover_archives(&[missing], "*.json"),
            Err(ArchiveError::MissingSource(_))
        ));
    }
}
