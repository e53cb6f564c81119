use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to write table '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

/// Formats a table value with six decimals; non-finite values become `nan`/`inf`.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{:.6}", value)
    }
}

/// Tab-separated plain-text table writer.
///
/// Rows may have different lengths; there is no implicit header.
pub struct TableWriter {
    path: PathBuf,
    inner: csv::Writer<File>,
}

impl TableWriter {
    pub fn create(path: &Path) -> Result<Self, TableError> {
        let inner = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| TableError::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    pub fn write_row<I, T>(&mut self, row: I) -> Result<(), TableError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.inner.write_record(row).map_err(|e| TableError::Csv {
            path: self.path.clone(),
            source: e,
        })
    }

    pub fn finish(mut self) -> Result<(), TableError> {
        self.inner.flush().map_err(|e| TableError::Csv {
            path: self.path.clone(),
            source: e.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn format_value_handles_non_finite_numbers() {
        assert_eq!(format_value(-2255.4451234), "-2255.445123");
        assert_eq!(format_value(f64::NAN), "nan");
        assert_eq!(format_value(f64::INFINITY), "inf");
        assert_eq!(format_value(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn writes_tab_separated_rows_of_varying_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.txt");
        let mut table = TableWriter::create(&path).unwrap();
        table.write_row(["C", "H", "Etot, eV"]).unwrap();
        table.write_row(["6", "12"]).unwrap();
        table.finish().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "C\tH\tEtot, eV\n6\t12\n");
    }

    #[test]
    fn create_fails_for_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("t.txt");
        assert!(matches!(
            TableWriter::create(&path),
            Err(TableError::Csv { .. })
        ));
    }
}
