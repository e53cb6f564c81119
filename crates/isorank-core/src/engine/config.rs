use crate::core::elements::PeriodicTable;
use crate::core::io::archive::DEFAULT_ARCHIVE_PATTERN;
use crate::core::io::poscar::DEFAULT_VACUUM;
use crate::core::models::composition::{CompositionKey, ElementSelection, SelectionError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Invalid element selection: {0}")]
    InvalidSelector(#[from] SelectionError),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("A first-connected map is only meaningful for binary systems, but {elements} elements are tracked")]
    ConnectivityRequiresBinary { elements: usize },
}

#[derive(Debug, Error)]
pub enum ConnectivityLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Rank of the first fully-connected isomer for each composition of a binary system.
///
/// Stored as a dense grid indexed by the two element counts, so
/// `offsets[n][m]` is the offset for composition `(n, m)`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectivityMap {
    offsets: Vec<Vec<usize>>,
}

impl ConnectivityMap {
    pub fn new(offsets: Vec<Vec<usize>>) -> Self {
        Self { offsets }
    }

    /// Loads a map from a TOML file of the form `offsets = [[0, 0], [0, 1]]`.
    pub fn load(path: &Path) -> Result<Self, ConnectivityLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConnectivityLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConnectivityLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Returns the offset for a two-element composition, or `None` when the grid has no cell for it.
    pub fn offset_for(&self, composition: &CompositionKey) -> Option<usize> {
        match composition.counts() {
            [n, m] => self.offsets.get(*n)?.get(*m).copied(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionConfig {
    /// Size of the ranking window per composition.
    pub isomer_count: usize,
    /// Drop records whose gap is not finite.
    pub skip_nan_gap: bool,
    pub connectivity: Option<ConnectivityMap>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Write each ranking window's isomers as `<job>_g<rank>.xyz`.
    pub write_xyz: bool,
    /// Append every parsed job to `<archive>_res_POSCARS`.
    pub write_poscars: bool,
    pub vacuum: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub elements: ElementSelection,
    pub selection: SelectionConfig,
    pub output: OutputConfig,
    pub archive_pattern: String,
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    element_numbers: Option<Vec<u8>>,
    element_symbols: Option<Vec<String>>,
    isomer_count: Option<usize>,
    skip_nan_gap: Option<bool>,
    connectivity: Option<ConnectivityMap>,
    output_directory: Option<PathBuf>,
    write_xyz: Option<bool>,
    write_poscars: Option<bool>,
    vacuum: Option<f64>,
    archive_pattern: Option<String>,
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element_numbers(mut self, numbers: Vec<u8>) -> Self {
        self.element_numbers = Some(numbers);
        self
    }
    pub fn element_symbols(mut self, symbols: Vec<String>) -> Self {
        self.element_symbols = Some(symbols);
        self
    }
    pub fn isomer_count(mut self, n: usize) -> Self {
        self.isomer_count = Some(n);
        self
    }
    pub fn skip_nan_gap(mut self, skip: bool) -> Self {
        self.skip_nan_gap = Some(skip);
        self
    }
    pub fn connectivity_map(mut self, map: Option<ConnectivityMap>) -> Self {
        self.connectivity = map;
        self
    }
    pub fn output_directory(mut self, path: PathBuf) -> Self {
        self.output_directory = Some(path);
        self
    }
    pub fn write_xyz(mut self, write: bool) -> Self {
        self.write_xyz = Some(write);
        self
    }
    pub fn write_poscars(mut self, write: bool) -> Self {
        self.write_poscars = Some(write);
        self
    }
    pub fn vacuum(mut self, vacuum: f64) -> Self {
        self.vacuum = Some(vacuum);
        self
    }
    pub fn archive_pattern(mut self, pattern: String) -> Self {
        self.archive_pattern = Some(pattern);
        self
    }

    pub fn build(self, table: &PeriodicTable) -> Result<AnalysisConfig, ConfigError> {
        let elements = ElementSelection::resolve(
            self.element_numbers.as_deref(),
            self.element_symbols.as_deref(),
            table,
        )?;

        let isomer_count = self.isomer_count.unwrap_or(1);
        if isomer_count == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "isomer_count",
                reason: "must be at least 1".to_string(),
            });
        }
        let vacuum = self.vacuum.unwrap_or(DEFAULT_VACUUM);
        if !vacuum.is_finite() || vacuum < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "vacuum",
                reason: format!("must be a non-negative length, got {}", vacuum),
            });
        }
        if self.connectivity.is_some() && !elements.is_binary() {
            return Err(ConfigError::ConnectivityRequiresBinary {
                elements: elements.len(),
            });
        }

        Ok(AnalysisConfig {
            elements,
            selection: SelectionConfig {
                isomer_count,
                skip_nan_gap: self.skip_nan_gap.unwrap_or(false),
                connectivity: self.connectivity,
            },
            output: OutputConfig {
                directory: self.output_directory.unwrap_or_else(|| PathBuf::from(".")),
                write_xyz: self.write_xyz.unwrap_or(false),
                write_poscars: self.write_poscars.unwrap_or(true),
                vacuum,
            },
            archive_pattern: self
                .archive_pattern
                .unwrap_or_else(|| DEFAULT_ARCHIVE_PATTERN.to_string()),
        })
    }
}
