use super::config::{ConfigError, ConnectivityLoadError};
use super::rank::RankError;
use crate::core::io::archive::ArchiveError;
use crate::core::io::table::TableError;
use crate::core::io::traits::StructureWriteError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load first-connected map: {0}")]
    Connectivity(#[from] ConnectivityLoadError),

    #[error("Input discovery failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Ranking(#[from] RankError),

    #[error("Failed to write structure file '{path}': {source}", path = path.display())]
    StructureExport {
        path: PathBuf,
        #[source]
        source: StructureWriteError,
    },

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Cannot create output directory '{path}': {source}", path = path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
