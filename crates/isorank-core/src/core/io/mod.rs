//! Input/output for result archives, structure files and summary tables.
//!
//! Archives are read through [`archive::ResultArchive`]; geometry is written
//! through the [`traits::StructureFile`] interface implemented by the POSCAR
//! and XYZ writers; tables go through [`table::TableWriter`].

pub mod archive;
pub mod poscar;
pub mod table;
pub mod traits;
pub mod xyz;
