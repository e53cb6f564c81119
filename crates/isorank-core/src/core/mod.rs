//! # Core Module
//!
//! Foundation types and I/O used by the ranking engine.
//!
//! - **Element Data** ([`elements`]) - Immutable symbol/atomic-number table
//! - **Data Models** ([`models`]) - Job records and composition keys
//! - **File I/O** ([`io`]) - Result archives, geometry writers and tables
//! - **Utilities** ([`utils`]) - Geometry helpers for structure export

pub mod elements;
pub mod io;
pub mod models;
pub mod utils;
