//! # isorank Core Library
//!
//! Aggregation and energy ranking of isomers produced by quantum-chemistry
//! cluster searches. Result archives are folded into composition groups, each
//! group is ranked by total energy, and the winners are written out as summary
//! tables and structure files.
//!
//! ## Architecture
//!
//! The library follows a three-layer layout:
//!
//! - **[`core`]: The Foundation.** Periodic-table lookups, the job and
//!   composition data models, and thin I/O for result archives, POSCAR/XYZ
//!   geometry and tab-separated tables.
//!
//! - **[`engine`]: The Logic Core.** Configuration, the composition
//!   aggregator, the isomer ranker and the report emitter, plus error and
//!   progress types.
//!
//! - **[`workflows`]: The Public API.** Ties `core` and `engine` together into a
//!   complete post-processing run over a set of archives.

pub mod core;
pub mod engine;
pub mod workflows;
