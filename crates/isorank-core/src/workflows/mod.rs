//! # Workflows Module
//!
//! High-level entry points that run a complete post-processing pass over a
//! set of result archives.
//!
//! ## Overview
//!
//! A workflow discovers archives, folds their jobs into composition groups,
//! ranks every group by total energy and writes the summary tables and
//! structure files into the output directory. Progress is reported through a
//! [`crate::engine::progress::ProgressReporter`] so front ends can render it.
//!
//! - **Process Workflow** ([`process`]) - The full run, plus an
//!   aggregation-only variant used for inspecting archives without writing
//!   anything.

pub mod process;
