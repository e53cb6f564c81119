//! Aggregation, ranking and reporting machinery.
//!
//! The modules here are wired together by [`crate::workflows`], but each can be
//! driven on its own: an aggregator fills [`aggregate::CompositionGroups`], the
//! ranker turns every group into a [`rank::RankedSelection`], and the report
//! and export modules write those selections out.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod progress;
pub mod rank;
pub mod report;
