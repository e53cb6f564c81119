use super::aggregate::CompositionGroups;
use super::config::ConnectivityMap;
use crate::core::models::composition::CompositionKey;
use crate::core::models::job::JobRecord;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RankError {
    #[error(
        "Empty selection window for composition {composition}: connectivity offset {offset} is not below the group size {group_size}"
    )]
    EmptySelectionWindow {
        composition: CompositionKey,
        offset: usize,
        group_size: usize,
    },
    #[error("Isomer count must be at least 1")]
    ZeroIsomerCount,
}

/// The ranking outcome for one composition.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSelection {
    pub composition: CompositionKey,
    pub lead_energy: f64,
    pub lead_gap: f64,
    /// Group (discovery) indices of the selected isomers, lowest energy first.
    pub window_indices: Vec<usize>,
    /// Energy rank of the first selected isomer, i.e. the applied offset.
    pub start_rank: usize,
    /// Whether the lead isomer is not the group's global energy minimum.
    pub offset_from_global_min: bool,
}

impl RankedSelection {
    pub fn lead_index(&self) -> usize {
        self.window_indices[0]
    }
}

/// Group indices sorted by ascending total energy.
///
/// The sort is stable, so equal energies keep their discovery order; NaN
/// energies sort after every number.
pub fn energy_order(jobs: &[JobRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..jobs.len()).collect();
    order.sort_by(|&a, &b| jobs[a].total_energy.total_cmp(&jobs[b].total_energy));
    order
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsomerRanker {
    isomer_count: usize,
}

impl Default for IsomerRanker {
    fn default() -> Self {
        Self { isomer_count: 1 }
    }
}

impl IsomerRanker {
    pub fn new(isomer_count: usize) -> Self {
        Self { isomer_count }
    }

    pub fn isomer_count(&self) -> usize {
        self.isomer_count
    }

    /// Selects up to `isomer_count` lowest-energy isomers starting at energy rank `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::EmptySelectionWindow`] when `offset` is not below
    /// the group size, which means the connectivity data does not match the
    /// jobs actually present.
    pub fn rank(
        &self,
        composition: &CompositionKey,
        jobs: &[JobRecord],
        offset: usize,
    ) -> Result<RankedSelection, RankError> {
        if self.isomer_count == 0 {
            return Err(RankError::ZeroIsomerCount);
        }
        let sorted = energy_order(jobs);
        let end = offset.saturating_add(self.isomer_count).min(sorted.len());
        if offset >= end {
            return Err(RankError::EmptySelectionWindow {
                composition: composition.clone(),
                offset,
                group_size: jobs.len(),
            });
        }
        let window_indices = sorted[offset..end].to_vec();
        let lead = &jobs[window_indices[0]];

        Ok(RankedSelection {
            composition: composition.clone(),
            lead_energy: lead.total_energy,
            lead_gap: lead.gap,
            offset_from_global_min: window_indices[0] != sorted[0],
            start_rank: offset,
            window_indices,
        })
    }

    /// Ranks every group in first-seen composition order.
    ///
    /// Offsets come from `connectivity` when given; compositions missing from
    /// the map use offset 0. The first failing composition aborts ranking.
    pub fn rank_all(
        &self,
        groups: &CompositionGroups,
        connectivity: Option<&ConnectivityMap>,
    ) -> Result<Vec<RankedSelection>, RankError> {
        groups
            .iter()
            .map(|(composition, jobs)| {
                let offset = match connectivity {
                    Some(map) => map.offset_for(composition).unwrap_or_else(|| {
                        warn!(
                            "No first-connected entry for composition {}; using offset 0",
                            composition
                        );
                        0
                    }),
                    None => 0,
                };
                debug!("{} {}", composition, jobs.len());
                self.rank(composition, jobs, offset)
            })
            .collect()
    }
}
