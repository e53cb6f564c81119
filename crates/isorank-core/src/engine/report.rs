use super::rank::RankedSelection;
use crate::core::io::table::{TableError, TableWriter, format_value};
use crate::core::models::composition::{CompositionKey, ElementSelection};
use std::path::{Path, PathBuf};
use tracing::info;

pub const STATS_FILE: &str = "n_m_Enm_gap.txt";
pub const GAPS_FILE: &str = "all_gaps.txt";
pub const ENERGY_TABLE_FILE: &str = "en_table.txt";
pub const GAP_TABLE_FILE: &str = "gap_table.txt";

/// One line of the per-composition summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub composition: CompositionKey,
    pub energy: f64,
    pub gap: f64,
    /// The lead isomer is not the global minimum of its group.
    pub shifted: bool,
    /// Discovery index of the lead isomer within its group.
    pub initial_index: usize,
}

impl From<&RankedSelection> for SummaryRow {
    fn from(sel: &RankedSelection) -> Self {
        Self {
            composition: sel.composition.clone(),
            energy: sel.lead_energy,
            gap: sel.lead_gap,
            shifted: sel.offset_from_global_min,
            initial_index: sel.lead_index(),
        }
    }
}

/// Dense 2D grid over two integer axes built from sparse `(row, column, value)` entries.
///
/// Both axes span every integer between their smallest and largest label;
/// cells without an entry hold `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    row_labels: Vec<usize>,
    col_labels: Vec<usize>,
    cells: Vec<Vec<f64>>,
}

impl PivotTable {
    pub fn from_entries(entries: &[(usize, usize, f64)]) -> Self {
        let row_labels = label_span(entries.iter().map(|e| e.0));
        let col_labels = label_span(entries.iter().map(|e| e.1));

        let mut cells = vec![vec![f64::NAN; col_labels.len()]; row_labels.len()];
        if let (Some(&r0), Some(&c0)) = (row_labels.first(), col_labels.first()) {
            for &(r, c, value) in entries {
                cells[r - r0][c - c0] = value;
            }
        }
        Self {
            row_labels,
            col_labels,
            cells,
        }
    }

    pub fn row_labels(&self) -> &[usize] {
        &self.row_labels
    }

    pub fn col_labels(&self) -> &[usize] {
        &self.col_labels
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let r = row.checked_sub(*self.row_labels.first()?)?;
        let c = col.checked_sub(*self.col_labels.first()?)?;
        self.cells.get(r)?.get(c).copied()
    }

    fn write(&self, path: &Path, corner: &str) -> Result<(), TableError> {
        let mut table = TableWriter::create(path)?;
        table.write_row(
            std::iter::once(corner.to_string())
                .chain(self.col_labels.iter().map(|c| c.to_string())),
        )?;
        for (label, row) in self.row_labels.iter().zip(&self.cells) {
            table.write_row(
                std::iter::once(label.to_string()).chain(row.iter().map(|&v| format_value(v))),
            )?;
        }
        table.finish()
    }
}

fn label_span(labels: impl Iterator<Item = usize> + Clone) -> Vec<usize> {
    match (labels.clone().min(), labels.max()) {
        (Some(lo), Some(hi)) => (lo..=hi).collect(),
        _ => Vec::new(),
    }
}

/// Summary of a whole run, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub symbols: Vec<&'static str>,
    pub rows: Vec<SummaryRow>,
    /// Energy and gap grids, present only for binary systems.
    pub pivots: Option<(PivotTable, PivotTable)>,
}

/// Turns ranked selections into summary tables.
pub struct ReportEmitter;

impl ReportEmitter {
    pub fn build(selections: &[RankedSelection], elements: &ElementSelection) -> Report {
        let rows: Vec<SummaryRow> = selections.iter().map(SummaryRow::from).collect();
        let pivots = elements.is_binary().then(|| {
            let grid = |value: fn(&SummaryRow) -> f64| {
                let entries: Vec<_> = rows
                    .iter()
                    .filter_map(|row| match row.composition.counts() {
                        &[n, m] => Some((n, m, value(row))),
                        _ => None,
                    })
                    .collect();
                PivotTable::from_entries(&entries)
            };
            (grid(|r| r.energy), grid(|r| r.gap))
        });
        Report {
            symbols: elements.symbols().to_vec(),
            rows,
            pivots,
        }
    }

    /// Writes the report's tables into `directory`, returning the paths written.
    pub fn write(report: &Report, directory: &Path) -> Result<Vec<PathBuf>, TableError> {
        let stats_path = directory.join(STATS_FILE);
        let gaps_path = directory.join(GAPS_FILE);

        let mut stats = TableWriter::create(&stats_path)?;
        let mut gaps = TableWriter::create(&gaps_path)?;
        stats.write_row(
            report
                .symbols
                .iter()
                .map(|s| s.to_string())
                .chain(["Etot, eV", "Gap, ev", "shifted", "initial ind"].map(String::from)),
        )?;
        for row in &report.rows {
            let counts = row.composition.counts().iter().map(|n| n.to_string());
            stats.write_row(counts.clone().chain([
                format_value(row.energy),
                format_value(row.gap),
                if row.shifted { "True" } else { "False" }.to_string(),
                row.initial_index.to_string(),
            ]))?;
            gaps.write_row(counts.chain([format_value(row.gap)]))?;
        }
        stats.finish()?;
        gaps.finish()?;
        let mut written = vec![stats_path, gaps_path];

        if let Some((energy, gap)) = &report.pivots {
            let corner = report.symbols.join("\\");
            let energy_path = directory.join(ENERGY_TABLE_FILE);
            let gap_path = directory.join(GAP_TABLE_FILE);
            energy.write(&energy_path, &corner)?;
            gap.write(&gap_path, &corner)?;
            written.extend([energy_path, gap_path]);
        }

        info!(
            "Wrote {} summary table(s) for {} composition(s) to {:?}",
            written.len(),
            report.rows.len(),
            directory
        );
        Ok(written)
    }
}
