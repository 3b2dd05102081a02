use std::collections::BTreeSet;

use serde::Serialize;

use crate::catalog::Catalog;

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub caught: usize,
    pub total: usize,
    pub percentage: u32,
}

impl Stats {
    /// Only ids present in the catalog are counted.
    pub fn new(catalog: &Catalog, caught: &BTreeSet<u64>) -> Self {
        let caught = catalog.count_caught(caught);
        let total = catalog.len();
        Stats {
            caught,
            total,
            percentage: percentage(caught, total),
        }
    }

    /// CSS width of the progress bar.
    pub fn progress_width(&self) -> String {
        format!("{}%", self.percentage)
    }
}

/// Rounded share of `caught` in `total`, 0 for an empty catalog.
pub fn percentage(caught: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (caught as f64 / total as f64 * 100.0).round().clamp(0.0, 100.0) as u32
}
