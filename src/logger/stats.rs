use crate::store::ErrorLog;
use crate::taxonomy::{Category, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregate counts for the operator dashboard widget.
///
/// Every row lands in exactly one severity bucket and one category bucket,
/// so both maps sum to `total`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub window_hours: u32,
    pub total: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_category: BTreeMap<Category, usize>,
}

impl ErrorStats {
    pub fn from_rows(rows: &[ErrorLog], window_hours: u32) -> Self {
        let mut stats = Self {
            window_hours,
            ..Self::default()
        };
        for row in rows {
            stats.total += 1;
            *stats.by_severity.entry(row.entry.severity).or_insert(0) += 1;
            *stats.by_category.entry(row.entry.category).or_insert(0) += 1;
        }
        stats
    }

    pub fn count_for_severity(&self, severity: Severity) -> usize {
        self.by_severity.get(&severity).copied().unwrap_or(0)
    }

    pub fn count_for_category(&self, category: Category) -> usize {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}
