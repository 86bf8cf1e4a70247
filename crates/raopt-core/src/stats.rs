//! # Table Statistics
//!
//! The cost estimator needs one number per base table: its estimated row
//! count. `TableStatistics` is an immutable snapshot of those counts, keyed
//! by lowercase table name. A missing entry is not an error -- it reads as
//! zero rows, which cascades zero cost to every ancestor of that relation.
//!
//! ## Trait Design
//!
//! `StatisticsSource` is the seam for real providers (a live database
//! catalog, a metastore round-trip). A provider may involve I/O; the core
//! never calls it during estimation. Instead the host materializes a
//! `TableStatistics` snapshot once per query via [`TableStatistics::snapshot`]
//! and passes that immutable map into each `estimate` call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source of table row-count estimates.
pub trait StatisticsSource {
    /// Estimated row count for the given table name, or `None` if the table
    /// is unknown to this source. Lookup is case-insensitive.
    fn row_count(&self, table: &str) -> Option<u64>;
}

/// Immutable snapshot of per-table row counts, keyed by lowercase name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStatistics {
    counts: HashMap<String, u64>,
}

impl TableStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a table's estimated row count. Names are lowercased on insert
    /// so lookups are case-insensitive.
    pub fn insert(&mut self, table: impl AsRef<str>, rows: u64) {
        self.counts.insert(table.as_ref().to_ascii_lowercase(), rows);
    }

    /// Row count for a table; a missing entry reads as zero.
    pub fn get(&self, table: &str) -> u64 {
        self.counts
            .get(&table.to_ascii_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Whether the table has a recorded statistic at all. Used by the
    /// estimator to distinguish "zero rows" from "unknown table" when
    /// emitting diagnostics.
    pub fn contains(&self, table: &str) -> bool {
        self.counts.contains_key(&table.to_ascii_lowercase())
    }

    /// Materialize a snapshot from a provider for the given table names.
    /// Tables the provider does not know are simply absent from the snapshot.
    pub fn snapshot<S: StatisticsSource + ?Sized>(
        source: &S,
        tables: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        let mut stats = Self::new();
        for table in tables {
            if let Some(rows) = source.row_count(table.as_ref()) {
                stats.insert(table, rows);
            }
        }
        stats
    }
}

impl<K: AsRef<str>> FromIterator<(K, u64)> for TableStatistics {
    fn from_iter<T: IntoIterator<Item = (K, u64)>>(iter: T) -> Self {
        let mut stats = Self::new();
        for (table, rows) in iter {
            stats.insert(table, rows);
        }
        stats
    }
}

impl StatisticsSource for TableStatistics {
    fn row_count(&self, table: &str) -> Option<u64> {
        self.counts.get(&table.to_ascii_lowercase()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        let stats: TableStatistics = [("ORDERS", 1500u64)].into_iter().collect();
        assert_eq!(stats.get("orders"), 1500);
        assert_eq!(stats.get("Orders"), 1500);
    }

    #[test]
    fn test_missing_entry_reads_as_zero() {
        let stats = TableStatistics::new();
        assert_eq!(stats.get("lineitem"), 0);
        assert!(!stats.contains("lineitem"));
    }

    #[test]
    fn test_snapshot_from_source() {
        let catalog: TableStatistics =
            [("customer", 150_000u64), ("nation", 25)].into_iter().collect();
        let snap = TableStatistics::snapshot(&catalog, ["customer", "region"]);
        assert_eq!(snap.get("customer"), 150_000);
        assert!(!snap.contains("region"));
        assert!(!snap.contains("nation"));
    }
}
