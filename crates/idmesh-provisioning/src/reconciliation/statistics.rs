//! Run statistics tracking for reconciliation.
//!
//! Tracks and aggregates statistics while a report runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;
use std::time::Instant;

use super::discrepancy::DiscrepancyType;

/// Statistics for a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatistics {
    /// Total number of entities to process.
    #[serde(default)]
    pub entities_total: u32,
    /// Number of entities processed so far.
    #[serde(default)]
    pub entities_processed: u32,
    /// Total discrepancies found.
    #[serde(default)]
    pub discrepancies_found: u32,
    /// Discrepancies broken down by type.
    #[serde(default)]
    pub discrepancies_by_type: BTreeMap<String, u32>,
    /// Resources that could not be reconciled.
    #[serde(default)]
    pub failures: u32,
    /// Total duration in seconds.
    #[serde(default)]
    pub duration_seconds: u64,
}

impl RunStatistics {
    /// Create new empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate progress percentage.
    #[must_use]
    pub fn progress_percentage(&self) -> f64 {
        if self.entities_total == 0 {
            0.0
        } else {
            (f64::from(self.entities_processed) / f64::from(self.entities_total)) * 100.0
        }
    }

    /// Get count for a specific discrepancy type.
    #[must_use]
    pub fn discrepancy_count(&self, discrepancy_type: DiscrepancyType) -> u32 {
        self.discrepancies_by_type
            .get(discrepancy_type.as_str())
            .copied()
            .unwrap_or(0)
    }
}

/// Thread-safe tracker for accumulating statistics during a run.
pub struct StatisticsTracker {
    entities_total: AtomicU32,
    entities_processed: AtomicU32,
    discrepancies_found: AtomicU32,
    discrepancies_by_type: RwLock<BTreeMap<DiscrepancyType, u32>>,
    failures: AtomicU32,
    start_time: Instant,
}

impl StatisticsTracker {
    /// Create a new tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities_total: AtomicU32::new(0),
            entities_processed: AtomicU32::new(0),
            discrepancies_found: AtomicU32::new(0),
            discrepancies_by_type: RwLock::new(BTreeMap::new()),
            failures: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Add to the total, one section at a time.
    pub fn add_total(&self, count: u32) {
        self.entities_total.fetch_add(count, Ordering::SeqCst);
    }

    /// Increment processed count.
    pub fn increment_processed(&self, count: u32) {
        self.entities_processed.fetch_add(count, Ordering::SeqCst);
    }

    /// Record a discrepancy.
    pub fn record_discrepancy(&self, discrepancy_type: DiscrepancyType) {
        self.discrepancies_found.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut map) = self.discrepancies_by_type.write() {
            *map.entry(discrepancy_type).or_insert(0) += 1;
        }
    }

    /// Record a resource that could not be reconciled.
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::SeqCst);
    }

    /// Get current processed count.
    pub fn processed_count(&self) -> u32 {
        self.entities_processed.load(Ordering::SeqCst)
    }

    /// Get total entities.
    pub fn total_count(&self) -> u32 {
        self.entities_total.load(Ordering::SeqCst)
    }

    /// Get elapsed duration in seconds.
    pub fn elapsed_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Snapshot current statistics.
    pub fn snapshot(&self) -> RunStatistics {
        let discrepancies_by_type = self
            .discrepancies_by_type
            .read()
            .map(|map| map.iter().map(|(k, v)| (k.to_string(), *v)).collect())
            .unwrap_or_default();

        RunStatistics {
            entities_total: self.entities_total.load(Ordering::SeqCst),
            entities_processed: self.entities_processed.load(Ordering::SeqCst),
            discrepancies_found: self.discrepancies_found.load(Ordering::SeqCst),
            discrepancies_by_type,
            failures: self.failures.load(Ordering::SeqCst),
            duration_seconds: self.elapsed_seconds(),
        }
    }
}

impl Default for StatisticsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_statistics_default() {
        let stats = RunStatistics::default();
        assert_eq!(stats.entities_total, 0);
        assert_eq!(stats.entities_processed, 0);
        assert_eq!(stats.discrepancies_found, 0);
        assert_eq!(stats.failures, 0);
        assert!(stats.discrepancies_by_type.is_empty());
        assert!((stats.progress_percentage() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_tracker_progress() {
        let tracker = StatisticsTracker::new();
        tracker.add_total(40);
        tracker.add_total(60);
        assert_eq!(tracker.total_count(), 100);

        tracker.increment_processed(25);
        tracker.increment_processed(25);
        assert_eq!(tracker.processed_count(), 50);
        assert!((tracker.snapshot().progress_percentage() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_statistics_tracker_discrepancies() {
        let tracker = StatisticsTracker::new();

        tracker.record_discrepancy(DiscrepancyType::Missing);
        tracker.record_discrepancy(DiscrepancyType::Misaligned);
        tracker.record_discrepancy(DiscrepancyType::Misaligned);
        tracker.record_failure();

        let stats = tracker.snapshot();
        assert_eq!(stats.discrepancies_found, 3);
        assert_eq!(stats.discrepancy_count(DiscrepancyType::Missing), 1);
        assert_eq!(stats.discrepancy_count(DiscrepancyType::Misaligned), 2);
        assert_eq!(stats.failures, 1);
    }
}
