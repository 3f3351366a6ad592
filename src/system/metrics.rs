//! Metrics collection for the database core.
//!
//! Prometheus-backed, registered once via [`Metrics::global`]. Ambient
//! concern: carried regardless of which repository/index features a
//! given build enables.

use crate::core::Result;
use once_cell::sync::Lazy;
use prometheus::{register_histogram_with_registry, register_int_counter_with_registry, Histogram, IntCounter, Registry};
use std::time::Instant;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// Counters for object repository operations.
pub struct RepositoryMetrics {
    /// Objects inserted into a RAM or disk repository.
    pub inserts: IntCounter,
    /// Objects fetched from a repository.
    pub fetches: IntCounter,
    /// Objects updated in place.
    pub updates: IntCounter,
    /// Objects marked deleted (tombstoned).
    pub deletes: IntCounter,
    /// Delta log lines replayed during repository open.
    pub deltas_replayed: IntCounter,
}

/// Counters for the delta-mirroring client.
pub struct MirrorMetrics {
    /// `DELTA_ACK` responses received.
    pub acks: IntCounter,
    /// `DELTA_NACK` responses received.
    pub nacks: IntCounter,
    /// Delta lines sent to the mirror daemon.
    pub lines_sent: IntCounter,
}

/// Counters and histograms for the blob repository.
pub struct BlobMetrics {
    /// Total bytes written to the blob data file.
    pub bytes_written: IntCounter,
    /// Blob fetch operations.
    pub fetches: IntCounter,
    /// Blob store operations.
    pub stores: IntCounter,
    /// Observed duration of blob store operations.
    pub store_duration: Histogram,
}

/// Centralized metrics collection for a database instance.
pub struct Metrics {
    /// Object repository counters.
    pub repository: RepositoryMetrics,
    /// Delta mirror client counters.
    pub mirror: MirrorMetrics,
    /// Blob repository counters.
    pub blob: BlobMetrics,
}

impl Metrics {
    fn new() -> Result<Self> {
        Ok(Self {
            repository: RepositoryMetrics::new(&REGISTRY)?,
            mirror: MirrorMetrics::new(&REGISTRY)?,
            blob: BlobMetrics::new(&REGISTRY)?,
        })
    }

    /// Get the global metrics instance, registering counters on first use.
    pub fn global() -> &'static Metrics {
        static INSTANCE: Lazy<Metrics> = Lazy::new(|| Metrics::new().expect("failed to initialize metrics"));
        &INSTANCE
    }
}

impl RepositoryMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        Ok(Self {
            inserts: register_int_counter_with_registry!("hdb_repo_inserts_total", "Total objects inserted", registry.clone())?,
            fetches: register_int_counter_with_registry!("hdb_repo_fetches_total", "Total objects fetched", registry.clone())?,
            updates: register_int_counter_with_registry!("hdb_repo_updates_total", "Total objects updated", registry.clone())?,
            deletes: register_int_counter_with_registry!("hdb_repo_deletes_total", "Total objects tombstoned", registry.clone())?,
            deltas_replayed: register_int_counter_with_registry!(
                "hdb_repo_deltas_replayed_total",
                "Total delta log lines replayed on open",
                registry.clone()
            )?,
        })
    }
}

impl MirrorMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        Ok(Self {
            acks: register_int_counter_with_registry!("hdb_mirror_acks_total", "Total DELTA_ACK responses received", registry.clone())?,
            nacks: register_int_counter_with_registry!(
                "hdb_mirror_nacks_total",
                "Total DELTA_NACK responses received",
                registry.clone()
            )?,
            lines_sent: register_int_counter_with_registry!(
                "hdb_mirror_lines_sent_total",
                "Total delta lines sent to the mirror daemon",
                registry.clone()
            )?,
        })
    }
}

impl BlobMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        Ok(Self {
            bytes_written: register_int_counter_with_registry!(
                "hdb_blob_bytes_written_total",
                "Total bytes written to blob storage",
                registry.clone()
            )?,
            fetches: register_int_counter_with_registry!("hdb_blob_fetches_total", "Total blob fetch operations", registry.clone())?,
            stores: register_int_counter_with_registry!("hdb_blob_stores_total", "Total blob store operations", registry.clone())?,
            store_duration: register_histogram_with_registry!(
                "hdb_blob_store_duration_seconds",
                "Duration of blob store operations in seconds",
                vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5],
                registry.clone()
            )?,
        })
    }
}

/// Measures elapsed wall-clock time and records it into a histogram on drop.
pub struct Timer {
    start: Instant,
    histogram: Histogram,
}

impl Timer {
    /// Start a new timer against the given histogram.
    pub fn start(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Record the elapsed time and consume the timer.
    pub fn finish(self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}

/// Force registration of the global metrics instance.
pub fn init_registry() {
    let _ = Metrics::global();
}

/// Get the Prometheus registry for serving `/metrics`.
pub fn registry() -> &'static Registry {
    &REGISTRY
}

/// Render all registered metrics in Prometheus text exposition format.
pub fn collect_metrics() -> String {
    let encoder = prometheus::TextEncoder::new();
    let families = registry().gather();
    encoder.encode_to_string(&families).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_metrics_initialize_without_panicking() {
        let metrics = Metrics::global();
        metrics.repository.inserts.inc();
        assert!(metrics.repository.inserts.get() >= 1);
    }

    #[test]
    fn timer_records_duration() {
        let histogram = register_histogram!("hdb_test_timer_seconds", "test timer").unwrap();
        let timer = Timer::start(histogram.clone());
        timer.finish();
        assert_eq!(histogram.get_sample_count(), 1);
    }
}
