//! Pipeline counters.
//!
//! Lock-free counters plus a serialisable snapshot so the CLI can surface what the
//! pipeline did without an external metrics backend.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct EngineMetrics {
    relevant: AtomicU64,
    filtered: AtomicU64,
    skipped_empty: AtomicU64,
    kept_unavailable: AtomicU64,
    stale_discarded: AtomicU64,
    sections_purged: AtomicU64,
    scans: AtomicU64,
    navigations: AtomicU64,
    navigation_timeouts: AtomicU64,
    embed_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricSnapshot {
    pub relevant: u64,
    pub filtered: u64,
    pub skipped_empty: u64,
    pub kept_unavailable: u64,
    pub stale_discarded: u64,
    pub sections_purged: u64,
    pub scans: u64,
    pub navigations: u64,
    pub navigation_timeouts: u64,
    pub embed_failures: u64,
}

fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl EngineMetrics {
    pub fn record_relevant(&self) {
        bump(&self.relevant, 1);
    }

    pub fn record_filtered(&self) {
        bump(&self.filtered, 1);
    }

    pub fn record_skipped_empty(&self) {
        bump(&self.skipped_empty, 1);
    }

    pub fn record_kept_unavailable(&self) {
        bump(&self.kept_unavailable, 1);
    }

    pub fn record_stale(&self) {
        bump(&self.stale_discarded, 1);
    }

    pub fn record_purged(&self, count: usize) {
        bump(&self.sections_purged, count as u64);
    }

    pub fn record_scan(&self) {
        bump(&self.scans, 1);
    }

    pub fn record_navigation(&self, timed_out: bool) {
        bump(&self.navigations, 1);
        if timed_out {
            bump(&self.navigation_timeouts, 1);
        }
    }

    pub fn record_embed_failure(&self) {
        bump(&self.embed_failures, 1);
    }

    pub fn snapshot(&self) -> MetricSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricSnapshot {
            relevant: load(&self.relevant),
            filtered: load(&self.filtered),
            skipped_empty: load(&self.skipped_empty),
            kept_unavailable: load(&self.kept_unavailable),
            stale_discarded: load(&self.stale_discarded),
            sections_purged: load(&self.sections_purged),
            scans: load(&self.scans),
            navigations: load(&self.navigations),
            navigation_timeouts: load(&self.navigation_timeouts),
            embed_failures: load(&self.embed_failures),
        }
    }
}
