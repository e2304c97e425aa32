//! Run statistics shared by every walker
//!
//! Counters are atomic so the batched author walker's concurrent workers can
//! record outcomes without any locking.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters for one run
#[derive(Debug, Default)]
pub struct CrawlStats {
    resources_saved: AtomicU64,
    not_found: AtomicU64,
    http_errors: AtomicU64,
    restriction_alerts: AtomicU64,
    pages_saved: AtomicU64,
    subresources_abandoned: AtomicU64,
    malformed_responses: AtomicU64,
    assets_saved: AtomicU64,
    assets_skipped: AtomicU64,
    assets_failed: AtomicU64,
}

macro_rules! counter {
    ($record:ident, $field:ident) => {
        pub fn $record(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    counter!(record_resource_saved, resources_saved);
    counter!(record_not_found, not_found);
    counter!(record_http_error, http_errors);
    counter!(record_restriction_alert, restriction_alerts);
    counter!(record_page_saved, pages_saved);
    counter!(record_subresource_abandoned, subresources_abandoned);
    counter!(record_malformed_response, malformed_responses);
    counter!(record_asset_saved, assets_saved);
    counter!(record_asset_skipped, assets_skipped);
    counter!(record_asset_failed, assets_failed);

    /// Takes a point-in-time copy of every counter
    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StatsSnapshot {
            resources_saved: load(&self.resources_saved),
            not_found: load(&self.not_found),
            http_errors: load(&self.http_errors),
            restriction_alerts: load(&self.restriction_alerts),
            pages_saved: load(&self.pages_saved),
            subresources_abandoned: load(&self.subresources_abandoned),
            malformed_responses: load(&self.malformed_responses),
            assets_saved: load(&self.assets_saved),
            assets_skipped: load(&self.assets_skipped),
            assets_failed: load(&self.assets_failed),
        }
    }
}

/// Plain copy of the counters, used for printing and summaries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub resources_saved: u64,
    pub not_found: u64,
    pub http_errors: u64,
    pub restriction_alerts: u64,
    pub pages_saved: u64,
    pub subresources_abandoned: u64,
    pub malformed_responses: u64,
    pub assets_saved: u64,
    pub assets_skipped: u64,
    pub assets_failed: u64,
}

impl StatsSnapshot {
    /// Resources whose processing completed, whatever the outcome
    pub fn resources_completed(&self) -> u64 {
        self.resources_saved + self.not_found + self.http_errors
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StatsSnapshot) {
    println!("=== Mirror Statistics ===\n");

    println!("Resources:");
    println!("  Saved: {}", stats.resources_saved);
    println!("  Not found: {}", stats.not_found);
    println!("  HTTP errors: {}", stats.http_errors);
    println!("  Restriction alerts: {}", stats.restriction_alerts);
    println!();

    println!("Sub-resources:");
    println!("  Pages saved: {}", stats.pages_saved);
    println!("  Abandoned: {}", stats.subresources_abandoned);
    println!("  Malformed responses: {}", stats.malformed_responses);
    println!();

    println!("Static assets:");
    println!("  Saved: {}", stats.assets_saved);
    println!("  Already present: {}", stats.assets_skipped);
    println!("  Failed: {}", stats.assets_failed);
}
