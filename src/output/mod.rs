//! Output module for run reporting
//!
//! This module handles:
//! - Operator alerts for terminal and restricted conditions
//! - Live run counters and their terminal printout
//! - The markdown run summary

mod alert;
mod markdown;
pub mod stats;

pub use alert::{Notifier, SilentNotifier, TerminalBell};
pub use markdown::{format_markdown_summary, generate_markdown_summary, RunSummary};
pub use stats::{print_statistics, CrawlStats, StatsSnapshot};
