//! Markdown summary generation
//!
//! This module generates a human-readable markdown summary of one run: when
//! it ran, which configuration produced it, where each walker stopped and
//! what the counters recorded.

use crate::crawler::{WalkReport, WalkStop};
use crate::mirror::AssetReport;
use crate::output::StatsSnapshot;
use crate::state::ResourceKind;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Everything recorded about one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config_hash: String,
    pub base_url: String,
    pub walks: Vec<WalkReport>,
    pub assets: Option<AssetReport>,

    /// Cursor positions after the run
    pub cursors: Vec<(ResourceKind, u64)>,

    pub stats: StatsSnapshot,
}

impl RunSummary {
    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }
}

/// Writes the markdown summary to `output_path`
pub fn generate_markdown_summary(summary: &RunSummary, output_path: &Path) -> std::io::Result<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

fn describe_stop(stop: &WalkStop) -> String {
    match stop {
        WalkStop::CeilingReached => "ceiling reached".to_string(),
        WalkStop::Cancelled => "cancelled".to_string(),
        WalkStop::RetryExhausted { id } => format!("retries exhausted at {}", id),
    }
}

/// Formats a run summary as markdown
pub fn format_markdown_summary(summary: &RunSummary) -> String {
    let mut md = String::new();

    md.push_str("# LightSNS Mirror Run Summary\n\n");

    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Site**: {}\n", summary.base_url));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", summary.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds ({:.2} minutes)\n",
        summary.duration_seconds(),
        summary.duration_seconds() as f64 / 60.0
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    if !summary.walks.is_empty() {
        md.push_str("## Walkers\n\n");
        md.push_str("| Kind | Start | End | Advanced | Stopped |\n");
        md.push_str("|------|-------|-----|----------|---------|\n");
        for walk in &summary.walks {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                walk.kind,
                walk.start,
                walk.end,
                walk.advanced(),
                describe_stop(&walk.stop)
            ));
        }
        md.push('\n');
    }

    if !summary.cursors.is_empty() {
        md.push_str("## Cursors\n\n");
        for (kind, position) in &summary.cursors {
            md.push_str(&format!("- **{}**: {}\n", kind.cursor_file(), position));
        }
        md.push('\n');
    }

    let stats = &summary.stats;
    md.push_str("## Resources\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Saved | {} |\n", stats.resources_saved));
    md.push_str(&format!("| Not found (404) | {} |\n", stats.not_found));
    md.push_str(&format!("| HTTP errors | {} |\n", stats.http_errors));
    md.push_str(&format!(
        "| Restriction alerts | {} |\n\n",
        stats.restriction_alerts
    ));

    md.push_str("## Sub-resources\n\n");
    md.push_str(&format!("- **Pages saved**: {}\n", stats.pages_saved));
    md.push_str(&format!(
        "- **Abandoned feeds**: {}\n",
        stats.subresources_abandoned
    ));
    md.push_str(&format!(
        "- **Malformed responses**: {}\n\n",
        stats.malformed_responses
    ));

    if let Some(assets) = &summary.assets {
        md.push_str("## Static Assets\n\n");
        md.push_str(&format!(
            "- **Documents scanned**: {}\n",
            assets.documents_scanned
        ));
        md.push_str(&format!("- **References seen**: {}\n", assets.references_seen));
        md.push_str(&format!("- **Saved**: {}\n", stats.assets_saved));
        md.push_str(&format!("- **Already present**: {}\n", stats.assets_skipped));
        md.push_str(&format!("- **Failed**: {}\n", stats.assets_failed));
        if assets.cancelled {
            md.push_str("- Walk was cancelled before finishing\n");
        }
        md.push('\n');
    }

    md
}
