use crate::crawler::classifier::RestrictionKind;
use crate::crawler::fetcher::Fetcher;
use crate::output::{CrawlStats, Notifier};
use crate::state::ResourceKind;
use crate::storage::{ArtifactStore, StorageResult};
use crate::url::SiteUrls;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Prefix of the marker directory recorded for a missing resource
pub const NOT_FOUND_PREFIX: &str = "[404]";

/// Everything a resource handler needs, shared by all workers of a run
pub struct CrawlContext {
    pub fetcher: Fetcher,
    pub site: SiteUrls,
    pub store: Arc<dyn ArtifactStore>,
    pub stats: Arc<CrawlStats>,
    pub notifier: Arc<dyn Notifier>,
    pub cancel: CancellationToken,

    /// Output root holding `Posts/`, `Authors/` and `AuthorCards/`
    pub root: PathBuf,

    /// Transport retries allowed per unit of work
    pub retry_limit: u32,
}

impl CrawlContext {
    /// `{root}/{Kind}/{name}`
    pub fn resource_dir(&self, kind: ResourceKind, name: &str) -> PathBuf {
        self.root.join(kind.dir_name()).join(name)
    }

    /// Records a 404 as an empty `[404]{slug}` directory
    pub fn mark_not_found(&self, kind: ResourceKind, slug: &str) -> StorageResult<PathBuf> {
        let dir = self.resource_dir(kind, &format!("{}{}", NOT_FOUND_PREFIX, slug));
        self.store.ensure_dir(&dir)?;
        self.stats.record_not_found();
        tracing::info!("{} {} not found, marked {}", kind, slug, dir.display());
        Ok(dir)
    }

    /// Logs and alerts on a non-404 failure status; the resource still counts as done
    pub fn report_http_error(&self, kind: ResourceKind, id: u64, status_code: u16) {
        tracing::warn!("Could not save {} {}: HTTP {}", kind, id, status_code);
        self.notifier
            .alert(&format!("{} {} returned HTTP {}", kind, id, status_code));
        self.stats.record_http_error();
    }

    /// Logs and alerts once per restriction kind found in a document
    pub fn report_restrictions(&self, restrictions: &BTreeSet<RestrictionKind>, location: &str) {
        for restriction in restrictions {
            tracing::warn!("{} contains {}", location, restriction);
            self.notifier
                .alert(&format!("{} contains {}", location, restriction));
            self.stats.record_restriction_alert();
        }
    }
}
