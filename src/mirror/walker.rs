//! Static asset walker
//!
//! Scans a directory tree of saved HTML depth-first, extracts every reference
//! and mirrors the ones the resolver accepts. Each target is fetched once;
//! failures are logged and counted, never retried. Targets that already have
//! content on disk are skipped, so re-runs only fetch what is missing.

use crate::crawler::{FetchOutcome, FetchRequest, Fetcher};
use crate::mirror::links::extract_references;
use crate::mirror::resolver::{MirrorResolver, MirrorTarget};
use crate::output::CrawlStats;
use crate::storage::ArtifactStore;
use crate::Result;
use reqwest::header::{ACCEPT, REFERER, USER_AGENT};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Accept header sent to the asset CDN
const CDN_ACCEPT: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";

/// Paces requests to the asset host: every other request waits
#[derive(Debug)]
pub struct AlternatingDelay {
    delay: Duration,
    wait_next: bool,
}

impl AlternatingDelay {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            wait_next: false,
        }
    }

    /// Returns the pause owed before the next request
    pub fn next_pause(&mut self) -> Option<Duration> {
        let pause = self.wait_next.then_some(self.delay);
        self.wait_next = !self.wait_next;
        pause.filter(|d| !d.is_zero())
    }

    async fn pace(&mut self) {
        if let Some(pause) = self.next_pause() {
            tokio::time::sleep(pause).await;
        }
    }
}

/// Summary of one asset walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetReport {
    pub documents_scanned: u64,
    pub references_seen: u64,
    pub cancelled: bool,
}

/// Walks saved documents and mirrors their assets
pub struct AssetWalker {
    fetcher: Fetcher,
    resolver: MirrorResolver,
    store: Arc<dyn ArtifactStore>,
    stats: Arc<CrawlStats>,
    cancel: CancellationToken,
    browser_user_agent: String,
    delay: Duration,

    /// Directories never descended into, such as the mirror root itself
    skip_dirs: Vec<PathBuf>,
}

impl AssetWalker {
    pub fn new(
        fetcher: Fetcher,
        resolver: MirrorResolver,
        store: Arc<dyn ArtifactStore>,
        stats: Arc<CrawlStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            store,
            stats,
            cancel,
            browser_user_agent: String::new(),
            delay: Duration::ZERO,
            skip_dirs: Vec::new(),
        }
    }

    /// User agent presented to the asset CDN
    pub fn with_browser_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.browser_user_agent = user_agent.into();
        self
    }

    /// Pause inserted before every other asset-host request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn skip_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.skip_dirs.push(dir.into());
        self
    }

    /// Walks `source` depth-first, files before subdirectories
    pub async fn run(&self, source: &Path) -> Result<AssetReport> {
        let mut report = AssetReport::default();
        let mut pacer = AlternatingDelay::new(self.delay);
        let mut pending = vec![source.to_path_buf()];

        tracing::info!("Mirroring assets referenced under {}", source.display());

        'walk: while let Some(dir) = pending.pop() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let (documents, subdirs) = match list_dir(&dir) {
                Ok(listing) => listing,
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory {}: {}", dir.display(), e);
                    continue;
                }
            };

            for document in documents {
                if self.cancel.is_cancelled() {
                    report.cancelled = true;
                    break 'walk;
                }
                self.mirror_document(&document, &mut pacer, &mut report)
                    .await;
            }

            pending.extend(
                subdirs
                    .into_iter()
                    .filter(|d| !self.is_skipped(d))
                    .rev(),
            );
        }

        report.cancelled |= self.cancel.is_cancelled();
        tracing::info!(
            "Asset walk scanned {} documents, {} references",
            report.documents_scanned,
            report.references_seen
        );
        Ok(report)
    }

    /// Compares canonical paths, so `./out/Static` and `out/Static` match
    fn is_skipped(&self, dir: &Path) -> bool {
        let Ok(dir) = std::fs::canonicalize(dir) else {
            return false;
        };
        self.skip_dirs
            .iter()
            .filter_map(|skip| std::fs::canonicalize(skip).ok())
            .any(|skip| skip == dir)
    }

    async fn mirror_document(
        &self,
        document: &Path,
        pacer: &mut AlternatingDelay,
        report: &mut AssetReport,
    ) {
        let html = match self.store.read_to_string(document) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", document.display(), e);
                return;
            }
        };
        report.documents_scanned += 1;
        tracing::debug!("Scanning {}", document.display());

        for reference in extract_references(&html) {
            if self.cancel.is_cancelled() {
                return;
            }
            report.references_seen += 1;

            let target = match self.resolver.resolve(&reference) {
                Ok(target) => target,
                Err(reason) => {
                    tracing::trace!("Skipping {}: {}", reference, reason);
                    continue;
                }
            };

            if self.store.has_content(&target.local_path) {
                self.stats.record_asset_skipped();
                continue;
            }

            if target.via_cdn {
                pacer.pace().await;
            }
            self.fetch_target(&target).await;
        }
    }

    async fn fetch_target(&self, target: &MirrorTarget) {
        let mut request = FetchRequest::get(target.fetch_uri.clone());
        if target.via_cdn {
            request = request
                .with_header(USER_AGENT, self.browser_user_agent.as_str())
                .with_header(REFERER, self.resolver.site().base().as_str())
                .with_header(ACCEPT, CDN_ACCEPT);
        }

        match self.fetcher.fetch(&request).await {
            FetchOutcome::Success { body, .. } => {
                match self.store.write_file(&target.local_path, &body) {
                    Ok(()) => {
                        self.stats.record_asset_saved();
                        tracing::info!(
                            "Mirrored {} -> {}",
                            target.source_uri,
                            target.local_path.display()
                        );
                    }
                    Err(e) => {
                        self.stats.record_asset_failed();
                        tracing::warn!("Cannot write {}: {}", target.local_path.display(), e);
                    }
                }
            }
            FetchOutcome::NotFound { .. } => {
                self.stats.record_asset_failed();
                tracing::info!("Asset not found: {}", target.fetch_uri);
            }
            FetchOutcome::HttpError { status_code, .. } => {
                self.stats.record_asset_failed();
                tracing::warn!("Asset {} returned HTTP {}", target.fetch_uri, status_code);
            }
            FetchOutcome::TransientFailure { error } => {
                self.stats.record_asset_failed();
                tracing::warn!("Asset {} failed: {}", target.fetch_uri, error);
            }
        }
    }
}

/// Lists `.html` files and subdirectories, both sorted by name
fn list_dir(dir: &Path) -> std::io::Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut documents = Vec::new();
    let mut subdirs = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            subdirs.push(path);
        } else if file_type.is_file() && is_html(&path) {
            documents.push(path);
        }
    }

    documents.sort();
    subdirs.sort();
    Ok((documents, subdirs))
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("html"))
        .unwrap_or(false)
}
