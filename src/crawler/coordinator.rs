//! Crawler coordinator - top-level run orchestration
//!
//! Builds the shared crawl context from the configuration and runs the
//! selected walkers one after another: posts, authors, author cards, then the
//! static asset walk over everything saved so far.

use crate::config::{AuthorMode, Config};
use crate::crawler::context::CrawlContext;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::handlers::{AuthorCardHandler, AuthorHandler, PostHandler};
use crate::crawler::walker::{ResourceHandler, ResourceWalker, WalkMode, WalkReport};
use crate::mirror::{AssetReport, AssetWalker, MirrorResolver};
use crate::output::{CrawlStats, Notifier, StatsSnapshot};
use crate::storage::{CursorStore, FsStorage};
use crate::url::SiteUrls;
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A unit of work selectable for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Posts,
    Authors,
    AuthorCards,
    Assets,
}

impl Target {
    /// Every target in run order
    pub const ALL: [Target; 4] = [
        Self::Posts,
        Self::Authors,
        Self::AuthorCards,
        Self::Assets,
    ];
}

/// Everything a finished run reports
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub walks: Vec<WalkReport>,
    pub assets: Option<AssetReport>,
    pub stats: StatsSnapshot,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    ctx: Arc<CrawlContext>,
    cursors: CursorStore,
}

impl Coordinator {
    /// Creates a coordinator, opening the cursor directory
    pub fn new(
        config: Config,
        notifier: Arc<dyn Notifier>,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let site = SiteUrls::new(&config.site)?;
        let client = build_http_client(&config.site, &config.user_agent)?;
        let cursors = CursorStore::open(&config.output.state_dir)?;

        let ctx = CrawlContext {
            fetcher: Fetcher::new(client),
            site,
            store: Arc::new(FsStorage::new()),
            stats: Arc::new(CrawlStats::new()),
            notifier,
            cancel,
            root: PathBuf::from(&config.output.root),
            retry_limit: config.crawler.retry_limit,
        };

        Ok(Self {
            config: Arc::new(config),
            ctx: Arc::new(ctx),
            cursors,
        })
    }

    pub fn cursors(&mut self) -> &mut CursorStore {
        &mut self.cursors
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.ctx.stats.snapshot()
    }

    /// Runs `targets` in order, stopping early only on cancellation
    ///
    /// A walker that stops on exhausted retries does not prevent the
    /// following targets from running.
    pub async fn run(&mut self, targets: &[Target]) -> Result<RunOutcome> {
        let config = Arc::clone(&self.config);
        let crawler = &config.crawler;
        let mut walks = Vec::new();
        let mut assets = None;

        for target in targets {
            if self.ctx.cancel.is_cancelled() {
                tracing::info!("Cancelled, skipping remaining targets");
                break;
            }

            match target {
                Target::Posts => {
                    let handler = PostHandler::new(Arc::clone(&self.ctx));
                    walks.push(
                        self.walk(handler, crawler.post_ceiling, WalkMode::Sequential)
                            .await?,
                    );
                }
                Target::Authors => {
                    let mode = match crawler.author_mode {
                        AuthorMode::Sequential => WalkMode::Sequential,
                        AuthorMode::Batched => WalkMode::Batched {
                            window: crawler.author_batch_size,
                        },
                    };
                    let handler = AuthorHandler::new(Arc::clone(&self.ctx));
                    walks.push(self.walk(handler, crawler.author_ceiling, mode).await?);
                }
                Target::AuthorCards => {
                    let handler = AuthorCardHandler::new(Arc::clone(&self.ctx));
                    walks.push(
                        self.walk(
                            handler,
                            crawler.author_card_ceiling,
                            WalkMode::Sequential,
                        )
                        .await?,
                    );
                }
                Target::Assets => assets = Some(self.mirror_assets().await?),
            }
        }

        Ok(RunOutcome {
            walks,
            assets,
            stats: self.stats(),
        })
    }

    async fn walk<H: ResourceHandler>(
        &mut self,
        handler: H,
        ceiling: u64,
        mode: WalkMode,
    ) -> Result<WalkReport> {
        let walker = ResourceWalker::new(
            Arc::new(handler),
            ceiling,
            mode,
            self.ctx.cancel.clone(),
            Arc::clone(&self.ctx.notifier),
        );
        walker.run(&mut self.cursors).await
    }

    async fn mirror_assets(&self) -> Result<AssetReport> {
        let output = &self.config.output;
        let source = PathBuf::from(
            self.config
                .mirror
                .source_dir
                .as_deref()
                .unwrap_or(output.root.as_str()),
        );

        let resolver = MirrorResolver::new(
            self.ctx.site.clone(),
            &output.mirror_root,
            &self.config.mirror,
        );

        let walker = AssetWalker::new(
            self.ctx.fetcher.clone(),
            resolver,
            Arc::clone(&self.ctx.store),
            Arc::clone(&self.ctx.stats),
            self.ctx.cancel.clone(),
        )
        .with_browser_user_agent(self.config.user_agent.browser_user_agent.as_str())
        .with_delay(Duration::from_millis(self.config.crawler.asset_delay_ms))
        .skip_dir(&output.mirror_root);

        walker.run(&source).await
    }
}

/// Runs a complete mirror pass with the given targets
pub async fn run_mirror(
    config: Config,
    targets: &[Target],
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
) -> Result<RunOutcome> {
    let mut coordinator = Coordinator::new(config, notifier, cancel)?;
    coordinator.run(targets).await
}
