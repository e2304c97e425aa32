//! Per-kind processing of a single ID
//!
//! Each handler performs the primary fetch with its own retry budget, saves
//! the document, classifies it and then drives the sub-resource feeds the
//! classification calls for.

use crate::crawler::classifier::{classify, DocumentKind, Layout};
use crate::crawler::context::CrawlContext;
use crate::crawler::feeds;
use crate::crawler::fetcher::{decode_body, FetchOutcome, FetchRequest};
use crate::crawler::pagination::{paginate, Feed, FeedEnd};
use crate::crawler::walker::{ResourceHandler, UnitOutcome};
use crate::state::{ResourceKind, RetryState};
use crate::url::slug_for;
use crate::{Result, RetryExhausted};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// File name of a post's first page
pub const POST_FIRST_PAGE: &str = "1.html";

/// File name of an author profile or follow overview
pub const MAIN_PAGE: &str = "main.html";

const LIKES_DIR: &str = "likes";
const PRIVATE_LIKES_DIR: &str = "[private]likes";

/// Settled result of a primary fetch
enum Primary {
    Document { body: Vec<u8>, final_url: Url },
    NotFound { final_url: Url },
    HttpError(u16),
}

/// Fetches a primary document with a fresh retry budget
async fn fetch_primary(ctx: &CrawlContext, request: &FetchRequest) -> Result<Primary> {
    let mut retry = RetryState::new(ctx.retry_limit);

    match ctx.fetcher.fetch_with_retry(request, &mut retry).await? {
        FetchOutcome::Success {
            body, final_url, ..
        } => Ok(Primary::Document { body, final_url }),
        FetchOutcome::NotFound { final_url } => Ok(Primary::NotFound { final_url }),
        FetchOutcome::HttpError { status_code, .. } => Ok(Primary::HttpError(status_code)),
        FetchOutcome::TransientFailure { error } => Err(RetryExhausted {
            url: request.url().to_string(),
            attempts: retry.attempts(),
            last_error: error,
        }
        .into()),
    }
}

/// Runs a feed, returning false if cancellation cut it short
async fn run_feed(ctx: &CrawlContext, feed: Feed) -> Result<bool> {
    let report = paginate(ctx, &feed).await?;
    tracing::debug!(
        "{} of {}: {} pages, {:?}",
        report.kind,
        report.parent_id,
        report.pages_saved,
        report.end
    );
    Ok(report.end != FeedEnd::Cancelled)
}

fn write_document(ctx: &CrawlContext, path: &Path, html: &str) -> Result<()> {
    ctx.store.write_file(path, html.as_bytes())?;
    ctx.stats.record_resource_saved();
    tracing::info!("Saved {}", path.display());
    Ok(())
}

/// Posts, dynamics and articles at `{base}/{id}.html`
pub struct PostHandler {
    ctx: Arc<CrawlContext>,
}

impl PostHandler {
    pub fn new(ctx: Arc<CrawlContext>) -> Self {
        Self { ctx }
    }

    async fn save(&self, id: u64, html: String, final_url: &Url) -> Result<UnitOutcome> {
        let ctx = &self.ctx;
        let slug = slug_for(final_url, ctx.site.base(), id);
        let dir = ctx.resource_dir(ResourceKind::Post, &slug);
        let path = dir.join(POST_FIRST_PAGE);
        write_document(ctx, &path, &html)?;

        let classification = classify(&html, DocumentKind::Post);
        ctx.report_restrictions(&classification.restrictions, &path.display().to_string());

        if !classification.has_more_pages {
            return Ok(UnitOutcome::Saved);
        }

        let feed = match (classification.layout, classification.parent_identifier) {
            (Layout::Aggregated, _) => feeds::dynamic_comments(&ctx.site, id, dir),
            (_, Some(thread_id)) => feeds::thread_comments(&ctx.site, id, thread_id, dir),
            (_, None) => {
                tracing::warn!(
                    "Post {} has more replies but no thread id, skipping them",
                    id
                );
                ctx.notifier
                    .alert(&format!("post {} is missing its thread id", id));
                ctx.stats.record_malformed_response();
                return Ok(UnitOutcome::Saved);
            }
        };

        if run_feed(ctx, feed).await? {
            Ok(UnitOutcome::Saved)
        } else {
            Ok(UnitOutcome::Interrupted)
        }
    }
}

impl ResourceHandler for PostHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Post
    }

    async fn process(&self, id: u64) -> Result<UnitOutcome> {
        let ctx = &self.ctx;
        let request = FetchRequest::get(ctx.site.post_url(id)?);

        match fetch_primary(ctx, &request).await? {
            Primary::Document { body, final_url } => {
                self.save(id, decode_body(&body), &final_url).await
            }
            Primary::NotFound { final_url } => {
                let slug = slug_for(&final_url, ctx.site.base(), id);
                ctx.mark_not_found(ResourceKind::Post, &slug)?;
                Ok(UnitOutcome::NotFound)
            }
            Primary::HttpError(status_code) => {
                ctx.report_http_error(ResourceKind::Post, id, status_code);
                Ok(UnitOutcome::HttpError(status_code))
            }
        }
    }
}

/// Author profiles at `{base}/author/{id}` and their profile feeds
pub struct AuthorHandler {
    ctx: Arc<CrawlContext>,
}

impl AuthorHandler {
    pub fn new(ctx: Arc<CrawlContext>) -> Self {
        Self { ctx }
    }

    async fn save(&self, id: u64, html: String, final_url: &Url) -> Result<UnitOutcome> {
        let ctx = &self.ctx;
        let slug = slug_for(final_url, ctx.site.author_base(), id);
        let dir = ctx.resource_dir(ResourceKind::Author, &slug);
        let path = dir.join(MAIN_PAGE);
        write_document(ctx, &path, &html)?;

        let classification = classify(&html, DocumentKind::AuthorProfile);
        ctx.report_restrictions(&classification.restrictions, &path.display().to_string());

        let mut complete = true;

        if classification.has_more_pages {
            let feed = feeds::author_dynamics(&ctx.site, id, dir.join("dynamics"));
            complete &= run_feed(ctx, feed).await?;
        }

        if complete {
            complete &= self.save_follow_lists(id, &dir.join("follow")).await?;
        }

        if complete {
            let feed = feeds::forwards(&ctx.site, id, dir.join("forwards"));
            complete &= run_feed(ctx, feed).await?;
        }

        if complete {
            let likes_dir = if classification.likes_public {
                LIKES_DIR
            } else {
                PRIVATE_LIKES_DIR
            };
            let feed = feeds::likes(&ctx.site, id, dir.join(likes_dir));
            complete &= run_feed(ctx, feed).await?;
        }

        if complete {
            Ok(UnitOutcome::Saved)
        } else {
            Ok(UnitOutcome::Interrupted)
        }
    }

    /// Saves the follow overview, then pages through following and fans
    ///
    /// The lists are skipped when the overview itself is unavailable.
    async fn save_follow_lists(&self, id: u64, follow_dir: &Path) -> Result<bool> {
        let ctx = &self.ctx;
        if ctx.cancel.is_cancelled() {
            return Ok(false);
        }

        let request = FetchRequest::post_form(
            ctx.site.member_follow.clone(),
            vec![("author_id", id.to_string())],
        );
        let mut retry = RetryState::new(ctx.retry_limit.saturating_sub(1));

        match ctx.fetcher.fetch_with_retry(&request, &mut retry).await {
            Ok(FetchOutcome::Success { body, .. }) => {
                let path = follow_dir.join(MAIN_PAGE);
                ctx.store.write_file(&path, &body)?;
                ctx.stats.record_page_saved();
                tracing::info!("Saved {}", path.display());
            }
            Ok(FetchOutcome::NotFound { .. }) => {
                tracing::warn!("Follow overview of author {} not found", id);
                ctx.notifier
                    .alert(&format!("follow overview of author {} not found", id));
                return Ok(true);
            }
            Ok(FetchOutcome::HttpError { status_code, .. }) => {
                tracing::warn!(
                    "Follow overview of author {} returned HTTP {}",
                    id,
                    status_code
                );
                ctx.notifier.alert(&format!(
                    "follow overview of author {} returned HTTP {}",
                    id, status_code
                ));
                return Ok(true);
            }
            Ok(FetchOutcome::TransientFailure { error }) => {
                tracing::error!("Abandoning follow lists of author {}: {}", id, error);
                ctx.stats.record_subresource_abandoned();
                return Ok(true);
            }
            Err(exhausted) => {
                tracing::error!("Abandoning follow lists of author {}: {}", id, exhausted);
                ctx.notifier
                    .alert(&format!("abandoned follow lists of author {}", id));
                ctx.stats.record_subresource_abandoned();
                return Ok(true);
            }
        }

        let following = feeds::following(&ctx.site, id, follow_dir.join("following"));
        if !run_feed(ctx, following).await? {
            return Ok(false);
        }

        let fans = feeds::fans(&ctx.site, id, follow_dir.join("fans"));
        run_feed(ctx, fans).await
    }
}

impl ResourceHandler for AuthorHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Author
    }

    async fn process(&self, id: u64) -> Result<UnitOutcome> {
        let ctx = &self.ctx;
        let request = FetchRequest::get(ctx.site.author_url(id)?);

        match fetch_primary(ctx, &request).await? {
            Primary::Document { body, final_url } => {
                self.save(id, decode_body(&body), &final_url).await
            }
            Primary::NotFound { final_url } => {
                let slug = slug_for(&final_url, ctx.site.author_base(), id);
                ctx.mark_not_found(ResourceKind::Author, &slug)?;
                Ok(UnitOutcome::NotFound)
            }
            Primary::HttpError(status_code) => {
                ctx.report_http_error(ResourceKind::Author, id, status_code);
                Ok(UnitOutcome::HttpError(status_code))
            }
        }
    }
}

/// Author info-cards from the card stencil endpoint
pub struct AuthorCardHandler {
    ctx: Arc<CrawlContext>,
}

impl AuthorCardHandler {
    pub fn new(ctx: Arc<CrawlContext>) -> Self {
        Self { ctx }
    }

    fn card_path(&self, id: u64) -> PathBuf {
        self.ctx
            .root
            .join(ResourceKind::AuthorCard.dir_name())
            .join(format!("{}.html", id))
    }
}

impl ResourceHandler for AuthorCardHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::AuthorCard
    }

    async fn process(&self, id: u64) -> Result<UnitOutcome> {
        let ctx = &self.ctx;
        let request = FetchRequest::post_form(
            ctx.site.info_card.clone(),
            vec![("author_id", id.to_string()), ("info_card", "1".to_string())],
        );

        match fetch_primary(ctx, &request).await? {
            Primary::Document { body, .. } => {
                write_document(ctx, &self.card_path(id), &decode_body(&body))?;
                Ok(UnitOutcome::Saved)
            }
            Primary::NotFound { .. } => {
                ctx.mark_not_found(ResourceKind::AuthorCard, &id.to_string())?;
                Ok(UnitOutcome::NotFound)
            }
            Primary::HttpError(status_code) => {
                ctx.report_http_error(ResourceKind::AuthorCard, id, status_code);
                Ok(UnitOutcome::HttpError(status_code))
            }
        }
    }
}
