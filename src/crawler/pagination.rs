//! Pagination continuation engine
//!
//! A `Feed` describes one paginated sub-resource: where to POST, how each
//! page's form is built, how pages are named, and how a response decides
//! whether paging continues. `paginate` drives any feed to its end.

use crate::crawler::classifier::{classify, DocumentKind};
use crate::crawler::context::CrawlContext;
use crate::crawler::fetcher::{decode_body, FetchOutcome, FetchRequest};
use crate::state::{RetryState, SubresourceKind};
use crate::storage::{PageArtifact, PageName};
use std::path::PathBuf;
use url::Url;

/// Builds the form fields for a page number
pub type FormBuilder = Box<dyn Fn(u32) -> Vec<(&'static str, String)> + Send + Sync>;

/// What to do with a fetched page body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageVerdict {
    /// Save the page and continue with the next one
    Save,

    /// Save the page under the empty-page name and stop
    SaveAsEmpty,

    /// The end sentinel; nothing is saved
    Stop,

    /// The body could not be interpreted; nothing is saved
    Malformed(String),
}

/// One paginated sub-resource of a primary resource
pub struct Feed {
    pub kind: SubresourceKind,
    pub parent_id: u64,
    pub endpoint: Url,
    pub first_page: u32,

    /// Directory the pages are written into
    pub dir: PathBuf,

    pub form: FormBuilder,
    pub verdict: fn(&str) -> PageVerdict,
    pub file_name: fn(u32) -> String,

    /// Whether saved pages are checked for restriction markers
    pub scan_restrictions: bool,
}

/// How a feed's pagination ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedEnd {
    /// Sentinel or empty page reached
    Exhausted,

    /// Cancellation observed before the next page
    Cancelled,

    /// Transport retries ran out
    Abandoned,

    NotFound,

    HttpError(u16),

    Malformed,
}

/// Summary of one feed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedReport {
    pub kind: SubresourceKind,
    pub parent_id: u64,
    pub pages_saved: u32,

    pub end: FeedEnd,
}

/// Requests successive pages of `feed` until its sentinel or a failure
///
/// The retry budget is shared by consecutive pages and reset by every
/// successful fetch. Cancellation is checked before each page.
pub async fn paginate(ctx: &CrawlContext, feed: &Feed) -> crate::Result<FeedReport> {
    let mut retry = RetryState::new(ctx.retry_limit.saturating_sub(1));
    let mut page = feed.first_page;
    let mut pages_saved = 0;
    let label = format!("{} of {}", feed.kind, feed.parent_id);

    let end = loop {
        if ctx.cancel.is_cancelled() {
            tracing::info!("Stopping {} before page {}: cancelled", label, page);
            break FeedEnd::Cancelled;
        }

        let request = FetchRequest::post_form(feed.endpoint.clone(), (feed.form)(page));
        let outcome = match ctx.fetcher.fetch_with_retry(&request, &mut retry).await {
            Ok(outcome) => outcome,
            Err(exhausted) => {
                tracing::error!("Abandoning {} at page {}: {}", label, page, exhausted);
                ctx.notifier
                    .alert(&format!("Abandoned {} at page {}", label, page));
                ctx.stats.record_subresource_abandoned();
                break FeedEnd::Abandoned;
            }
        };
        retry.reset();

        let body = match outcome {
            FetchOutcome::Success { body, .. } => decode_body(&body),
            FetchOutcome::NotFound { .. } => {
                tracing::warn!("Page {} of {} not found, stopping", page, label);
                ctx.notifier.alert(&format!("{} page {} not found", label, page));
                break FeedEnd::NotFound;
            }
            FetchOutcome::HttpError { status_code, .. } => {
                tracing::warn!(
                    "Page {} of {} returned HTTP {}, stopping",
                    page,
                    label,
                    status_code
                );
                ctx.notifier
                    .alert(&format!("{} page {} returned HTTP {}", label, page, status_code));
                break FeedEnd::HttpError(status_code);
            }
            FetchOutcome::TransientFailure { error } => {
                tracing::error!("Abandoning {} at page {}: {}", label, page, error);
                ctx.stats.record_subresource_abandoned();
                break FeedEnd::Abandoned;
            }
        };

        let name = match (feed.verdict)(&body) {
            PageVerdict::Stop => {
                tracing::debug!("{} ends before page {}", label, page);
                break FeedEnd::Exhausted;
            }
            PageVerdict::Malformed(reason) => {
                tracing::warn!("Page {} of {} is malformed: {}", page, label, reason);
                ctx.notifier
                    .alert(&format!("{} page {} is malformed", label, page));
                ctx.stats.record_malformed_response();
                break FeedEnd::Malformed;
            }
            PageVerdict::SaveAsEmpty => PageName::Empty,
            PageVerdict::Save => PageName::Numbered((feed.file_name)(page)),
        };

        let artifact = PageArtifact {
            parent_id: feed.parent_id,
            kind: feed.kind,
            page_number: page,
            name,
            raw_content: body,
        };
        let path = artifact.persist(ctx.store.as_ref(), &feed.dir)?;
        ctx.stats.record_page_saved();
        pages_saved += 1;
        tracing::info!("Saved {}", path.display());

        if feed.scan_restrictions {
            let restrictions = classify(&artifact.raw_content, DocumentKind::FeedPage).restrictions;
            ctx.report_restrictions(&restrictions, &path.display().to_string());
        }

        if artifact.name == PageName::Empty {
            break FeedEnd::Exhausted;
        }

        page += 1;
    };

    Ok(FeedReport {
        kind: feed.kind,
        parent_id: feed.parent_id,
        pages_saved,
        end,
    })
}
