//! Crawler module for walking the site's ID spaces
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded transport retries
//! - Classification of fetched pages by their marker classes
//! - The generic "paginate until sentinel" engine and its feed definitions
//! - Per-kind handlers and the sequential/batched resource walker
//! - Overall run coordination

mod classifier;
mod context;
mod coordinator;
pub mod feeds;
mod fetcher;
mod handlers;
mod pagination;
mod walker;

pub use classifier::{
    classify, has_empty_marker, marker_for_class, Classification, DocumentKind, Layout,
    MarkerMeaning, RestrictionKind, MARKER_CLASSES,
};
pub use context::{CrawlContext, NOT_FOUND_PREFIX};
pub use coordinator::{run_mirror, Coordinator, RunOutcome, Target};
pub use fetcher::{build_http_client, decode_body, FetchOutcome, FetchRequest, Fetcher};
pub use handlers::{AuthorCardHandler, AuthorHandler, PostHandler, MAIN_PAGE, POST_FIRST_PAGE};
pub use pagination::{paginate, Feed, FeedEnd, FeedReport, FormBuilder, PageVerdict};
pub use walker::{ResourceHandler, ResourceWalker, UnitOutcome, WalkMode, WalkReport, WalkStop};

