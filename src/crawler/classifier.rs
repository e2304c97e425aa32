//! Content classification for fetched documents
//!
//! Pages are inspected for a fixed set of class-name markers. The marker
//! vocabulary lives in one table so it can be audited and tested alone.
//!
//! Parsing happens entirely inside synchronous functions that return owned
//! data; no parsed document is ever held across an await point.

use scraper::{Html, Selector};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Content gated away from the anonymous crawler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RestrictionKind {
    /// Visible only to followers of the author
    FollowGated,

    /// Visible only after replying
    ReplyGated,

    /// Requires a purchase or login
    PurchaseOrLoginGated,
}

impl RestrictionKind {
    pub fn description(&self) -> &'static str {
        match self {
            Self::FollowGated => "follower-only content",
            Self::ReplyGated => "reply-to-view content",
            Self::PurchaseOrLoginGated => "purchase or login gated content",
        }
    }
}

impl fmt::Display for RestrictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// What the presence of a marker class means
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerMeaning {
    Restricted(RestrictionKind),

    /// The post page is a dynamic/article with an aggregated comment list
    AggregatedListing,

    /// More comments exist beyond the first page of a dynamic/article
    MoreComments,

    /// More replies exist beyond the first page of a thread
    MoreThreadComments,

    /// An author profile has more posts to load
    MorePosts,

    /// A feed page explicitly states it has nothing to show
    EmptyPage,
}

/// Marker class names and their meaning
pub const MARKER_CLASSES: &[(&str, MarkerMeaning)] = &[
    ("follow-see", MarkerMeaning::Restricted(RestrictionKind::FollowGated)),
    ("comment-see", MarkerMeaning::Restricted(RestrictionKind::ReplyGated)),
    (
        "jinsom-tips",
        MarkerMeaning::Restricted(RestrictionKind::PurchaseOrLoginGated),
    ),
    ("jinsom-posts-list", MarkerMeaning::AggregatedListing),
    ("jinsom-post-comment-more", MarkerMeaning::MoreComments),
    ("jinsom-bbs-comment-list-page", MarkerMeaning::MoreThreadComments),
    ("jinsom-more-posts", MarkerMeaning::MorePosts),
    ("jinsom-empty-page", MarkerMeaning::EmptyPage),
];

/// Element carrying the thread identifier on thread pages
const THREAD_HEADER_SELECTOR: &str = ".jinsom-bbs-single-header";
const THREAD_ID_ATTR: &str = "data";

/// Looks up the meaning of a single class name
pub fn marker_for_class(class: &str) -> Option<MarkerMeaning> {
    MARKER_CLASSES
        .iter()
        .find(|(name, _)| *name == class)
        .map(|(_, meaning)| *meaning)
}

/// Which kind of page is being classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// A primary post page
    Post,

    /// A primary author profile page
    AuthorProfile,

    /// One page of a paginated feed
    FeedPage,
}

/// Structure of a classified page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Dynamic or article, comments continue via the dynamic comment feed
    Aggregated,

    /// Discussion thread, replies continue via the thread comment feed
    Thread,

    Profile,

    Fragment,
}

/// Result of classifying one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub restrictions: BTreeSet<RestrictionKind>,
    pub layout: Layout,
    pub has_more_pages: bool,

    /// Thread identifier needed to continue a thread's replies
    pub parent_identifier: Option<String>,

    /// Whether the profile exposes a likes tab; always false for non-profiles
    pub likes_public: bool,
}

/// Classifies a fetched document
pub fn classify(html: &str, kind: DocumentKind) -> Classification {
    let document = Html::parse_document(html);
    let present = present_markers(&document);

    let restrictions = present
        .iter()
        .filter_map(|meaning| match meaning {
            MarkerMeaning::Restricted(kind) => Some(*kind),
            _ => None,
        })
        .collect();

    let layout = match kind {
        DocumentKind::Post if present.contains(&MarkerMeaning::AggregatedListing) => {
            Layout::Aggregated
        }
        DocumentKind::Post => Layout::Thread,
        DocumentKind::AuthorProfile => Layout::Profile,
        DocumentKind::FeedPage => Layout::Fragment,
    };

    let has_more_pages = match layout {
        Layout::Aggregated => present.contains(&MarkerMeaning::MoreComments),
        Layout::Thread => present.contains(&MarkerMeaning::MoreThreadComments),
        Layout::Profile => present.contains(&MarkerMeaning::MorePosts),
        Layout::Fragment => false,
    };

    let parent_identifier = if layout == Layout::Thread && has_more_pages {
        thread_identifier(&document)
    } else {
        None
    };

    Classification {
        restrictions,
        layout,
        has_more_pages,
        parent_identifier,
        likes_public: kind == DocumentKind::AuthorProfile && has_public_likes(&document),
    }
}

/// Returns true if a feed page carries the explicit empty marker
pub fn has_empty_marker(html: &str) -> bool {
    let document = Html::parse_document(html);
    present_markers(&document).contains(&MarkerMeaning::EmptyPage)
}

fn present_markers(document: &Html) -> HashSet<MarkerMeaning> {
    let mut present = HashSet::new();
    let Ok(selector) = Selector::parse("[class]") else {
        return present;
    };

    for element in document.select(&selector) {
        for class in element.value().classes() {
            if let Some(meaning) = marker_for_class(class) {
                present.insert(meaning);
            }
        }
    }

    present
}

fn thread_identifier(document: &Html) -> Option<String> {
    let selector = Selector::parse(THREAD_HEADER_SELECTOR).ok()?;
    document
        .select(&selector)
        .next()?
        .value()
        .attr(THREAD_ID_ATTR)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// A profile exposes likes when one of its tabs is `<li type="like">`
fn has_public_likes(document: &Html) -> bool {
    let Ok(selector) = Selector::parse("li[type]") else {
        return false;
    };

    document.select(&selector).any(|li| {
        li.value()
            .attr("type")
            .map(|t| t.eq_ignore_ascii_case("like"))
            .unwrap_or(false)
    })
}
