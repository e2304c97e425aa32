//! Feed definitions for every paginated sub-resource
//!
//! Each constructor supplies the three things that vary between feeds: the
//! form for a page number, the stopping rule, and the page file name.

use crate::crawler::classifier::has_empty_marker;
use crate::crawler::pagination::{Feed, PageVerdict};
use crate::state::SubresourceKind;
use crate::url::SiteUrls;
use std::path::PathBuf;

/// Replies per thread comment page
const THREAD_COMMENTS_PER_PAGE: &str = "10";

/// Accounts per follow list page
const FOLLOWS_PER_PAGE: &str = "30";

/// Returns true for the listing end sentinel: literal `0` or a blank body
pub fn is_end_sentinel(body: &str) -> bool {
    body == "0" || body.trim().is_empty()
}

/// Listing feeds without an empty-page marker
pub fn listing_verdict(body: &str) -> PageVerdict {
    if is_end_sentinel(body) {
        PageVerdict::Stop
    } else {
        PageVerdict::Save
    }
}

/// Listing feeds that may answer with an explicit empty page
pub fn listing_with_empty_verdict(body: &str) -> PageVerdict {
    if is_end_sentinel(body) {
        PageVerdict::Stop
    } else if has_empty_marker(body) {
        PageVerdict::SaveAsEmpty
    } else {
        PageVerdict::Save
    }
}

/// JSON feeds stop when `code` is 0
///
/// A body that is not JSON, or lacks `code`, is malformed.
pub fn json_code_verdict(body: &str) -> PageVerdict {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return PageVerdict::Malformed(e.to_string()),
    };

    match value.get("code") {
        None => PageVerdict::Malformed("missing `code` field".to_string()),
        Some(code) if is_zero(code) => PageVerdict::Stop,
        Some(_) => PageVerdict::Save,
    }
}

fn is_zero(code: &serde_json::Value) -> bool {
    match code {
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.trim() == "0",
        _ => false,
    }
}

fn numbered_html(page: u32) -> String {
    format!("{}.html", page)
}

fn numbered_json(page: u32) -> String {
    format!("{}.json", page)
}

/// Page 1 of a profile is already part of `main.html`
fn offset_html(page: u32) -> String {
    format!("{}.html", page.saturating_sub(1))
}

fn load_type(page: u32) -> &'static str {
    if page == 1 {
        "ajax"
    } else {
        "more"
    }
}

/// Replies of a discussion thread, continuing from page 2
pub fn thread_comments(site: &SiteUrls, post_id: u64, thread_id: String, dir: PathBuf) -> Feed {
    Feed {
        kind: SubresourceKind::ThreadComments,
        parent_id: post_id,
        endpoint: site.thread_comments.clone(),
        first_page: 2,
        dir,
        form: Box::new(move |page| {
            vec![
                ("page", page.to_string()),
                ("post_id", post_id.to_string()),
                ("number", THREAD_COMMENTS_PER_PAGE.to_string()),
                ("bbs_id", thread_id.clone()),
            ]
        }),
        verdict: listing_verdict,
        file_name: numbered_html,
        scan_restrictions: true,
    }
}

/// Comments of a dynamic or article, continuing from page 2
pub fn dynamic_comments(site: &SiteUrls, post_id: u64, dir: PathBuf) -> Feed {
    Feed {
        kind: SubresourceKind::DynamicComments,
        parent_id: post_id,
        endpoint: site.dynamic_comments.clone(),
        first_page: 2,
        dir,
        form: Box::new(move |page| {
            vec![("post_id", post_id.to_string()), ("page", page.to_string())]
        }),
        verdict: listing_verdict,
        file_name: numbered_html,
        scan_restrictions: true,
    }
}

/// An author's own posts beyond the profile's first page
pub fn author_dynamics(site: &SiteUrls, author_id: u64, dir: PathBuf) -> Feed {
    Feed {
        kind: SubresourceKind::Dynamics,
        parent_id: author_id,
        endpoint: site.post_data.clone(),
        first_page: 2,
        dir,
        form: Box::new(move |page| {
            vec![
                ("type", "all".to_string()),
                ("page", page.to_string()),
                ("load_type", "more".to_string()),
                ("index", "0".to_string()),
                ("author_id", author_id.to_string()),
            ]
        }),
        verdict: listing_verdict,
        file_name: offset_html,
        scan_restrictions: false,
    }
}

fn profile_tab(
    kind: SubresourceKind,
    feed_type: &'static str,
    index: &'static str,
    site: &SiteUrls,
    author_id: u64,
    dir: PathBuf,
) -> Feed {
    Feed {
        kind,
        parent_id: author_id,
        endpoint: site.post_data.clone(),
        first_page: 1,
        dir,
        form: Box::new(move |page| {
            vec![
                ("type", feed_type.to_string()),
                ("page", page.to_string()),
                ("load_type", load_type(page).to_string()),
                ("index", index.to_string()),
                ("author_id", author_id.to_string()),
            ]
        }),
        verdict: listing_with_empty_verdict,
        file_name: numbered_html,
        scan_restrictions: false,
    }
}

/// Posts an author reposted
pub fn forwards(site: &SiteUrls, author_id: u64, dir: PathBuf) -> Feed {
    profile_tab(SubresourceKind::Forwards, "reprint", "2", site, author_id, dir)
}

/// Posts an author liked
pub fn likes(site: &SiteUrls, author_id: u64, dir: PathBuf) -> Feed {
    profile_tab(SubresourceKind::Likes, "like", "3", site, author_id, dir)
}

fn follow_list(
    kind: SubresourceKind,
    list_type: &'static str,
    site: &SiteUrls,
    author_id: u64,
    dir: PathBuf,
) -> Feed {
    Feed {
        kind,
        parent_id: author_id,
        endpoint: site.follower.clone(),
        first_page: 1,
        dir,
        form: Box::new(move |page| {
            vec![
                ("page", page.to_string()),
                ("user_id", author_id.to_string()),
                ("type", list_type.to_string()),
                ("number", FOLLOWS_PER_PAGE.to_string()),
            ]
        }),
        verdict: json_code_verdict,
        file_name: numbered_json,
        scan_restrictions: false,
    }
}

/// Accounts an author follows
pub fn following(site: &SiteUrls, author_id: u64, dir: PathBuf) -> Feed {
    follow_list(SubresourceKind::Following, "following", site, author_id, dir)
}

/// Accounts following an author
pub fn fans(site: &SiteUrls, author_id: u64, dir: PathBuf) -> Feed {
    follow_list(SubresourceKind::Fans, "fans", site, author_id, dir)
}
