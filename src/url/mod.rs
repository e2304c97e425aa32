//! URL handling module for LightSNS-Mirror
//!
//! This module knows the site's URL layout: where primary resources live,
//! which theme endpoints serve the paginated sub-resources, and how a final
//! URL maps back to a directory slug.

mod slug;

pub use slug::slug_for;

use crate::config::SiteConfig;
use crate::{UrlError, UrlResult};
use url::Url;

const THREAD_COMMENT_PATH: &str = "wp-content/themes/LightSNS/module/more/comment.php";
const DYNAMIC_COMMENT_PATH: &str = "wp-content/themes/LightSNS/module/more/post-comment.php";
const POST_DATA_PATH: &str = "wp-content/themes/LightSNS/module/data/post.php";
const INFO_CARD_PATH: &str = "wp-content/themes/LightSNS/module/stencil/info-card.php";
const MEMBER_FOLLOW_PATH: &str = "wp-content/themes/LightSNS/module/stencil/member-follow.php";
const FOLLOWER_PATH: &str = "wp-content/themes/LightSNS/mobile/module/user/follower.php";

/// Resolved URLs for one mirrored site
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base: Url,
    author_base: Url,
    asset_host: String,
    asset_cdn_base: Url,
    pub thread_comments: Url,
    pub dynamic_comments: Url,
    pub post_data: Url,
    pub info_card: Url,
    pub member_follow: Url,
    pub follower: Url,
}

impl SiteUrls {
    /// Builds the URL layout from the site configuration
    pub fn new(config: &SiteConfig) -> UrlResult<Self> {
        let base = parse(&config.base_url)?;
        let asset_cdn_base = parse(&config.asset_cdn_base)?;
        let join = |path: &str| base.join(path).map_err(|e| UrlError::Parse(e.to_string()));

        Ok(Self {
            author_base: join("author/")?,
            thread_comments: join(THREAD_COMMENT_PATH)?,
            dynamic_comments: join(DYNAMIC_COMMENT_PATH)?,
            post_data: join(POST_DATA_PATH)?,
            info_card: join(INFO_CARD_PATH)?,
            member_follow: join(MEMBER_FOLLOW_PATH)?,
            follower: join(FOLLOWER_PATH)?,
            asset_host: config.asset_host.to_lowercase(),
            asset_cdn_base,
            base,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn author_base(&self) -> &Url {
        &self.author_base
    }

    pub fn asset_host(&self) -> &str {
        &self.asset_host
    }

    pub fn asset_cdn_base(&self) -> &Url {
        &self.asset_cdn_base
    }

    /// `{base}/{id}.html`
    pub fn post_url(&self, id: u64) -> UrlResult<Url> {
        self.base
            .join(&format!("{}.html", id))
            .map_err(|e| UrlError::Parse(e.to_string()))
    }

    /// `{base}/author/{id}`
    pub fn author_url(&self, id: u64) -> UrlResult<Url> {
        self.author_base
            .join(&id.to_string())
            .map_err(|e| UrlError::Parse(e.to_string()))
    }

    /// Returns true if `url` is on the primary site
    pub fn is_primary_host(&self, url: &Url) -> bool {
        same_host(url, &self.base)
    }

    /// Returns true if `url` is on the asset host
    pub fn is_asset_host(&self, url: &Url) -> bool {
        url.host_str()
            .map(|h| h.eq_ignore_ascii_case(&self.asset_host))
            .unwrap_or(false)
    }

    /// Rewrites an asset-host URL onto the CDN base, keeping path and query
    pub fn cdn_url_for(&self, asset: &Url) -> UrlResult<Url> {
        let mut relative = asset.path().trim_start_matches('/').to_string();
        if let Some(query) = asset.query() {
            relative.push('?');
            relative.push_str(query);
        }

        self.asset_cdn_base
            .join(&relative)
            .map_err(|e| UrlError::Parse(e.to_string()))
    }
}

fn parse(value: &str) -> UrlResult<Url> {
    let url = Url::parse(value).map_err(|e| UrlError::Parse(e.to_string()))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }
    Ok(url)
}

fn same_host(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
        _ => false,
    }
}
