use serde::Deserialize;

/// Main configuration structure for LightSNS-Mirror
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
}

/// The site being mirrored
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Primary site root, e.g. "https://terrach.net/"
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Host serving uploaded images and attachments
    #[serde(rename = "asset-host")]
    pub asset_host: String,

    /// CDN base that asset-host URIs are rewritten onto before fetching
    #[serde(rename = "asset-cdn-base")]
    pub asset_cdn_base: String,

    /// Pre-obtained session cookie, sent verbatim with every request
    #[serde(rename = "session-cookie", default)]
    pub session_cookie: Option<String>,
}

/// How the author walker schedules its work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorMode {
    Sequential,
    Batched,
}

impl Default for AuthorMode {
    fn default() -> Self {
        Self::Batched
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Exclusive upper bound of the post ID space
    #[serde(rename = "post-ceiling")]
    pub post_ceiling: u64,

    /// Exclusive upper bound of the author ID space
    #[serde(rename = "author-ceiling")]
    pub author_ceiling: u64,

    /// Exclusive upper bound of the author info-card ID space
    #[serde(rename = "author-card-ceiling")]
    pub author_card_ceiling: u64,

    /// Immediate retries allowed for a transport failure
    #[serde(rename = "retry-limit", default = "default_retry_limit")]
    pub retry_limit: u32,

    #[serde(rename = "author-mode", default)]
    pub author_mode: AuthorMode,

    /// IDs processed concurrently per window in batched mode
    #[serde(rename = "author-batch-size", default = "default_batch_size")]
    pub author_batch_size: u64,

    /// Pause inserted before every other asset-host request (milliseconds)
    #[serde(rename = "asset-delay-ms", default = "default_asset_delay_ms")]
    pub asset_delay_ms: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Browser-like agent presented to the asset CDN
    #[serde(rename = "browser-user-agent", default = "default_browser_user_agent")]
    pub browser_user_agent: String,
}

impl UserAgentConfig {
    /// Format: CrawlerName/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root of the saved resource tree (Posts/, Authors/, AuthorCards/)
    pub root: String,

    /// Directory holding the cursor files
    #[serde(rename = "state-dir")]
    pub state_dir: String,

    /// Root of the mirrored static assets
    #[serde(rename = "mirror-root")]
    pub mirror_root: String,

    /// Path to the markdown run summary
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<String>,
}

/// Static asset mirroring configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MirrorConfig {
    /// Tree of saved HTML scanned for asset links (defaults to output.root)
    #[serde(rename = "source-dir", default)]
    pub source_dir: Option<String>,

    /// URLs that are never mirrored
    #[serde(rename = "excluded-urls", default)]
    pub excluded_urls: Vec<String>,

    /// URLs containing any of these substrings are never mirrored
    #[serde(rename = "excluded-fragments", default)]
    pub excluded_fragments: Vec<String>,
}

fn default_retry_limit() -> u32 {
    5
}

fn default_batch_size() -> u64 {
    10
}

fn default_asset_delay_ms() -> u64 {
    1500
}

fn default_browser_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0"
        .to_string()
}
