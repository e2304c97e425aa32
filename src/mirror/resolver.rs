//! Mapping of extracted references onto the local mirror tree
//!
//! A reference is resolved against the site base, filtered through the host
//! allow-list and exclusion rules, and mapped to
//! `{mirror_root}/{host}/{decoded path}`.

use crate::config::MirrorConfig;
use crate::url::SiteUrls;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// File name used for references ending in `/`
pub const DIRECTORY_INDEX: &str = "index";

/// Extension appended to extensionless file names
const INFERRED_EXTENSION: &str = "html";

/// Where a reference is fetched from and written to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorTarget {
    /// Absolute reference as found in the document
    pub source_uri: Url,

    /// URL actually requested; the CDN equivalent for asset-host references
    pub fetch_uri: Url,

    pub local_path: PathBuf,
    pub is_directory_index: bool,

    /// Whether the reference lives on the asset host
    pub via_cdn: bool,
}

/// Why a reference is not mirrored
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Malformed(String),
    UnsupportedScheme(String),
    ForeignHost,

    /// A full page already captured by the resource walkers
    CapturedPage,

    AuthorPage,
    Excluded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "malformed reference: {}", e),
            Self::UnsupportedScheme(s) => write!(f, "unsupported scheme {}", s),
            Self::ForeignHost => write!(f, "host not mirrored"),
            Self::CapturedPage => write!(f, "page captured by the resource walkers"),
            Self::AuthorPage => write!(f, "author page"),
            Self::Excluded => write!(f, "excluded by configuration"),
        }
    }
}

/// Resolves references for one site and mirror root
#[derive(Debug, Clone)]
pub struct MirrorResolver {
    site: SiteUrls,
    root: PathBuf,
    excluded_urls: HashSet<String>,
    excluded_fragments: Vec<String>,
}

impl MirrorResolver {
    pub fn new(site: SiteUrls, root: impl Into<PathBuf>, config: &MirrorConfig) -> Self {
        Self {
            site,
            root: root.into(),
            excluded_urls: config.excluded_urls.iter().cloned().collect(),
            excluded_fragments: config
                .excluded_fragments
                .iter()
                .filter(|f| !f.is_empty())
                .cloned()
                .collect(),
        }
    }

    pub fn site(&self) -> &SiteUrls {
        &self.site
    }

    /// Resolves a raw reference to its mirror target
    pub fn resolve(&self, reference: &str) -> Result<MirrorTarget, SkipReason> {
        let url = self
            .site
            .base()
            .join(reference)
            .map_err(|e| SkipReason::Malformed(e.to_string()))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(SkipReason::UnsupportedScheme(url.scheme().to_string()));
        }

        let on_primary = self.site.is_primary_host(&url);
        let via_cdn = self.site.is_asset_host(&url);
        if !on_primary && !via_cdn {
            return Err(SkipReason::ForeignHost);
        }

        if on_primary {
            if first_segment_is_page(&url) {
                return Err(SkipReason::CapturedPage);
            }
            if url.as_str().starts_with(self.site.author_base().as_str()) {
                return Err(SkipReason::AuthorPage);
            }
        }

        if self.is_excluded(&url) {
            return Err(SkipReason::Excluded);
        }

        let (local_path, is_directory_index) = local_path_for(&self.root, &url)
            .ok_or_else(|| SkipReason::Malformed("reference has no host".to_string()))?;

        let fetch_uri = if via_cdn {
            self.site
                .cdn_url_for(&url)
                .map_err(|e| SkipReason::Malformed(e.to_string()))?
        } else {
            url.clone()
        };

        Ok(MirrorTarget {
            source_uri: url,
            fetch_uri,
            local_path,
            is_directory_index,
            via_cdn,
        })
    }

    /// Exclusions match the URL as serialized or with escapes decoded
    fn is_excluded(&self, url: &Url) -> bool {
        let encoded = url.as_str();
        let decoded = urlencoding::decode(encoded)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| encoded.to_string());

        self.excluded_urls.contains(encoded)
            || self.excluded_urls.contains(&decoded)
            || self
                .excluded_fragments
                .iter()
                .any(|f| encoded.contains(f.as_str()) || decoded.contains(f.as_str()))
    }
}

/// `https://forum/{name}.html...` pages are saved by the resource walkers
fn first_segment_is_page(url: &Url) -> bool {
    url.path_segments()
        .and_then(|mut segments| segments.next())
        .map(|first| first.to_ascii_lowercase().ends_with(".html"))
        .unwrap_or(false)
}

/// Maps an absolute URL to its file under `root`
///
/// Returns the path and whether it is a directory index. Escapes are decoded
/// and `.`/`..` pieces dropped, so the result always stays under
/// `root/{host}`. Query and fragment do not take part in the mapping.
pub fn local_path_for(root: &Path, url: &Url) -> Option<(PathBuf, bool)> {
    let host = url.host_str()?.to_ascii_lowercase();
    let raw_path = url.path();
    let is_directory_index = raw_path.ends_with('/');

    let decoded = urlencoding::decode(raw_path)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| raw_path.to_string());

    let mut pieces: Vec<&str> = decoded
        .split(['/', '\\'])
        .filter(|piece| !piece.is_empty() && *piece != "." && *piece != "..")
        .collect();

    let file_name = if is_directory_index {
        DIRECTORY_INDEX.to_string()
    } else {
        match pieces.pop() {
            Some(last) if Path::new(last).extension().is_some() => last.to_string(),
            Some(last) => format!("{}.{}", last, INFERRED_EXTENSION),
            None => DIRECTORY_INDEX.to_string(),
        }
    };

    let mut path = root.join(host);
    path.extend(pieces);
    path.push(file_name);

    Some((path, is_directory_index || decoded.trim_matches('/').is_empty()))
}
