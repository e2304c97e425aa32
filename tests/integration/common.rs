//! Shared fixtures for the integration tests

use lightsns_mirror::config::{
    AuthorMode, Config, CrawlerConfig, MirrorConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use lightsns_mirror::crawler::{build_http_client, CrawlContext, Fetcher};
use lightsns_mirror::output::{CrawlStats, Notifier};
use lightsns_mirror::storage::FsStorage;
use lightsns_mirror::url::SiteUrls;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

pub const BROWSER_UA: &str = "Mozilla/5.0 (TestBrowser)";

/// Creates a configuration whose site lives on the mock server
pub fn create_test_config(server_uri: &str, dir: &Path) -> Config {
    Config {
        site: SiteConfig {
            base_url: format!("{}/", server_uri),
            asset_host: "localhost".to_string(),
            asset_cdn_base: format!("{}/cdn/", server_uri),
            session_cookie: None,
        },
        crawler: CrawlerConfig {
            post_ceiling: 10,
            author_ceiling: 10,
            author_card_ceiling: 10,
            retry_limit: 2,
            author_mode: AuthorMode::Sequential,
            author_batch_size: 3,
            asset_delay_ms: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
            browser_user_agent: BROWSER_UA.to_string(),
        },
        output: OutputConfig {
            root: dir.join("backup").display().to_string(),
            state_dir: dir.join("state").display().to_string(),
            mirror_root: dir.join("Static").display().to_string(),
            summary_path: None,
        },
        mirror: MirrorConfig::default(),
    }
}

/// Notifier that keeps every alert for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn alert(&self, reason: &str) {
        self.alerts.lock().unwrap().push(reason.to_string());
    }
}

/// Builds a crawl context straight from a configuration
pub fn create_context(
    config: &Config,
    notifier: Arc<RecordingNotifier>,
    cancel: CancellationToken,
) -> Arc<CrawlContext> {
    let client = build_http_client(&config.site, &config.user_agent).unwrap();
    Arc::new(CrawlContext {
        fetcher: Fetcher::new(client),
        site: SiteUrls::new(&config.site).unwrap(),
        store: Arc::new(FsStorage::new()),
        stats: Arc::new(CrawlStats::new()),
        notifier,
        cancel,
        root: config.output.root.clone().into(),
        retry_limit: config.crawler.retry_limit,
    })
}

/// Sorted file names directly inside `dir`
pub fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Returns a URL base on a local port nothing listens on
pub fn closed_port_uri() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// How the scripted site answers one form POST
#[derive(Debug, Clone, Copy)]
pub enum Reply {
    /// Close the connection without answering
    Drop,
    Body(&'static str),
}

/// Bare TCP site: every GET gets `page`, POSTs follow the script
///
/// POSTs beyond the end of the script are dropped.
pub struct ScriptedSite {
    pub uri: String,
    posts: Arc<AtomicUsize>,
}

impl ScriptedSite {
    pub async fn start(page: &'static str, script: Vec<Reply>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        let posts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&posts);

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let head = read_request(&mut stream).await;
                let reply = if head.starts_with("GET") {
                    Reply::Body(page)
                } else {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    script.get(n).copied().unwrap_or(Reply::Drop)
                };

                if let Reply::Body(body) = reply {
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                }
            }
        });

        Self { uri, posts }
    }

    pub fn post_attempts(&self) -> usize {
        self.posts.load(Ordering::SeqCst)
    }
}

/// Reads one request, returning its head
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    let head_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::from_utf8_lossy(&buf).into_owned(),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    head
}
