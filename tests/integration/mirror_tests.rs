//! Integration tests for static asset mirroring

use crate::common::{create_test_config, BROWSER_UA};
use lightsns_mirror::config::Config;
use lightsns_mirror::crawler::{build_http_client, Fetcher};
use lightsns_mirror::mirror::{AssetReport, AssetWalker, MirrorResolver};
use lightsns_mirror::output::{CrawlStats, StatsSnapshot};
use lightsns_mirror::storage::FsStorage;
use lightsns_mirror::url::SiteUrls;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn server_host(server: &MockServer) -> String {
    url::Url::parse(&server.uri())
        .unwrap()
        .host_str()
        .unwrap()
        .to_string()
}

fn write_document(root: &Path, relative: &str, html: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, html).unwrap();
}

async fn mirror(config: &Config) -> (AssetReport, StatsSnapshot) {
    mirror_until(config, CancellationToken::new()).await
}

async fn mirror_until(config: &Config, cancel: CancellationToken) -> (AssetReport, StatsSnapshot) {
    let client = build_http_client(&config.site, &config.user_agent).unwrap();
    let site = SiteUrls::new(&config.site).unwrap();
    let resolver = MirrorResolver::new(site, &config.output.mirror_root, &config.mirror);
    let stats = Arc::new(CrawlStats::new());

    let walker = AssetWalker::new(
        Fetcher::new(client),
        resolver,
        Arc::new(FsStorage::new()),
        Arc::clone(&stats),
        cancel,
    )
    .with_browser_user_agent(BROWSER_UA)
    .skip_dir(&config.output.mirror_root);

    let report = walker.run(Path::new(&config.output.root)).await.unwrap();
    (report, stats.snapshot())
}

#[tokio::test]
async fn test_assets_fetched_once_across_runs() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());
    let host = server_host(&server);

    write_document(
        Path::new(&config.output.root),
        "Posts/1/1.html",
        r#"<link href="/static/old.css"><script src="/static/new.js"></script>"#,
    );
    let existing = dir.path().join("Static").join(&host).join("static/old.css");
    write_document(existing.parent().unwrap(), "old.css", "kept");

    Mock::given(method("GET"))
        .and(path("/static/old.css"))
        .respond_with(ResponseTemplate::new(200).set_body_string("replaced"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/static/new.js"))
        .respond_with(ResponseTemplate::new(200).set_body_string("let x;"))
        .expect(1)
        .mount(&server)
        .await;

    let (report, first) = mirror(&config).await;
    assert_eq!(report.documents_scanned, 1);
    assert_eq!(report.references_seen, 2);
    assert_eq!((first.assets_saved, first.assets_skipped), (1, 1));

    let (_, second) = mirror(&config).await;
    assert_eq!((second.assets_saved, second.assets_skipped), (0, 2));

    assert_eq!(std::fs::read_to_string(existing).unwrap(), "kept");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("Static").join(&host).join("static/new.js"))
            .unwrap(),
        "let x;"
    );
}

#[tokio::test]
async fn test_asset_host_rewritten_onto_cdn() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    write_document(
        Path::new(&config.output.root),
        "Posts/2/1.html",
        r#"<img src="http://localhost:9/uploads/x.png">"#,
    );

    Mock::given(method("GET"))
        .and(path("/cdn/uploads/x.png"))
        .and(header("user-agent", BROWSER_UA))
        .and(header("referer", format!("{}/", server.uri()).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .expect(1)
        .mount(&server)
        .await;

    let (_, stats) = mirror(&config).await;
    assert_eq!(stats.assets_saved, 1);
    assert_eq!(
        std::fs::read(dir.path().join("Static/localhost/uploads/x.png")).unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );
}

#[tokio::test]
async fn test_skipped_references_are_not_fetched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.mirror.excluded_urls = vec![format!("{}/static/contents.css", server.uri())];
    config.mirror.excluded_fragments = vec!["泰拉通讯枢纽_files".to_string()];

    write_document(
        Path::new(&config.output.root),
        "Authors/7/main.html",
        r##"
            <a href="/15.html">captured post</a>
            <a href="/author/9">another author</a>
            <a href="https://elsewhere.example.org/lib.js">foreign</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="#top">anchor</a>
            <iframe src="/static/frame.html"></iframe>
            <link href="/static/contents.css">
            <img src="/泰拉通讯枢纽_files/logo.png">
        "##,
    );

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (report, stats) = mirror(&config).await;
    assert_eq!(report.documents_scanned, 1);
    assert_eq!(stats.assets_saved + stats.assets_failed, 0);
    assert!(!dir.path().join("Static").exists());
}

#[tokio::test]
async fn test_failed_asset_counted_and_walk_continues() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    write_document(
        Path::new(&config.output.root),
        "Posts/3/1.html",
        r#"<img src="/static/gone.png">"#,
    );
    write_document(
        Path::new(&config.output.root),
        "Posts/4/1.html",
        r#"<img src="/static/here.png">"#,
    );

    Mock::given(method("GET"))
        .and(path("/static/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/static/here.png"))
        .respond_with(ResponseTemplate::new(200).set_body_string("png"))
        .expect(1)
        .mount(&server)
        .await;

    let (report, stats) = mirror(&config).await;
    assert_eq!(report.documents_scanned, 2);
    assert_eq!((stats.assets_saved, stats.assets_failed), (1, 1));
}

#[tokio::test]
async fn test_mirror_root_skipped_when_spelled_differently() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    let root = dir.path().join("backup");
    config.output.mirror_root = root.join("Posts").join("..").join("Static").display().to_string();

    write_document(&root, "Posts/1/1.html", "<p>no assets</p>");
    write_document(
        &root,
        "Static/localhost/page.html",
        r#"<img src="/from-mirrored.png">"#,
    );

    Mock::given(method("GET"))
        .and(path("/from-mirrored.png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (report, stats) = mirror(&config).await;
    assert_eq!(report.documents_scanned, 1);
    assert_eq!(report.references_seen, 0);
    assert_eq!(stats.assets_saved, 0);
}

#[tokio::test]
async fn test_cancelled_walk_stops_between_directories() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    write_document(
        Path::new(&config.output.root),
        "Posts/5/1.html",
        r#"<img src="/static/late.png">"#,
    );

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let (report, _) = mirror_until(&config, cancel).await;

    assert!(report.cancelled);
    assert_eq!(report.documents_scanned, 0);
}
