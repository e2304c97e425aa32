//! Integration tests for the resource walkers
//!
//! These tests use wiremock to serve forum pages and sub-resource endpoints
//! and drive the real handlers and walkers end-to-end.

use crate::common::{
    closed_port_uri, create_context, create_test_config, list_names, RecordingNotifier, Reply,
    ScriptedSite,
};
use lightsns_mirror::crawler::{
    run_mirror, AuthorCardHandler, AuthorHandler, PostHandler, ResourceHandler, ResourceWalker,
    Target, UnitOutcome, WalkMode, WalkStop,
};
use lightsns_mirror::output::SilentNotifier;
use lightsns_mirror::storage::CursorStore;
use lightsns_mirror::ResourceKind;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const THREAD_COMMENTS: &str = "/wp-content/themes/LightSNS/module/more/comment.php";
const DYNAMIC_COMMENTS: &str = "/wp-content/themes/LightSNS/module/more/post-comment.php";
const POST_DATA: &str = "/wp-content/themes/LightSNS/module/data/post.php";
const MEMBER_FOLLOW: &str = "/wp-content/themes/LightSNS/module/stencil/member-follow.php";
const FOLLOWER: &str = "/wp-content/themes/LightSNS/mobile/module/user/follower.php";
const INFO_CARD: &str = "/wp-content/themes/LightSNS/module/stencil/info-card.php";

async fn mount_form(server: &MockServer, endpoint: &str, body: &str, response: &str) {
    Mock::given(method("POST"))
        .and(path(endpoint))
        .and(body_string(body))
        .respond_with(ResponseTemplate::new(200).set_body_string(response))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_missing_post_marked_and_cursor_advanced() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.post_ceiling = 43;

    Mock::given(method("GET"))
        .and(path("/42.html"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let cancel = CancellationToken::new();
    let ctx = create_context(&config, notifier, cancel.clone());

    let mut cursors = CursorStore::open(&config.output.state_dir).unwrap();
    cursors.set(ResourceKind::Post, 42).unwrap();

    let walker = ResourceWalker::new(
        Arc::new(PostHandler::new(Arc::clone(&ctx))),
        43,
        WalkMode::Sequential,
        cancel,
        Arc::new(SilentNotifier),
    );
    let report = walker.run(&mut cursors).await.unwrap();

    let marker = dir.path().join("backup/Posts/[404]42");
    assert!(marker.is_dir());
    assert!(list_names(&marker).is_empty());
    assert_eq!(report.stop, WalkStop::CeilingReached);
    assert_eq!(cursors.get(ResourceKind::Post).unwrap(), 43);
    assert_eq!(ctx.stats.snapshot().not_found, 1);
}

#[tokio::test]
async fn test_thread_comments_paginate_until_sentinel() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path("/42.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
                <div class="jinsom-bbs-single-header" data="t-9">Thread</div>
                <div class="jinsom-bbs-comment-list-page">more</div>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount_form(
        &server,
        THREAD_COMMENTS,
        "page=2&post_id=42&number=10&bbs_id=t-9",
        "<li>reply 11</li>",
    )
    .await;
    mount_form(
        &server,
        THREAD_COMMENTS,
        "page=3&post_id=42&number=10&bbs_id=t-9",
        "0",
    )
    .await;

    let ctx = create_context(
        &config,
        Arc::new(RecordingNotifier::default()),
        CancellationToken::new(),
    );
    let outcome = PostHandler::new(Arc::clone(&ctx)).process(42).await.unwrap();

    assert_eq!(outcome, UnitOutcome::Saved);
    let post_dir = dir.path().join("backup/Posts/42");
    assert_eq!(list_names(&post_dir), vec!["1.html", "2.html"]);
    assert_eq!(
        std::fs::read_to_string(post_dir.join("2.html")).unwrap(),
        "<li>reply 11</li>"
    );
    assert_eq!(ctx.stats.snapshot().pages_saved, 1);
}

#[tokio::test]
async fn test_aggregated_post_comments_paginate_until_sentinel() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path("/42.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="jinsom-posts-list">
                <div class="jinsom-post-comment-more">more comments</div>
            </div>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount_form(&server, DYNAMIC_COMMENTS, "post_id=42&page=2", "<li>comment 6</li>").await;
    mount_form(&server, DYNAMIC_COMMENTS, "post_id=42&page=3", "0").await;
    Mock::given(method("POST"))
        .and(path(THREAD_COMMENTS))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = create_context(
        &config,
        Arc::new(RecordingNotifier::default()),
        CancellationToken::new(),
    );
    let outcome = PostHandler::new(Arc::clone(&ctx)).process(42).await.unwrap();

    assert_eq!(outcome, UnitOutcome::Saved);
    let post_dir = dir.path().join("backup/Posts/42");
    assert_eq!(list_names(&post_dir), vec!["1.html", "2.html"]);
    assert_eq!(
        std::fs::read_to_string(post_dir.join("2.html")).unwrap(),
        "<li>comment 6</li>"
    );
}

const THREAD_PAGE: &str = r#"<div class="jinsom-bbs-single-header" data="t-9">Thread</div>
<div class="jinsom-bbs-comment-list-page">more</div>"#;

#[tokio::test]
async fn test_comment_feed_abandoned_after_consecutive_transient_failures() {
    let site = ScriptedSite::start(THREAD_PAGE, Vec::new()).await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&site.uri, dir.path());
    config.crawler.retry_limit = 5;

    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = create_context(&config, Arc::clone(&notifier), CancellationToken::new());
    let outcome = PostHandler::new(Arc::clone(&ctx)).process(42).await.unwrap();

    // Only the comment feed is lost; the post itself counts as done
    assert_eq!(outcome, UnitOutcome::Saved);
    assert_eq!(site.post_attempts(), 5);
    assert_eq!(ctx.stats.snapshot().subresources_abandoned, 1);
    assert_eq!(
        list_names(&dir.path().join("backup/Posts/42")),
        vec!["1.html"]
    );
    assert!(notifier.alerts().iter().any(|a| a.contains("Abandoned")));
}

#[tokio::test]
async fn test_comment_retry_budget_resets_after_each_page() {
    let site = ScriptedSite::start(
        THREAD_PAGE,
        vec![
            Reply::Drop,
            Reply::Body("<li>reply 11</li>"),
            Reply::Drop,
            Reply::Body("<li>reply 21</li>"),
            Reply::Drop,
            Reply::Body("0"),
        ],
    )
    .await;
    let dir = TempDir::new().unwrap();
    // One transient failure is tolerated per page
    let config = create_test_config(&site.uri, dir.path());

    let ctx = create_context(
        &config,
        Arc::new(RecordingNotifier::default()),
        CancellationToken::new(),
    );
    let outcome = PostHandler::new(Arc::clone(&ctx)).process(42).await.unwrap();

    assert_eq!(outcome, UnitOutcome::Saved);
    assert_eq!(site.post_attempts(), 6);
    assert_eq!(ctx.stats.snapshot().subresources_abandoned, 0);
    assert_eq!(
        list_names(&dir.path().join("backup/Posts/42")),
        vec!["1.html", "2.html", "3.html"]
    );
}

#[tokio::test]
async fn test_comment_feed_stops_at_http_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path("/42.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(THREAD_PAGE))
        .mount(&server)
        .await;
    mount_form(
        &server,
        THREAD_COMMENTS,
        "page=2&post_id=42&number=10&bbs_id=t-9",
        "<li>reply 11</li>",
    )
    .await;
    Mock::given(method("POST"))
        .and(body_string("page=3&post_id=42&number=10&bbs_id=t-9"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string("page=4&post_id=42&number=10&bbs_id=t-9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<li>never</li>"))
        .expect(0)
        .mount(&server)
        .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = create_context(&config, Arc::clone(&notifier), CancellationToken::new());
    let outcome = PostHandler::new(Arc::clone(&ctx)).process(42).await.unwrap();

    assert_eq!(outcome, UnitOutcome::Saved);
    assert_eq!(
        list_names(&dir.path().join("backup/Posts/42")),
        vec!["1.html", "2.html"]
    );
    assert!(notifier.alerts().iter().any(|a| a.contains("HTTP 500")));
}

#[tokio::test]
async fn test_restricted_post_alerts_once_per_kind() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path("/5.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="follow-see">a</div><div class="follow-see">b</div>"#,
        ))
        .mount(&server)
        .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = create_context(&config, Arc::clone(&notifier), CancellationToken::new());
    PostHandler::new(Arc::clone(&ctx)).process(5).await.unwrap();

    let alerts = notifier.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("follower-only"));
    assert_eq!(ctx.stats.snapshot().restriction_alerts, 1);
}

#[tokio::test]
async fn test_sequential_walk_mixed_outcomes() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.post_ceiling = 4;

    Mock::given(path("/1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>first</p>"))
        .mount(&server)
        .await;
    Mock::given(path("/2.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(path("/3.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let cancel = CancellationToken::new();
    let ctx = create_context(&config, Arc::clone(&notifier), cancel.clone());
    let mut cursors = CursorStore::open(&config.output.state_dir).unwrap();

    let report = ResourceWalker::new(
        Arc::new(PostHandler::new(Arc::clone(&ctx))),
        config.crawler.post_ceiling,
        WalkMode::Sequential,
        cancel,
        notifier.clone(),
    )
    .run(&mut cursors)
    .await
    .unwrap();

    assert_eq!((report.start, report.end), (1, 4));
    let posts = dir.path().join("backup/Posts");
    assert_eq!(list_names(&posts), vec!["1", "[404]2"]);
    assert_eq!(list_names(&posts.join("1")), vec!["1.html"]);

    let stats = ctx.stats.snapshot();
    assert_eq!(stats.resources_completed(), 3);
    assert_eq!(stats.http_errors, 1);
    assert!(notifier.alerts().iter().any(|a| a.contains("HTTP 500")));
}

#[tokio::test]
async fn test_unreachable_site_stops_walker_without_advancing() {
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&closed_port_uri(), dir.path());

    let notifier = Arc::new(RecordingNotifier::default());
    let cancel = CancellationToken::new();
    let ctx = create_context(&config, Arc::clone(&notifier), cancel.clone());
    let mut cursors = CursorStore::open(&config.output.state_dir).unwrap();

    let report = ResourceWalker::new(
        Arc::new(PostHandler::new(ctx)),
        config.crawler.post_ceiling,
        WalkMode::Sequential,
        cancel,
        notifier.clone(),
    )
    .run(&mut cursors)
    .await
    .unwrap();

    assert_eq!(report.stop, WalkStop::RetryExhausted { id: 1 });
    assert_eq!(cursors.get(ResourceKind::Post).unwrap(), 1);
    assert!(!dir.path().join("backup/Posts").exists());
    assert_eq!(notifier.alerts().len(), 1);
}

#[tokio::test]
async fn test_author_profile_feeds() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path("/author/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<ul><li type="like">Likes</li></ul>
               <div class="jinsom-more-posts">more</div>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dynamics = |page: u32| format!("type=all&page={}&load_type=more&index=0&author_id=7", page);
    mount_form(&server, POST_DATA, &dynamics(2), "<li>older post</li>").await;
    mount_form(&server, POST_DATA, &dynamics(3), "0").await;

    mount_form(&server, MEMBER_FOLLOW, "author_id=7", "<div>follow overview</div>").await;
    mount_form(
        &server,
        FOLLOWER,
        "page=1&user_id=7&type=following&number=30",
        r#"{"code":1,"data":[{"id":3}]}"#,
    )
    .await;
    mount_form(
        &server,
        FOLLOWER,
        "page=2&user_id=7&type=following&number=30",
        r#"{"code":0}"#,
    )
    .await;
    mount_form(
        &server,
        FOLLOWER,
        "page=1&user_id=7&type=fans&number=30",
        r#"{"code":0}"#,
    )
    .await;

    mount_form(
        &server,
        POST_DATA,
        "type=reprint&page=1&load_type=ajax&index=2&author_id=7",
        r#"<div class="jinsom-empty-page">Nothing reposted</div>"#,
    )
    .await;

    mount_form(
        &server,
        POST_DATA,
        "type=like&page=1&load_type=ajax&index=3&author_id=7",
        "<li>liked</li>",
    )
    .await;
    mount_form(
        &server,
        POST_DATA,
        "type=like&page=2&load_type=more&index=3&author_id=7",
        " \n",
    )
    .await;

    let ctx = create_context(
        &config,
        Arc::new(RecordingNotifier::default()),
        CancellationToken::new(),
    );
    let outcome = AuthorHandler::new(Arc::clone(&ctx)).process(7).await.unwrap();
    assert_eq!(outcome, UnitOutcome::Saved);

    let author = dir.path().join("backup/Authors/7");
    assert_eq!(
        list_names(&author),
        vec!["dynamics", "follow", "forwards", "likes", "main.html"]
    );
    assert_eq!(list_names(&author.join("dynamics")), vec!["1.html"]);
    assert_eq!(
        list_names(&author.join("follow")),
        vec!["following", "main.html"]
    );
    assert_eq!(list_names(&author.join("follow/following")), vec!["1.json"]);
    assert_eq!(list_names(&author.join("forwards")), vec!["empty.html"]);
    assert_eq!(list_names(&author.join("likes")), vec!["1.html"]);
}

#[tokio::test]
async fn test_private_likes_and_malformed_follow_list() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path("/author/8"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>quiet author</p>"))
        .mount(&server)
        .await;
    mount_form(&server, MEMBER_FOLLOW, "author_id=8", "<div>follow</div>").await;
    mount_form(
        &server,
        FOLLOWER,
        "page=1&user_id=8&type=following&number=30",
        "<html>login required</html>",
    )
    .await;
    mount_form(
        &server,
        FOLLOWER,
        "page=1&user_id=8&type=fans&number=30",
        r#"{"code":0}"#,
    )
    .await;
    mount_form(
        &server,
        POST_DATA,
        "type=reprint&page=1&load_type=ajax&index=2&author_id=8",
        "0",
    )
    .await;
    mount_form(
        &server,
        POST_DATA,
        "type=like&page=1&load_type=ajax&index=3&author_id=8",
        "<li>liked</li>",
    )
    .await;
    mount_form(
        &server,
        POST_DATA,
        "type=like&page=2&load_type=more&index=3&author_id=8",
        "0",
    )
    .await;

    let notifier = Arc::new(RecordingNotifier::default());
    let ctx = create_context(&config, Arc::clone(&notifier), CancellationToken::new());
    let outcome = AuthorHandler::new(Arc::clone(&ctx)).process(8).await.unwrap();
    assert_eq!(outcome, UnitOutcome::Saved);

    let author = dir.path().join("backup/Authors/8");
    assert_eq!(
        list_names(&author),
        vec!["[private]likes", "follow", "main.html"]
    );
    // The malformed page is neither saved nor retried
    assert_eq!(list_names(&author.join("follow")), vec!["main.html"]);
    assert_eq!(ctx.stats.snapshot().malformed_responses, 1);
    assert!(notifier.alerts().iter().any(|a| a.contains("malformed")));
}

#[tokio::test]
async fn test_batched_author_walk() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .and(path_regex(r"^/author/\d+$"))
        .respond_with(ResponseTemplate::new(404))
        .expect(4)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let ctx = create_context(
        &config,
        Arc::new(RecordingNotifier::default()),
        cancel.clone(),
    );
    let mut cursors = CursorStore::open(&config.output.state_dir).unwrap();

    let report = ResourceWalker::new(
        Arc::new(AuthorHandler::new(ctx)),
        5,
        WalkMode::Batched { window: 3 },
        cancel,
        Arc::new(SilentNotifier),
    )
    .run(&mut cursors)
    .await
    .unwrap();

    assert_eq!(report.stop, WalkStop::CeilingReached);
    assert_eq!(cursors.get(ResourceKind::Author).unwrap(), 5);
    assert_eq!(
        list_names(&dir.path().join("backup/Authors")),
        vec!["[404]1", "[404]2", "[404]3", "[404]4"]
    );
}

#[tokio::test]
async fn test_author_card_saved_by_id() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    mount_form(&server, INFO_CARD, "author_id=3&info_card=1", "<div>card</div>").await;

    let ctx = create_context(
        &config,
        Arc::new(RecordingNotifier::default()),
        CancellationToken::new(),
    );
    let outcome = AuthorCardHandler::new(ctx).process(3).await.unwrap();

    assert_eq!(outcome, UnitOutcome::Saved);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("backup/AuthorCards/3.html")).unwrap(),
        "<div>card</div>"
    );
}

#[tokio::test]
async fn test_cancelled_before_start_fetches_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dir.path());

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let ctx = create_context(
        &config,
        Arc::new(RecordingNotifier::default()),
        cancel.clone(),
    );
    let mut cursors = CursorStore::open(&config.output.state_dir).unwrap();

    let report = ResourceWalker::new(
        Arc::new(PostHandler::new(ctx)),
        10,
        WalkMode::Sequential,
        cancel,
        Arc::new(SilentNotifier),
    )
    .run(&mut cursors)
    .await
    .unwrap();

    assert_eq!(report.stop, WalkStop::Cancelled);
    assert_eq!(report.end, 1);
}

#[tokio::test]
async fn test_run_mirror_posts_then_assets() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dir.path());
    config.crawler.post_ceiling = 2;

    Mock::given(method("GET"))
        .and(path("/1.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<link rel="stylesheet" href="/static/site.css">"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/static/site.css"))
        .respond_with(ResponseTemplate::new(200).set_body_string("body{}"))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = run_mirror(
        config,
        &[Target::Posts, Target::Assets],
        Arc::new(SilentNotifier),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.walks.len(), 1);
    assert_eq!(outcome.walks[0].end, 2);
    assert_eq!(outcome.stats.assets_saved, 1);
    assert_eq!(outcome.assets.unwrap().documents_scanned, 1);

    let host = url::Url::parse(&server.uri())
        .unwrap()
        .host_str()
        .unwrap()
        .to_string();
    assert_eq!(
        std::fs::read_to_string(dir.path().join("Static").join(host).join("static/site.css"))
            .unwrap(),
        "body{}"
    );
}
