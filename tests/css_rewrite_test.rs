//! Stylesheet reference localisation.

use std::sync::Arc;
use std::time::Duration;

use kodegen_tools_sitemirror::Page;
use tempfile::TempDir;

mod common;
use common::*;

#[tokio::test]
async fn stylesheet_references_resolve_against_the_stylesheet() {
    let dir = TempDir::new().unwrap();
    let css = r#"body { background: url("../img/a.png"); }
.hero { background-image: url("../img/a.png"); }
@import url('b.css');
.self { cursor: url(s.css); }
.inline { background: url(data:image/png;base64,AAAA); }"#;
    let fetcher = Arc::new(
        MockFetcher::new()
            .with("https://site.test/x/styles/s.css", css)
            .with("https://site.test/x/img/a.png", "PNG")
            .with("https://site.test/x/styles/b.css", "b{}"),
    );
    let html = create_test_html(
        "X",
        r#"<link rel="stylesheet" href="styles/s.css">"#,
        "",
    );
    let renderer = Arc::new(StaticRenderer::new().with("https://site.test/x/", html));
    let session = session(
        test_config(dir.path(), "https://site.test/x/", false),
        &fetcher,
        &renderer,
    );

    let mut page = Page::new(uri("https://site.test/x/"));
    page.render(&session).await.unwrap();
    page.save(&session).await.unwrap();

    assert_eq!(fetcher.hits("https://site.test/x/img/a.png"), 1);
    assert_eq!(fetcher.hits("https://site.test/x/styles/b.css"), 1);
    assert_eq!(fetcher.hits("https://site.test/x/styles/s.css"), 1);
    assert_eq!(fetcher.total_hits(), 3);

    let saved = read(dir.path(), "client/styles/s.css");
    assert_eq!(saved.matches(r#"url("../images/a.png")"#).count(), 2);
    assert!(saved.contains("url('b.css')"));
    assert!(saved.contains("url(s.css)"));
    assert!(saved.contains("url(data:image/png;base64,AAAA)"));
    assert!(!saved.contains("../img/"));

    assert_eq!(read(dir.path(), "client/styles/b.css"), "b{}");
    assert!(read(dir.path(), "x-default.html").contains(r#"href="client/styles/s.css""#));
}

#[tokio::test]
async fn stylesheets_importing_each_other_do_not_deadlock() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(
        MockFetcher::new()
            .with("https://site.test/a.css", r#"@import url("b.css"); a{}"#)
            .with("https://site.test/b.css", r#"@import url("a.css"); b{}"#)
            .with_delay(Duration::from_millis(10)),
    );
    let html = create_test_html(
        "Cycle",
        r#"<link rel="stylesheet" href="/a.css"><link rel="stylesheet" href="/b.css">"#,
        "",
    );
    let renderer = Arc::new(StaticRenderer::new().with("https://site.test/", html));
    let session = session(
        test_config(dir.path(), "https://site.test/", false),
        &fetcher,
        &renderer,
    );

    let mut page = Page::new(uri("https://site.test/"));
    tokio::time::timeout(Duration::from_secs(10), page.render(&session))
        .await
        .expect("rendering must not hang")
        .unwrap();
    page.save(&session).await.unwrap();

    assert_eq!(fetcher.hits("https://site.test/a.css"), 1);
    assert_eq!(fetcher.hits("https://site.test/b.css"), 1);
    assert!(read(dir.path(), "client/styles/a.css").contains(r#"url("b.css")"#));
    assert!(read(dir.path(), "client/styles/b.css").contains(r#"url("a.css")"#));
}

#[tokio::test]
async fn inline_styles_become_a_page_stylesheet() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new().with("https://site.test/img/bg.png", "PNG"));
    let html = create_test_html(
        "Styled",
        "<style>body{background:url(/img/bg.png)}</style>",
        "<style>p{color:red}</style><p>hi</p>",
    );
    let renderer = Arc::new(StaticRenderer::new().with("https://site.test/", html));
    let session = session(
        test_config(dir.path(), "https://site.test/", false),
        &fetcher,
        &renderer,
    );

    let mut page = Page::new(uri("https://site.test/"));
    page.render(&session).await.unwrap();
    page.save(&session).await.unwrap();

    assert_eq!(
        read(dir.path(), "client/styles/pages/default.css"),
        "body{background:url(../../images/bg.png)}\n\np{color:red}"
    );
    let saved = read(dir.path(), "default.html");
    assert!(saved.contains(r#"href="client/styles/pages/default.css""#));
    assert!(!saved.contains("<style>"));
}

#[tokio::test]
async fn unavailable_references_are_left_alone() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new().with(
        "https://site.test/s.css",
        "a{background:url(missing.png)} b{background:url(ok.png)}",
    ).with("https://site.test/ok.png", "PNG"));
    let html = create_test_html("S", r#"<link rel="stylesheet" href="/s.css">"#, "");
    let renderer = Arc::new(StaticRenderer::new().with("https://site.test/", html));
    let session = session(
        test_config(dir.path(), "https://site.test/", false),
        &fetcher,
        &renderer,
    );

    let mut page = Page::new(uri("https://site.test/"));
    page.render(&session).await.unwrap();

    assert_eq!(
        read(dir.path(), "client/styles/s.css"),
        "a{background:url(missing.png)} b{background:url(../images/ok.png)}"
    );
}

async fn mirror_two_stylesheets(fetcher: MockFetcher) -> (TempDir, Arc<MockFetcher>) {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(fetcher);
    let html = create_test_html(
        "Two",
        r#"<link rel="stylesheet" href="/a.css"><link rel="stylesheet" href="/b.css">"#,
        "",
    );
    let renderer = Arc::new(StaticRenderer::new().with("https://site.test/", html));
    let session = session(
        test_config(dir.path(), "https://site.test/", false),
        &fetcher,
        &renderer,
    );

    let mut page = Page::new(uri("https://site.test/"));
    page.render(&session).await.unwrap();
    page.save(&session).await.unwrap();
    (dir, fetcher)
}

#[tokio::test]
async fn nested_asset_names_do_not_depend_on_download_order() {
    let site = || {
        MockFetcher::new()
            .with("https://site.test/a.css", "a{background:url(/x/bg.png)}")
            .with("https://site.test/b.css", "b{background:url(/y/bg.png)}")
            .with("https://site.test/x/bg.png", "X")
            .with("https://site.test/y/bg.png", "Y")
    };
    let slow = Duration::from_millis(50);

    let (first, _) =
        mirror_two_stylesheets(site().with_delay_for("https://site.test/a.css", slow)).await;
    let (second, _) =
        mirror_two_stylesheets(site().with_delay_for("https://site.test/b.css", slow)).await;

    assert_eq!(snapshot(first.path()), snapshot(second.path()));
    assert_eq!(read(first.path(), "client/styles/a.css"), "a{background:url(../images/bg.png)}");
    assert_eq!(read(first.path(), "client/styles/b.css"), "b{background:url(../images/bg-1.png)}");
    assert_eq!(read(first.path(), "client/images/bg.png"), "X");
    assert_eq!(read(first.path(), "client/images/bg-1.png"), "Y");
}

#[tokio::test]
async fn shared_import_that_fails_is_left_remote_everywhere() {
    let fetcher = MockFetcher::new()
        .with("https://site.test/a.css", r#"@import url("c.css"); a{}"#)
        .with("https://site.test/b.css", r#"@import url("c.css"); b{}"#)
        .with_delay_for("https://site.test/a.css", Duration::from_millis(30))
        .with_delay_for("https://site.test/c.css", Duration::from_millis(30));

    let (dir, fetcher) = mirror_two_stylesheets(fetcher).await;

    assert_eq!(read(dir.path(), "client/styles/a.css"), r#"@import url("c.css"); a{}"#);
    assert_eq!(read(dir.path(), "client/styles/b.css"), r#"@import url("c.css"); b{}"#);
    assert!(!dir.path().join("client/styles/c.css").exists());
    assert_eq!(fetcher.hits("https://site.test/c.css"), 1);
}
