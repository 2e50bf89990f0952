//! Sitemap discovery and full-site crawling.

use std::sync::Arc;

use kodegen_tools_sitemirror::site::discover;
use kodegen_tools_sitemirror::{MirrorError, MirrorReport, mirror_with};
use tempfile::TempDir;

mod common;
use common::*;

const SITEMAP: &str = "https://site.test/sitemap.xml";

fn urlset(locs: &[&str]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{loc}</loc></url>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{entries}</urlset>"#
    )
}

#[tokio::test]
async fn sitemap_index_yields_the_union_of_its_children() {
    let dir = TempDir::new().unwrap();
    let index = r#"<?xml version="1.0"?>
        <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
          <sitemap><loc>https://site.test/pages.xml</loc></sitemap>
          <sitemap><loc>/posts.xml</loc></sitemap>
          <sitemap><loc>/broken.xml</loc></sitemap>
        </sitemapindex>"#;
    let fetcher = Arc::new(
        MockFetcher::new()
            .with(SITEMAP, index)
            .with(
                "https://site.test/pages.xml",
                urlset(&["https://site.test/", "https://site.test/about"]),
            )
            .with(
                "https://site.test/posts.xml",
                urlset(&[
                    "https://site.test/about",
                    "https://site.test/posts/1",
                    "https://elsewhere.test/x",
                ]),
            ),
    );
    let renderer = Arc::new(StaticRenderer::new());
    let session = session(
        test_config(dir.path(), "https://site.test/", true),
        &fetcher,
        &renderer,
    );

    let pages = discover(&session, &uri("https://site.test/")).await.unwrap();
    assert_eq!(
        pages,
        vec![
            uri("https://site.test/"),
            uri("https://site.test/about"),
            uri("https://site.test/posts/1"),
        ]
    );
    assert_eq!(fetcher.hits("https://site.test/broken.xml"), 1);
}

#[tokio::test]
async fn unreadable_root_sitemap_is_an_error() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new().with(SITEMAP, "<html>oops</html>"));
    let renderer = Arc::new(StaticRenderer::new());
    let session = session(
        test_config(dir.path(), "https://site.test/", true),
        &fetcher,
        &renderer,
    );

    let err = discover(&session, &uri("https://site.test/")).await.unwrap_err();
    assert!(matches!(err, MirrorError::Parse { .. }));
}

#[tokio::test]
async fn full_site_mirror_retargets_links_between_pages() {
    let dir = TempDir::new().unwrap();
    let head = r#"<link rel="stylesheet" href="/site.css">"#;
    let fetcher = Arc::new(
        MockFetcher::new()
            .with(
                SITEMAP,
                urlset(&["https://site.test/about", "https://site.test/docs/intro"]),
            )
            .with("https://site.test/site.css", "body{}"),
    );
    let renderer = Arc::new(
        StaticRenderer::new()
            .with(
                "https://site.test/",
                create_test_html(
                    "Home",
                    head,
                    r#"<a href="/about">About</a><a href="/docs/intro#setup">Intro</a>
                       <a href="https://elsewhere.test/">Elsewhere</a>"#,
                ),
            )
            .with(
                "https://site.test/about",
                create_test_html("About", head, r#"<a href="/">Home</a><a href="docs/intro">Intro</a>"#),
            )
            .with(
                "https://site.test/docs/intro",
                create_test_html("Intro", head, r#"<a href="../about">About</a>"#),
            ),
    );

    let report = mirror_with(
        test_config(dir.path(), "https://site.test/", true),
        fetcher.clone(),
        renderer.clone(),
    )
    .await
    .unwrap();

    assert_eq!(
        report,
        MirrorReport {
            pages_saved: 3,
            pages_failed: 0,
            assets_persisted: 1,
            links_retargeted: 5,
        }
    );
    assert_eq!(
        renderer.rendered(),
        vec![
            "https://site.test/",
            "https://site.test/about",
            "https://site.test/docs/intro",
        ]
    );
    assert_eq!(fetcher.hits("https://site.test/site.css"), 1);

    let home = read(dir.path(), "default.html");
    assert!(home.contains(r#"href="about.html""#));
    assert!(home.contains(r#"href="docs-intro.html#setup""#));
    assert!(home.contains(r#"href="https://elsewhere.test/""#));
    assert!(home.contains(r#"href="client/styles/site.css""#));

    let about = read(dir.path(), "about.html");
    assert!(about.contains(r#"href="default.html""#));
    assert!(about.contains(r#"href="docs-intro.html""#));

    assert!(read(dir.path(), "docs-intro.html").contains(r#"href="about.html""#));
}

#[tokio::test]
async fn original_layout_keeps_directories() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new().with(SITEMAP, urlset(&["https://site.test/docs/intro"])));
    let renderer = Arc::new(
        StaticRenderer::new()
            .with(
                "https://site.test/",
                create_test_html("Home", "<style>p{}</style>", r#"<a href="/docs/intro">Intro</a>"#),
            )
            .with(
                "https://site.test/docs/intro",
                create_test_html("Intro", "", r#"<a href="/">Home</a>"#),
            ),
    );
    let config = kodegen_tools_sitemirror::MirrorConfig::builder()
        .output_dir(dir.path())
        .start_url("https://site.test/")
        .full_site(true)
        .layout(kodegen_tools_sitemirror::PageLayout::Original)
        .retry(kodegen_tools_sitemirror::RetryPolicy::none())
        .build()
        .unwrap();

    let report = mirror_with(config, fetcher, renderer).await.unwrap();
    assert_eq!(report.pages_saved, 2);

    let home = read(dir.path(), "pages/default.html");
    assert!(home.contains(r#"href="docs/intro.html""#));
    assert!(home.contains(r#"href="../client/styles/pages/default.css""#));
    assert!(read(dir.path(), "pages/docs/intro.html").contains(r#"href="../default.html""#));
}

#[tokio::test]
async fn missing_sitemap_falls_back_to_start_page_links() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new());
    let renderer = Arc::new(
        StaticRenderer::new()
            .with(
                "https://site.test/",
                create_test_html(
                    "Home",
                    "",
                    r#"<a href="/a">A</a><a href="/b">B</a><a href="/a#again">A</a>
                       <a href="https://other.test/c">C</a><a href="javascript:void(0)">JS</a>
                       <a href="/">Self</a>"#,
                ),
            )
            .with("https://site.test/a", create_test_html("A", "", ""))
            .with("https://site.test/b", create_test_html("B", "", "")),
    );

    let report = mirror_with(
        test_config(dir.path(), "https://site.test/", true),
        fetcher.clone(),
        renderer.clone(),
    )
    .await
    .unwrap();

    assert_eq!(fetcher.hits(SITEMAP), 1);
    assert_eq!(report.pages_saved, 3);
    assert_eq!(
        renderer.rendered(),
        vec!["https://site.test/", "https://site.test/a", "https://site.test/b"]
    );
}

#[tokio::test]
async fn failing_pages_are_skipped() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new().with(
        SITEMAP,
        urlset(&["https://site.test/", "https://site.test/broken", "https://site.test/ok"]),
    ));
    let renderer = Arc::new(
        StaticRenderer::new()
            .with("https://site.test/", create_test_html("Home", "", ""))
            .with("https://site.test/ok", create_test_html("Ok", "", "")),
    );

    let report = mirror_with(
        test_config(dir.path(), "https://site.test/", true),
        fetcher,
        renderer,
    )
    .await
    .unwrap();

    assert_eq!(report.pages_saved, 2);
    assert_eq!(report.pages_failed, 1);
    assert!(dir.path().join("ok.html").exists());
    assert!(!dir.path().join("broken.html").exists());
}

#[tokio::test]
async fn single_page_mode_mirrors_only_the_start_page() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("default.html"), "earlier run").unwrap();
    let fetcher = Arc::new(MockFetcher::new().with(SITEMAP, urlset(&["https://site.test/a"])));
    let renderer = Arc::new(StaticRenderer::new().with(
        "https://site.test/",
        create_test_html("Home", "", r#"<a href="/a">A</a>"#),
    ));

    let report = mirror_with(
        test_config(dir.path(), "https://site.test/", false),
        fetcher.clone(),
        renderer.clone(),
    )
    .await
    .unwrap();

    assert_eq!(report.pages_saved, 1);
    assert_eq!(report.links_retargeted, 0);
    assert_eq!(fetcher.hits(SITEMAP), 0);
    assert_eq!(renderer.rendered(), vec!["https://site.test/"]);
    assert_eq!(read(dir.path(), "default.html"), "earlier run");
    assert!(read(dir.path(), "default-1.html").contains(r#"href="/a""#));
}

#[tokio::test]
async fn start_page_failure_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let fetcher = Arc::new(MockFetcher::new());
    let renderer = Arc::new(StaticRenderer::new());

    let err = mirror_with(
        test_config(dir.path(), "https://site.test/", false),
        fetcher.clone(),
        renderer.clone(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, MirrorError::Render { .. }));

    let err = mirror_with(
        test_config(dir.path(), "https://site.test/", true),
        fetcher,
        renderer,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, MirrorError::Render { .. }));
}
