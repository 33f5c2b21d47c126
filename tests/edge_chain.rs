//! End-to-end dispatch tests: a handler chain over a real on-disk asset tree.

use edgeserve::middleware::{Chain, Handler};
use edgeserve::prerendered::PrerenderedHandler;
use edgeserve::static_files::{ContentRewriter, FileIndex, StaticServer};
use http_body_util::BodyExt;
use hyper::{Method, Request, StatusCode};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CACHE_CONTROL: &str = "public, max-age=86400";

fn write(root: &Path, rel: &str, contents: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn asset_tree() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "index.html", b"<h1>home</h1>");
    write(dir.path(), "about.html", b"<h1>about</h1>");
    write(dir.path(), "data.bin", b"0123456789");
    write(dir.path(), ".env", b"secret");
    dir
}

fn default_rewriter() -> ContentRewriter {
    ContentRewriter::new(
        vec!["text/css".to_string(), "application/javascript".to_string()],
        "Email",
        "E-mail",
    )
}

fn static_server(root: &Path, rewriter: ContentRewriter) -> StaticServer {
    StaticServer::new(
        FileIndex::build(root, CACHE_CONTROL),
        vec![String::new(), "html".to_string(), "htm".to_string()],
        "/",
        rewriter,
    )
}

fn chain_over(root: &Path) -> Chain<()> {
    Chain::new(vec![Box::new(static_server(root, default_rewriter()))])
}

fn get(uri: &str) -> Request<()> {
    Request::builder().uri(uri).body(()).unwrap()
}

fn get_with_range(uri: &str, range: &str) -> Request<()> {
    Request::builder()
        .uri(uri)
        .header("Range", range)
        .body(())
        .unwrap()
}

#[tokio::test]
async fn test_extension_probe_serves_bare_path() {
    let dir = asset_tree();
    let chain = chain_over(dir.path());

    let resp = chain.dispatch(get("/about")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"<h1>about</h1>");
}

#[tokio::test]
async fn test_unknown_path_serves_fallback() {
    let dir = asset_tree();
    let chain = chain_over(dir.path());

    let resp = chain.dispatch(get("/no/such/page")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"<h1>home</h1>");
}

#[tokio::test]
async fn test_range_window_is_partial_content() {
    let dir = asset_tree();
    let chain = chain_over(dir.path());

    let resp = chain.dispatch(get_with_range("/data.bin", "bytes=2-5")).await;
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(resp.headers().get("Content-Length").unwrap(), "4");
    assert_eq!(
        resp.headers().get("Content-Range").unwrap(),
        "bytes 2-5/10"
    );
    assert_eq!(resp.headers().get("Accept-Ranges").unwrap(), "bytes");
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"2345");
}

#[tokio::test]
async fn test_range_spanning_whole_file_keeps_full_length() {
    let dir = asset_tree();
    let chain = chain_over(dir.path());

    let resp = chain.dispatch(get_with_range("/data.bin", "bytes=0-9")).await;
    assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(resp.headers().get("Content-Length").unwrap(), "10");
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"0123456789");
}

#[tokio::test]
async fn test_range_start_past_end_is_unsatisfiable() {
    let dir = asset_tree();
    let chain = chain_over(dir.path());

    let resp = chain.dispatch(get_with_range("/data.bin", "bytes=10-")).await;
    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(resp.headers().get("Content-Range").unwrap(), "bytes */10");
}

#[tokio::test]
async fn test_rewrite_applies_once_and_recomputes_length() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.css", b"abc");
    // a non-idempotent rule makes a double application visible
    let rewriter = ContentRewriter::new(vec!["text/css".to_string()], "a", "aa");
    let chain: Chain<()> = Chain::new(vec![Box::new(static_server(dir.path(), rewriter))]);

    let resp = chain.dispatch(get("/app.css")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("Content-Length").unwrap(), "4");
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"aabc");
}

#[tokio::test]
async fn test_rewritten_type_ignores_range() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "app.css", b"Email { color: red }");
    let chain: Chain<()> =
        Chain::new(vec![Box::new(static_server(dir.path(), default_rewriter()))]);

    let resp = chain.dispatch(get_with_range("/app.css", "bytes=0-3")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"E-mail { color: red }");
}

#[tokio::test]
async fn test_dotfile_is_not_served() {
    let dir = asset_tree();
    let chain = chain_over(dir.path());

    let resp = chain.dispatch(get("/.env")).await;
    // the index never contains the dotfile, so the lookup lands on the
    // fallback page instead of the file contents
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"<h1>home</h1>");
}

#[tokio::test]
async fn test_head_carries_headers_without_body() {
    let dir = asset_tree();
    let chain = chain_over(dir.path());

    let req = Request::builder()
        .method(Method::HEAD)
        .uri("/data.bin")
        .body(())
        .unwrap();
    let resp = chain.dispatch(req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("Content-Length").unwrap(), "10");
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());
}

#[tokio::test]
async fn test_post_falls_through_to_terminator() {
    let dir = asset_tree();
    let chain = chain_over(dir.path());

    let req = Request::builder()
        .method(Method::POST)
        .uri("/about")
        .body(())
        .unwrap();
    let resp = chain.dispatch(req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_prerendered_redirect_through_chain() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "blog/index.html", b"<h1>blog</h1>");
    let handler = PrerenderedHandler::new(
        ["/blog/".to_string()].into_iter().collect(),
        static_server(dir.path(), default_rewriter()),
    );
    let chain: Chain<()> = Chain::new(vec![Box::new(handler)]);

    let resp = chain.dispatch(get("/blog?page=2")).await;
    assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(resp.headers().get("Location").unwrap(), "/blog/?page=2");

    let resp = chain.dispatch(get("/blog/?page=2")).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
