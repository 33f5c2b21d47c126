//! Prerendered page resolution module
//!
//! Static file lookups are slash-sensitive while the prerendered-page
//! catalogue is not, so trailing-slash ambiguity is resolved by a permanent
//! redirect rather than silently serving either form.

use crate::http::{self, decode_path};
use crate::middleware::{Attempt, BoxFuture, Handler};
use crate::static_files::StaticServer;
use hyper::Request;
use std::collections::HashSet;
use std::io;
use std::path::Path;

/// Immutable catalogue of known-prerendered URL paths, supplied at startup.
pub struct PrerenderedSet {
    paths: HashSet<String>,
}

impl PrerenderedSet {
    /// Load the catalogue from a JSON manifest (an array of path strings).
    pub fn load(manifest: &Path) -> io::Result<Self> {
        let raw = std::fs::read_to_string(manifest)?;
        let paths: Vec<String> = serde_json::from_str(&raw)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(paths.into_iter().collect())
    }

    pub fn empty() -> Self {
        Self {
            paths: HashSet::new(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

impl FromIterator<String> for PrerenderedSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

/// Chain handler reconciling the prerendered catalogue against trailing-slash
/// ambiguity in the request path.
pub struct PrerenderedHandler {
    pages: PrerenderedSet,
    assets: StaticServer,
}

impl PrerenderedHandler {
    pub fn new(pages: PrerenderedSet, assets: StaticServer) -> Self {
        Self { pages, assets }
    }
}

impl<B: Send + 'static> Handler<B> for PrerenderedHandler {
    fn attempt<'a>(&'a self, req: Request<B>) -> BoxFuture<'a, Attempt<B>> {
        Box::pin(async move {
            let path = decode_path(req.uri().path());

            if self.pages.contains(&path) {
                return self.assets.attempt(req).await;
            }

            // remove or add trailing slash as appropriate
            let toggled = match path.strip_suffix('/') {
                Some(stripped) => stripped.to_string(),
                None => format!("{path}/"),
            };
            if self.pages.contains(&toggled) {
                let location = match req.uri().query() {
                    Some(q) => format!("{toggled}?{q}"),
                    None => toggled,
                };
                return Ok(http::response::permanent_redirect(&location));
            }

            Err(req)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_files::{ContentRewriter, FileIndex};
    use hyper::StatusCode;
    use std::fs;

    fn handler_with(pages: &[&str]) -> PrerenderedHandler {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("about")).unwrap();
        fs::write(dir.path().join("about/index.html"), "<h1>about</h1>").unwrap();
        let index = FileIndex::build(dir.path(), "public, max-age=86400");
        let assets = StaticServer::new(
            index,
            vec![String::new(), "html".to_string(), "htm".to_string()],
            "/",
            ContentRewriter::new(Vec::new(), "", ""),
        );
        PrerenderedHandler::new(
            pages.iter().map(ToString::to_string).collect(),
            assets,
        )
    }

    fn request(uri: &str) -> Request<()> {
        Request::builder().uri(uri).body(()).unwrap()
    }

    #[tokio::test]
    async fn test_slash_form_redirects_bare_path() {
        let handler = handler_with(&["/about/"]);

        let resp = handler.attempt(request("/about?x=1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(resp.headers().get("Location").unwrap(), "/about/?x=1");
    }

    #[tokio::test]
    async fn test_member_path_serves_directly() {
        let handler = handler_with(&["/about/"]);

        let resp = handler.attempt(request("/about/?x=1")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bare_member_redirects_slash_form() {
        let handler = handler_with(&["/about"]);

        let resp = handler.attempt(request("/about/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(resp.headers().get("Location").unwrap(), "/about");
    }

    #[tokio::test]
    async fn test_unknown_path_falls_through() {
        let handler = handler_with(&["/about/"]);

        assert!(handler.attempt(request("/missing")).await.is_err());
    }
}
