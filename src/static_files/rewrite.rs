//! Content rewriting module
//!
//! A literal substitution pass applied to a configured set of content types.
//! The rule is injected at construction; it stands in for a richer transform
//! such as localization and must stay pluggable.

use hyper::body::Bytes;

#[derive(Clone)]
pub struct ContentRewriter {
    types: Vec<String>,
    find: String,
    replace: String,
}

impl ContentRewriter {
    pub fn new(
        types: Vec<String>,
        find: impl Into<String>,
        replace: impl Into<String>,
    ) -> Self {
        Self {
            types,
            find: find.into(),
            replace: replace.into(),
        }
    }

    /// Whether the pass applies to this content type. Parameters such as
    /// `; charset=utf-8` are ignored for the comparison.
    pub fn applies_to(&self, content_type: &str) -> bool {
        let bare = content_type.split(';').next().unwrap_or("").trim();
        !bare.is_empty() && self.types.iter().any(|t| t == bare)
    }

    /// Run the substitution pass once over `text`.
    pub fn apply(&self, text: &str) -> String {
        text.replace(&self.find, &self.replace)
    }

    /// Run the pass over a body chunk, decoding it as UTF-8 (lossily, as a
    /// text decoder would).
    pub fn apply_chunk(&self, chunk: &Bytes) -> Bytes {
        let text = String::from_utf8_lossy(chunk);
        Bytes::from(self.apply(&text).into_bytes())
    }
}
