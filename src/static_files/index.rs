//! Static file index module
//!
//! One-time recursive scan of a root directory producing an immutable mapping
//! from normalized URL path to file location, size, and precomputed headers.
//! The tree is not watched afterwards; a changed on-disk tree requires a
//! rescan.

use crate::http::headers;
use hyper::header::HeaderMap;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

/// One indexed file. Owned by the index that created it, immutable after the
/// initial scan.
pub struct IndexEntry {
    pub abs: PathBuf,
    pub size: u64,
    pub headers: HeaderMap,
}

/// Immutable mapping from urlKey to [`IndexEntry`], built once at handler
/// construction time. Read-only afterwards, so it is shared without locking.
pub struct FileIndex {
    entries: HashMap<String, IndexEntry>,
}

impl FileIndex {
    /// Walk `root` and index every retained regular file.
    ///
    /// A missing or empty directory yields an empty index; lookups simply
    /// miss.
    pub fn build(root: &Path, cache_control: &str) -> Self {
        let mut entries = HashMap::new();

        if root.is_dir() {
            for item in WalkDir::new(root).into_iter().filter_map(Result::ok) {
                if !item.file_type().is_file() {
                    continue;
                }
                let Ok(rel) = item.path().strip_prefix(root) else {
                    continue;
                };
                let Some(key) = url_key(rel) else {
                    continue;
                };
                let Ok(meta) = item.metadata() else {
                    continue;
                };
                let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                let extension = item.path().extension().and_then(|e| e.to_str());
                let headers = headers::compose(extension, meta.len(), mtime, cache_control);
                entries.insert(
                    key,
                    IndexEntry {
                        abs: item.path().to_path_buf(),
                        size: meta.len(),
                        headers,
                    },
                );
            }
        }

        Self { entries }
    }

    pub fn lookup(&self, key: &str) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derive the urlKey for a root-relative path, or `None` for excluded paths.
///
/// Keys start with `/`, use forward slashes, and are NFC-normalized. Paths
/// with a dot-prefixed segment are excluded unless a `.well-known` segment is
/// present, in which case the whole subtree is retained.
fn url_key(rel: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in rel.components() {
        let Component::Normal(os) = component else {
            return None;
        };
        segments.push(os.to_str()?);
    }

    let well_known = segments.iter().any(|s| *s == ".well-known");
    let hidden = segments
        .iter()
        .any(|s| s.starts_with('.') && *s != ".well-known");
    if hidden && !well_known {
        return None;
    }

    Some(format!("/{}", segments.join("/")).nfc().collect())
}
