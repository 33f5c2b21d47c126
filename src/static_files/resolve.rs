//! Candidate resolution module
//!
//! Expands a request path into the ordered set of index keys to probe,
//! covering the extension and directory-index conventions. First match wins,
//! so callers must probe in the returned order.

/// Produce the ordered lookup candidates for `path`.
///
/// A trailing slash is stripped first. For each extension (an empty entry
/// means "as-is"): `path + ext` when the path is non-empty, then
/// `path + "/index" + ext`. Extension-list order is preserved.
pub fn candidates(path: &str, extensions: &[String]) -> Vec<String> {
    let path = path.strip_suffix('/').unwrap_or(path);

    let mut keys = Vec::with_capacity(extensions.len() * 2);
    for ext in extensions {
        let suffix = if ext.is_empty() {
            String::new()
        } else {
            format!(".{ext}")
        };
        if !path.is_empty() {
            keys.push(format!("{path}{suffix}"));
        }
        keys.push(format!("{path}/index{suffix}"));
    }
    keys
}
