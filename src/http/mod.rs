//! HTTP protocol layer module
//!
//! Protocol-level building blocks shared by the static file server and the
//! upstream bridge: MIME lookup, byte-range evaluation, header composition,
//! response builders, and streaming body plumbing. Decoupled from specific
//! business logic.

pub mod body;
pub mod headers;
pub mod mime;
pub mod range;
pub mod response;

use percent_encoding::percent_decode_str;

// Re-export commonly used types
pub use range::{evaluate_range, ByteWindow, RangeOutcome};
pub use response::{not_found, permanent_redirect, range_not_satisfiable, server_error};

/// Percent-decode a request path.
///
/// Invalid encodings are tolerated by returning the path unmodified rather
/// than failing the request.
pub fn decode_path(path: &str) -> String {
    if !path.contains('%') {
        return path.to_string();
    }
    match percent_decode_str(path).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_path() {
        assert_eq!(decode_path("/a%20b"), "/a b");
        assert_eq!(decode_path("/plain"), "/plain");
    }

    #[test]
    fn test_decode_path_invalid_encoding_left_as_is() {
        assert_eq!(decode_path("/bad%ff%fe"), "/bad%ff%fe");
        assert_eq!(decode_path("/trunc%2"), "/trunc%2");
    }
}
