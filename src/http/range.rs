//! HTTP Range request evaluation module
//!
//! Parses a single byte-range header against a known entity size and decides
//! between a full response, a partial response, and a 416 rejection.

/// Inclusive byte window within an entity.
///
/// Invariant: `start <= end < size` of the entity it was evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteWindow {
    pub start: u64,
    pub end: u64,
}

impl ByteWindow {
    /// Number of bytes covered by the window. Never zero, the bounds are
    /// inclusive.
    #[inline]
    pub const fn byte_len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Range header evaluation result
#[derive(Debug)]
pub enum RangeOutcome {
    /// No usable Range header, serve the full entity with status 200
    Full,
    /// Valid single range, serve status 206 with the window
    Partial(ByteWindow),
    /// Out-of-bounds offsets, respond 416 with `Content-Range: bytes */size`
    Unsatisfiable,
}

/// Evaluate an HTTP Range header (single range only, bytes unit).
///
/// Both sides of `bytes=<start>-<end>` are optional: a missing or non-numeric
/// start defaults to 0, a missing or non-numeric end defaults to `size - 1`.
/// `start >= size`, `end >= size`, or an inverted window are unsatisfiable.
/// Headers that do not look like a bytes range at all are ignored.
///
/// Multi-range syntax is not parsed specially: the comma makes the end bound
/// non-numeric, so the header degrades to a malformed single range.
///
/// # Examples
/// ```
/// use edgeserve::http::range::{evaluate_range, RangeOutcome};
///
/// assert!(matches!(evaluate_range(Some("bytes=0-99"), 1000), RangeOutcome::Partial(_)));
/// assert!(matches!(evaluate_range(None, 1000), RangeOutcome::Full));
/// assert!(matches!(evaluate_range(Some("bytes=1000-"), 1000), RangeOutcome::Unsatisfiable));
/// ```
pub fn evaluate_range(range_header: Option<&str>, size: u64) -> RangeOutcome {
    let Some(header) = range_header else {
        return RangeOutcome::Full;
    };

    let Some(spec) = header.strip_prefix("bytes=") else {
        return RangeOutcome::Full; // not a bytes unit, ignore
    };

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeOutcome::Full; // malformed, ignore
    };

    let start = start_str.trim().parse::<u64>().unwrap_or(0);
    if start >= size {
        return RangeOutcome::Unsatisfiable;
    }

    // size > 0 is guaranteed past the start check
    let end = end_str.trim().parse::<u64>().unwrap_or(size - 1);
    if end >= size || start > end {
        return RangeOutcome::Unsatisfiable;
    }

    RangeOutcome::Partial(ByteWindow { start, end })
}
