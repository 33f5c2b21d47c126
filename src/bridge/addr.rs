//! Client address resolution module
//!
//! Pluggable per deployment: a trusted address header when the edge sits
//! behind a proxy, otherwise the transport-level peer address. Misconfigured
//! trust settings are fatal to the request, never a silent fallback.

use hyper::header::HeaderMap;
use std::net::SocketAddr;

/// Lowercased name the forwarded-for special case keys on.
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Resolve the client address for a request.
///
/// With `address_header` configured, a missing header or an out-of-bounds
/// `xff_depth` is a configuration violation (`Err`), surfaced as a server
/// error by the caller.
pub fn resolve_client_addr(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    address_header: Option<&str>,
    xff_depth: usize,
) -> Result<String, String> {
    let Some(name) = address_header else {
        return Ok(peer.map(|p| p.ip().to_string()).unwrap_or_default());
    };

    let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) else {
        return Err(format!(
            "address header '{name}' is configured but absent from the request"
        ));
    };

    if name.eq_ignore_ascii_case(FORWARDED_FOR) {
        let addresses: Vec<&str> = value.split(',').collect();
        if xff_depth < 1 {
            return Err("xff_depth must be a positive integer".to_string());
        }
        if xff_depth > addresses.len() {
            return Err(format!(
                "xff_depth is {xff_depth}, but only {} addresses are present",
                addresses.len()
            ));
        }
        return Ok(addresses[addresses.len() - xff_depth].trim().to_string());
    }

    Ok(value.to_string())
}
