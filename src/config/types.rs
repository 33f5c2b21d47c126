// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure, consumed at construction time only
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub edge: EdgeConfig,
    pub assets: AssetsConfig,
    pub rewrite: RewriteConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
}

/// Bridge configuration: request normalization and client-address trust
#[derive(Debug, Deserialize, Clone)]
pub struct EdgeConfig {
    /// Origin override; when unset the origin is derived from trusted headers
    pub origin: Option<String>,
    /// Trusted client-address header; absence of the header on a request is a
    /// configuration violation once this is set
    pub address_header: Option<String>,
    /// For `x-forwarded-for`: Nth-from-the-end address to trust
    pub xff_depth: usize,
    /// Trusted protocol header; `https` is assumed when unset
    pub protocol_header: Option<String>,
    pub host_header: String,
    /// Request body size cap in bytes
    pub body_size_limit: usize,
}

/// Static asset configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    pub client_dir: String,
    pub static_dir: String,
    pub prerendered_dir: String,
    /// JSON manifest listing the prerendered URL paths
    pub prerendered_manifest: Option<String>,
    /// Priority-ordered extension list; an empty entry means "as-is"
    pub extensions: Vec<String>,
    /// Last-resort lookup path for single-page-app fallback semantics
    pub fallback: String,
    pub cache_max_age: u64,
    /// urlKey prefix of content-hashed build output, marked immutable
    pub immutable_prefix: Option<String>,
}

/// Substitution pass configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RewriteConfig {
    pub find: String,
    pub replace: String,
    /// Content types rewritten on the static path (full read, recomputed length)
    pub static_types: Vec<String>,
    /// Content types rewritten chunk-by-chunk on the bridge path
    pub stream_types: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}
