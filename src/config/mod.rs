// Configuration module entry point
// Loads the typed configuration from file, environment, and defaults

mod types;

use std::net::SocketAddr;

// Re-export public types
pub use types::{
    AssetsConfig, Config, EdgeConfig, LoggingConfig, RewriteConfig, ServerConfig,
};

impl Config {
    /// Load configuration from "config.toml" plus `EDGE_`-prefixed
    /// environment overrides.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from the specified file path (without extension).
    /// The file is optional; every option has a default.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::Environment::with_prefix("EDGE"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("server.keep_alive_timeout", 75)?
            .set_default("server.read_timeout", 30)?
            .set_default("server.write_timeout", 30)?
            .set_default("edge.xff_depth", 1)?
            .set_default("edge.host_header", "host")?
            .set_default("edge.body_size_limit", 524_288)?
            .set_default("assets.client_dir", "client")?
            .set_default("assets.static_dir", "static")?
            .set_default("assets.prerendered_dir", "prerendered")?
            .set_default("assets.extensions", vec!["", "html", "htm"])?
            .set_default("assets.fallback", "/")?
            .set_default("assets.cache_max_age", 86_400)?
            .set_default("rewrite.find", "Email")?
            .set_default("rewrite.replace", "E-mail")?
            .set_default(
                "rewrite.static_types",
                vec!["text/css", "application/javascript"],
            )?
            .set_default(
                "rewrite.stream_types",
                vec!["text/html", "text/plain", "text/css", "application/javascript"],
            )?
            .set_default("logging.access_log", true)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Cache-Control value shared by every precomputed header set.
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.assets.cache_max_age)
    }
}
