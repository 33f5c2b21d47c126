//! Logger module
//!
//! Logging utilities for the edge server: lifecycle messages, access
//! logging, warnings, errors, and defect reports, written to stdout/stderr
//! or configured files.

mod writer;

use crate::config::Config;
use hyper::{Method, Uri};
use std::net::SocketAddr;

/// Initialize the logger with configuration.
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info("======================================");
    write_info("Edge server started successfully");
    write_info(&format!("Listening on: http://{addr}"));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    write_info(&format!("Client assets: {}", config.assets.client_dir));
    write_info(&format!("Static assets: {}", config.assets.static_dir));
    write_info(&format!("Prerendered pages: {}", config.assets.prerendered_dir));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_index_built(label: &str, entries: usize) {
    write_info(&format!("[Index] {label}: {entries} files"));
}

pub fn log_request(method: &Method, uri: &Uri) {
    write_info(&format!("[Request] {method} {uri}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[ERROR] Failed to serve connection: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[WARN] {message}"));
}

/// Programming-contract violations: surfaced to the client, logged here as
/// defects.
pub fn log_defect(message: &str) {
    write_error(&format!("[DEFECT] {message}"));
}
