//! A static file server that forwards a configurable set of paths to an upstream HTTP service.
//!
//! Every connection carries one request. Requests whose target matches the proxy rule are relayed
//! to the upstream untouched. Everything else is resolved under the root directory and answered
//! with a file, a directory listing, a redirect or an error, with `Last-Modified` based caching
//! and optional gzip/deflate compression.

pub mod args;
pub mod browser;
pub mod compression;
pub mod config;
pub mod file_serving;
pub mod freshness;
pub mod logging;
pub mod mime;
pub mod proxy;
pub mod router;
pub mod server;
pub mod wire;

pub use config::ServerConfig;
pub use server::{start_server, Server};
