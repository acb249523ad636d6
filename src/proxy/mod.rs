pub mod handlers;
pub mod headers;
pub mod transfer;

use http::StatusCode;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use thiserror::Error;

pub use handlers::forward;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// Nothing has reached the client yet, so a 500 can still be sent in its place.
    #[error("upstream {target} failed: {source}")]
    Upstream {
        target: String,
        #[source]
        source: io::Error,
    },
    /// The upstream head was already relayed; the response can only be cut short.
    #[error("relaying {status} response failed: {source}")]
    Relay {
        status: StatusCode,
        #[source]
        source: io::Error,
    },
}
