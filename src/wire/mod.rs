//! Minimal HTTP/1.x plumbing: request heads in, response heads and bodies out.

pub mod body;
pub mod request;
pub mod response;

pub use body::{BodyWriter, ChunkedWriter};
pub use request::Request;
pub use response::{send_body, ResponseHead};

/// Minimal HTML escaping for URLs and file names placed in generated pages.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
