use http::header::{HeaderName, CONNECTION, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};
use std::io::{self, Write};

/// Status and headers of a response. Must be written in full before any body byte.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseHead {
    pub fn new(status: StatusCode) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONNECTION, HeaderValue::from_static("close"));
        Self { status, headers }
    }

    pub fn insert(&mut self, name: HeaderName, value: &str) -> io::Result<()> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.headers.insert(name, value);
        Ok(())
    }

    pub fn get(&self, name: HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("")
        )
        .into_bytes();
        for (name, value) in &self.headers {
            head.extend_from_slice(name.as_str().as_bytes());
            head.extend_from_slice(b": ");
            head.extend_from_slice(value.as_bytes());
            head.extend_from_slice(b"\r\n");
        }
        head.extend_from_slice(b"\r\n");
        writer.write_all(&head)
    }
}

/// Writes a complete response with a small in-memory body.
pub fn send_body<W: Write>(
    writer: &mut W,
    mut head: ResponseHead,
    content_type: &str,
    body: &[u8],
    head_only: bool,
) -> io::Result<StatusCode> {
    head.insert(CONTENT_TYPE, content_type)?;
    head.insert(CONTENT_LENGTH, &body.len().to_string())?;
    head.write_to(writer)?;
    if !head_only {
        writer.write_all(body)?;
    }
    writer.flush()?;
    Ok(head.status)
}
