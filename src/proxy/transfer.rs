use std::time::Instant;
use url::Url;

use super::headers::{content_length, is_chunked, parse_response_head};
use super::*;
use crate::wire::Request;

/// Upper bound on an upstream response head.
const MAX_HEAD_BYTES: u64 = 64 * 1024;

/// Copies one chunked body from `reader` to `writer` verbatim, chunk framing and trailers
/// included. Returns the number of payload bytes.
pub fn forward_chunked_body<R: BufRead, W: Write>(reader: &mut R, writer: &mut W) -> io::Result<u64> {
    let start_time = Instant::now();
    let mut total_bytes = 0;
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Err(unexpected_eof("chunk size"));
        }
        writer.write_all(&line)?;

        let size_line = std::str::from_utf8(&line)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let size_str = size_line.split(';').next().unwrap_or("").trim();
        let size = u64::from_str_radix(size_str, 16)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if size == 0 {
            break;
        }

        total_bytes += size;
        log::trace!("Forwarding chunk of size: {} bytes", size);

        let copied = io::copy(&mut reader.by_ref().take(size), writer)?;
        if copied < size {
            return Err(unexpected_eof("chunk data"));
        }

        // CRLF after the chunk data
        line.clear();
        reader.read_until(b'\n', &mut line)?;
        writer.write_all(&line)?;
    }

    // Trailers, ended by an empty line
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Err(unexpected_eof("chunked trailer"));
        }
        writer.write_all(&line)?;
        if line == b"\r\n" || line == b"\n" {
            break;
        }
    }

    log::debug!(
        "Completed chunked body transfer: {} bytes in {:?}",
        total_bytes,
        start_time.elapsed()
    );
    Ok(total_bytes)
}

/// Copies a message body framed by `headers`. Without chunking or a length the body runs to
/// EOF when `until_eof` is set (responses) and is empty otherwise (requests).
pub fn forward_body<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    headers: &[(String, String)],
    until_eof: bool,
) -> io::Result<u64> {
    if is_chunked(headers) {
        forward_chunked_body(reader, writer)
    } else if let Some(length) = content_length(headers) {
        let copied = io::copy(&mut reader.by_ref().take(length), writer)?;
        if copied < length {
            return Err(unexpected_eof("body"));
        }
        Ok(copied)
    } else if until_eof {
        io::copy(reader, writer)
    } else {
        Ok(0)
    }
}

/// Path and query to send upstream: the target's base path followed by the client's target.
pub fn upstream_target(target: &Url, request_target: &str) -> String {
    let base = target.path().trim_end_matches('/');
    if request_target.starts_with('/') {
        format!("{}{}", base, request_target)
    } else {
        format!("{}/{}", base, request_target)
    }
}

/// `host[:port]` of the target, as it belongs in a `Host` header.
pub fn host_header(target: &Url) -> String {
    let host = target.host_str().unwrap_or("localhost");
    match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Writes the client's request to the upstream: request line, headers as received, then the
/// body read from `body`.
pub fn forward_request<R: BufRead, W: Write>(
    request: &Request,
    body: &mut R,
    server: &mut W,
    target: &Url,
) -> io::Result<()> {
    let start_time = Instant::now();

    let mut head = format!(
        "{} {} {}\r\n",
        request.method,
        upstream_target(target, &request.target),
        request.version
    );
    if request.header("host").is_none() {
        head.push_str(&format!("Host: {}\r\n", host_header(target)));
    }
    for (name, value) in &request.headers {
        head.push_str(&format!("{}: {}\r\n", name, value));
    }
    head.push_str("\r\n");

    server.write_all(head.as_bytes())?;
    let body_bytes = forward_body(body, server, &request.headers, false)?;
    server.flush()?;

    log::debug!(
        "Forwarded request with {} body bytes in {:?}",
        body_bytes,
        start_time.elapsed()
    );
    Ok(())
}

/// Reads a response head. Returns the raw bytes for verbatim relaying, plus the parsed status and
/// headers.
pub fn read_response_head<R: BufRead>(
    reader: &mut R,
) -> io::Result<(Vec<u8>, u16, Vec<(String, String)>)> {
    let mut raw = Vec::new();
    let mut limited = reader.take(MAX_HEAD_BYTES);
    loop {
        let read = limited.read_until(b'\n', &mut raw)?;
        if read == 0 {
            return Err(unexpected_eof("response head"));
        }
        if raw.ends_with(b"\r\n\r\n") || raw.ends_with(b"\n\n") {
            break;
        }
    }

    let text = String::from_utf8_lossy(&raw);
    let (status, headers) = parse_response_head(&text).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "malformed upstream status line")
    })?;
    Ok((raw, status, headers))
}

fn unexpected_eof(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("connection closed while reading {}", what),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn chunked_body_is_copied_verbatim() {
        let raw = b"5;ext=1\r\nhello\r\n6\r\n world\r\n0\r\nX-Checksum: abc\r\n\r\nNEXT";
        let mut reader = Cursor::new(&raw[..]);
        let mut out = Vec::new();

        let total = forward_chunked_body(&mut reader, &mut out).unwrap();

        assert_eq!(total, 11);
        assert_eq!(out, &raw[..raw.len() - 4]);
        let mut rest = String::new();
        reader.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "NEXT");
    }

    #[test]
    fn truncated_chunk_is_an_error() {
        let mut reader = Cursor::new(&b"A\r\nshort"[..]);
        let err = forward_chunked_body(&mut reader, &mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn request_without_length_has_no_body() {
        let headers = vec![("Host".to_string(), "x".to_string())];
        let mut reader = Cursor::new(&b"leftover"[..]);
        let mut out = Vec::new();
        assert_eq!(forward_body(&mut reader, &mut out, &headers, false).unwrap(), 0);
        assert!(out.is_empty());
        assert_eq!(forward_body(&mut reader, &mut out, &headers, true).unwrap(), 8);
    }

    #[test]
    fn target_base_path_is_prefixed() {
        let bare = Url::parse("http://127.0.0.1").unwrap();
        assert_eq!(upstream_target(&bare, "/api/x?y=1"), "/api/x?y=1");
        assert_eq!(host_header(&bare), "127.0.0.1");

        let based = Url::parse("http://backend:8080/v1/").unwrap();
        assert_eq!(upstream_target(&based, "/api/x"), "/v1/api/x");
        assert_eq!(host_header(&based), "backend:8080");
    }

    #[test]
    fn forwards_request_head_and_body() {
        let raw = "POST /api/items HTTP/1.1\r\nContent-Length: 3\r\nX-Id: 7\r\n\r\nabcEXTRA";
        let mut reader = Cursor::new(raw.as_bytes());
        let request = Request::read_from(&mut reader).unwrap().unwrap();
        let target = Url::parse("http://127.0.0.1:9000").unwrap();

        let mut out = Vec::new();
        forward_request(&request, &mut reader, &mut out, &target).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "POST /api/items HTTP/1.1\r\nHost: 127.0.0.1:9000\r\nContent-Length: 3\r\nX-Id: 7\r\n\r\nabc"
        );
    }

    #[test]
    fn reads_response_head_and_stops_at_body() {
        let raw = b"HTTP/1.1 404 Not Found\r\nContent-Length: 4\r\n\r\nnope";
        let mut reader = Cursor::new(&raw[..]);
        let (head, status, headers) = read_response_head(&mut reader).unwrap();
        assert_eq!(status, 404);
        assert_eq!(head, &raw[..raw.len() - 4]);
        assert_eq!(content_length(&headers), Some(4));
    }
}
