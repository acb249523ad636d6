use std::io::{self, BufRead, Read};

/// Upper bound on the request line plus headers.
const MAX_HEAD_BYTES: u64 = 64 * 1024;

/// A parsed request head. The body, if any, is left unread in the connection's reader.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    /// Raw request target as sent by the client, query included.
    pub target: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Reads a request line and headers. Returns `Ok(None)` when the peer closed the connection
    /// without sending anything, and `InvalidData` for a malformed head.
    pub fn read_from<R: BufRead>(reader: &mut R) -> io::Result<Option<Request>> {
        let mut reader = reader.by_ref().take(MAX_HEAD_BYTES);

        let mut first_line = String::new();
        if reader.read_line(&mut first_line)? == 0 {
            return Ok(None);
        }
        log::trace!("Request line: {}", first_line.trim_end());

        let mut parts = first_line.split_whitespace();
        let (method, target, version) = match (parts.next(), parts.next(), parts.next()) {
            (Some(method), Some(target), Some(version)) if version.starts_with("HTTP/") => {
                (method.to_string(), target.to_string(), version.to_string())
            }
            _ => return Err(invalid(format!("malformed request line: {}", first_line.trim()))),
        };

        let mut headers = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(invalid("connection closed inside request head".to_string()));
            }
            if line.trim().is_empty() {
                break;
            }
            match parse_header_line(&line) {
                Some(header) => headers.push(header),
                None => log::debug!("Skipping invalid header line: {}", line.trim_end()),
            }
        }

        Ok(Some(Request {
            method,
            target,
            version,
            headers,
        }))
    }

    /// First value of the header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The target without its query string.
    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or(&self.target)
    }

    pub fn query(&self) -> Option<&str> {
        self.target.split_once('?').map(|(_, query)| query)
    }

    pub fn has_trailing_slash(&self) -> bool {
        self.path().ends_with('/')
    }

    pub fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }

    /// Whether the client can receive a chunked body.
    pub fn supports_chunked(&self) -> bool {
        self.version != "HTTP/1.0"
    }
}

pub fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

pub fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
