use crate::wire::request::{find_header, parse_header_line};

/// Parses a raw response head into its status code and headers.
pub fn parse_response_head(head: &str) -> Option<(u16, Vec<(String, String)>)> {
    let mut lines = head.lines();
    let status_line = lines.next()?;
    log::debug!("Status line: {}", status_line);

    let mut parts = status_line.split_whitespace();
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    let status = parts.next()?.parse::<u16>().ok()?;

    let headers = lines
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let header = parse_header_line(line);
            if header.is_none() {
                log::debug!("Skipping invalid header line: {}", line);
            }
            header
        })
        .collect();

    Some((status, headers))
}

pub fn is_chunked(headers: &[(String, String)]) -> bool {
    find_header(headers, "transfer-encoding")
        .map(|value| value.to_ascii_lowercase().contains("chunked"))
        .unwrap_or(false)
}

pub fn content_length(headers: &[(String, String)]) -> Option<u64> {
    find_header(headers, "content-length").and_then(|value| value.trim().parse().ok())
}

/// Whether a response with `status` to a `method` request can carry a body.
pub fn response_has_body(method: &str, status: u16) -> bool {
    !(method.eq_ignore_ascii_case("HEAD")
        || (100..200).contains(&status)
        || status == 204
        || status == 304)
}
