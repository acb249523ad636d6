use std::time::Instant;
use url::Url;

use super::headers::response_has_body;
use super::transfer::{forward_body, forward_request, read_response_head};
use super::*;
use crate::log_error;
use crate::logging::LoggingExt;
use crate::wire::{send_body, Request, ResponseHead};

/// Forwards `request` to `target` and relays the upstream response to `client`.
/// `body` is the client connection's reader, positioned at the request body.
///
/// One upstream attempt is made. If it fails before anything reaches the client, the client gets
/// a 500 describing the failure instead.
pub fn forward<R: BufRead, W: Write>(
    request: &Request,
    body: &mut R,
    client: &mut W,
    target: &Url,
) -> io::Result<StatusCode> {
    let start_time = Instant::now();

    match exchange(request, body, client, target) {
        Ok(status) => {
            log::debug!("← Completed proxy request in {:?}", start_time.elapsed());
            Ok(status)
        }
        Err(ProxyError::Upstream { target, source }) => {
            log_error!(source, format!("Proxying {} to {}", request.target, target));
            let body = format!("Proxy error: could not reach {}: {}", target, source);
            send_body(
                client,
                ResponseHead::new(StatusCode::INTERNAL_SERVER_ERROR),
                "text/plain",
                body.as_bytes(),
                false,
            )
        }
        Err(ProxyError::Relay { status, source }) => {
            log_error!(
                source,
                format!("Relaying {} response for {}", status, request.target)
            );
            Ok(status)
        }
    }
}

fn exchange<R: BufRead, W: Write>(
    request: &Request,
    body: &mut R,
    client: &mut W,
    target: &Url,
) -> Result<StatusCode, ProxyError> {
    let target_name = target.as_str().trim_end_matches('/').to_string();
    let upstream_error = |source: io::Error| ProxyError::Upstream {
        target: target_name.clone(),
        source,
    };

    let host = target
        .host_str()
        .ok_or_else(|| upstream_error(io::Error::new(io::ErrorKind::InvalidInput, "no host")))?;
    let port = target.port_or_known_default().unwrap_or(80);

    let server = target_name
        .as_str()
        .log_operation("connect", || TcpStream::connect((host, port)))
        .map_err(upstream_error)?;
    log::debug!("Connected to upstream {}:{}", host, port);

    let mut writer = server.try_clone().map_err(upstream_error)?;
    forward_request(request, body, &mut writer, target).map_err(upstream_error)?;

    let mut reader = BufReader::new(server);
    loop {
        let (head, status, headers) = read_response_head(&mut reader).map_err(upstream_error)?;
        let status = StatusCode::from_u16(status).map_err(|e| {
            upstream_error(io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        log::debug!("← {} from upstream", status);

        let relay_error = |source: io::Error| ProxyError::Relay { status, source };
        client.write_all(&head).map_err(relay_error)?;

        // Interim responses are followed by the real one.
        if status.is_informational() && status != StatusCode::SWITCHING_PROTOCOLS {
            client.flush().map_err(relay_error)?;
            continue;
        }

        if response_has_body(&request.method, status.as_u16()) {
            let copied = forward_body(&mut reader, client, &headers, true).map_err(relay_error)?;
            log::debug!("Relayed {} body bytes", copied);
        }
        client.flush().map_err(relay_error)?;
        return Ok(status);
    }
}
