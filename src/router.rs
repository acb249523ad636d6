use http::StatusCode;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream};
use std::time::Instant;

use crate::config::ServerConfig;
use crate::file_serving::handlers::handle_file_request;
use crate::proxy;
use crate::wire::{send_body, Request, ResponseHead};
use crate::{log_request, log_response};

/// Serves the single request carried by `client`, then closes the connection.
pub fn handle_connection(client: TcpStream, config: &ServerConfig) -> io::Result<()> {
    let start_time = Instant::now();
    let mut reader = BufReader::new(client.try_clone()?);
    let mut client = client;

    let request = match Request::read_from(&mut reader) {
        Ok(Some(request)) => request,
        Ok(None) => {
            log::debug!("Connection closed before a request was sent");
            return Ok(());
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            log::warn!("Rejecting malformed request: {}", e);
            send_body(
                &mut client,
                ResponseHead::new(StatusCode::BAD_REQUEST),
                "text/plain",
                b"Bad Request",
                false,
            )?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    log_request!(request.method, request.target);

    let status = route(&mut client, &mut reader, &request, config)?;
    log_response!(status, start_time.elapsed());

    client.flush()?;
    if let Err(e) = client.shutdown(Shutdown::Write) {
        log::debug!("Shutdown after response failed: {}", e);
    }
    Ok(())
}

/// Sends the request upstream when it matches `proxy_match`, otherwise serves it from disk.
pub fn route<R: BufRead, W: Write>(
    client: &mut W,
    body: &mut R,
    request: &Request,
    config: &ServerConfig,
) -> io::Result<StatusCode> {
    if config.is_proxied(&request.target) {
        log::debug!("Proxying {} to {}", request.target, config.proxy_target);
        proxy::forward(request, body, client, &config.proxy_target)
    } else {
        handle_file_request(client, request, config)
    }
}
