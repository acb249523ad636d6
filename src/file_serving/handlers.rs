use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, LOCATION, TRANSFER_ENCODING};
use http::StatusCode;
use std::time::SystemTime;

use super::listing::render_listing;
use super::path_utils::{classify, resolve, Action};
use super::*;
use crate::compression::{negotiate, CompressionType};
use crate::config::ServerConfig;
use crate::freshness::{is_fresh, CacheHeaders};
use crate::log_error;
use crate::wire::{escape_html, send_body, BodyWriter, Request, ResponseHead};

/// Answers a request from the local filesystem. Returns the status that was sent.
pub fn handle_file_request<W: Write>(
    client: &mut W,
    request: &Request,
    config: &ServerConfig,
) -> io::Result<StatusCode> {
    let target = resolve(&config.root, request.path());
    log::debug!("Resolved target: {:?}", target);

    match classify(target) {
        Action::NotFound => respond_not_found(client, request),
        Action::RedirectWithSlash => respond_redirect(client, request),
        Action::ListDirectory(dir) => respond_directory(client, request, config, &dir),
        Action::ServeFile(path) => respond(client, request, config, &path),
    }
}

/// Serves `dir`'s index page when it has one, otherwise a generated listing.
fn respond_directory<W: Write>(
    client: &mut W,
    request: &Request,
    config: &ServerConfig,
    dir: &Path,
) -> io::Result<StatusCode> {
    let index = dir.join(&config.index_page);
    if index.is_file() {
        log::debug!("Serving index page {}", index.display());
        return respond(client, request, config, &index);
    }

    match render_listing(dir, request.path()) {
        Ok(html) => send_body(
            client,
            ResponseHead::new(StatusCode::OK),
            "text/html; charset=utf-8",
            html.as_bytes(),
            request.is_head(),
        ),
        Err(e) => respond_error(client, request, &e),
    }
}

/// Serves a regular file: caching headers, then either a 304 or the (possibly compressed) body.
fn respond<W: Write>(
    client: &mut W,
    request: &Request,
    config: &ServerConfig,
    path: &Path,
) -> io::Result<StatusCode> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => return respond_error(client, request, &e),
    };
    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    let cache = CacheHeaders::new(modified, config.max_age, SystemTime::now());

    if is_fresh(request.header("if-modified-since"), &cache.last_modified) {
        log::debug!("Not modified: {}", path.display());
        let mut head = ResponseHead::new(StatusCode::NOT_MODIFIED);
        cache.apply(&mut head)?;
        head.write_to(client)?;
        client.flush()?;
        return Ok(head.status);
    }

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return respond_error(client, request, &e),
    };

    let mut head = ResponseHead::new(StatusCode::OK);
    cache.apply(&mut head)?;
    head.insert(CONTENT_TYPE, &crate::mime::lookup(path))?;

    let compression = negotiate(
        request.header("accept-encoding"),
        config.is_compressible(path),
    );
    let chunked = request.supports_chunked();
    match compression.token() {
        Some(token) => {
            head.insert(CONTENT_ENCODING, token)?;
            if chunked {
                head.insert(TRANSFER_ENCODING, "chunked")?;
            }
        }
        None => head.insert(CONTENT_LENGTH, &metadata.len().to_string())?,
    }
    head.write_to(client)?;

    if request.is_head() {
        client.flush()?;
        return Ok(head.status);
    }

    // Headers are on the wire; a failure from here on can only be logged.
    if let Err(e) = stream_file(client, &mut file, compression, chunked, config.gzip_level) {
        log_error!(e, format!("Streaming {} failed", path.display()));
    }
    Ok(head.status)
}

fn stream_file<W: Write>(
    client: &mut W,
    file: &mut File,
    compression: CompressionType,
    chunked: bool,
    level: u32,
) -> io::Result<()> {
    if compression == CompressionType::None {
        io::copy(file, client)?;
        return client.flush();
    }

    let mut encoder = compression.wrap(BodyWriter::new(&mut *client, chunked), level);
    let copied = io::copy(file, &mut encoder)?;
    encoder.finish()?.finish()?;
    log::debug!("Streamed {} bytes with {:?}", copied, compression);
    Ok(())
}

fn respond_redirect<W: Write>(client: &mut W, request: &Request) -> io::Result<StatusCode> {
    let mut location = format!("{}/", request.path());
    if let Some(query) = request.query() {
        location.push('?');
        location.push_str(query);
    }

    let mut head = ResponseHead::new(StatusCode::MOVED_PERMANENTLY);
    head.insert(LOCATION, &location)?;
    let location = escape_html(&location);
    let body = format!("Redirecting to <a href=\"{}\">{}</a>", location, location);
    send_body(client, head, "text/html", body.as_bytes(), request.is_head())
}

fn respond_not_found<W: Write>(client: &mut W, request: &Request) -> io::Result<StatusCode> {
    let body = format!(
        "<h1>Not Found</h1><p>The requested URL {} was not found on this server.</p>",
        escape_html(&request.target)
    );
    send_body(
        client,
        ResponseHead::new(StatusCode::NOT_FOUND),
        "text/html",
        body.as_bytes(),
        request.is_head(),
    )
}

fn respond_error<W: Write>(
    client: &mut W,
    request: &Request,
    error: &io::Error,
) -> io::Result<StatusCode> {
    log_error!(error, format!("Failed to serve {}", request.target));
    send_body(
        client,
        ResponseHead::new(StatusCode::INTERNAL_SERVER_ERROR),
        "text/plain",
        error.to_string().as_bytes(),
        request.is_head(),
    )
}
