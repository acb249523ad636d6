use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::{self, Write};

#[derive(Debug, PartialEq, Copy, Clone)]
pub enum CompressionType {
    Gzip,
    Deflate,
    None,
}

impl CompressionType {
    /// Value for the `Content-Encoding` header.
    pub fn token(self) -> Option<&'static str> {
        match self {
            CompressionType::Gzip => Some("gzip"),
            CompressionType::Deflate => Some("deflate"),
            CompressionType::None => None,
        }
    }

    /// Wraps `writer` so bytes written to it come out in this encoding.
    pub fn wrap<W: Write>(self, writer: W, level: u32) -> Encoder<W> {
        match self {
            CompressionType::Gzip => Encoder::Gzip(GzEncoder::new(writer, Compression::new(level))),
            CompressionType::Deflate => {
                Encoder::Deflate(ZlibEncoder::new(writer, Compression::new(level)))
            }
            CompressionType::None => Encoder::Identity(writer),
        }
    }
}

/// Whether `token` appears in `accept_encoding` as a whole word.
fn accepts(accept_encoding: &str, token: &str) -> bool {
    accept_encoding
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .any(|word| word.eq_ignore_ascii_case(token))
}

/// Picks the encoding for a response body. Ineligible paths and clients that accept neither
/// gzip nor deflate get the identity encoding; gzip wins when both are accepted.
pub fn negotiate(accept_encoding: Option<&str>, eligible: bool) -> CompressionType {
    if !eligible {
        return CompressionType::None;
    }
    match accept_encoding {
        Some(value) if accepts(value, "gzip") => CompressionType::Gzip,
        Some(value) if accepts(value, "deflate") => CompressionType::Deflate,
        _ => CompressionType::None,
    }
}

/// A body writer, possibly compressing on the way through.
pub enum Encoder<W: Write> {
    Identity(W),
    Gzip(GzEncoder<W>),
    Deflate(ZlibEncoder<W>),
}

impl<W: Write> Encoder<W> {
    /// Flushes any trailer and hands back the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Encoder::Identity(writer) => Ok(writer),
            Encoder::Gzip(encoder) => encoder.finish(),
            Encoder::Deflate(encoder) => encoder.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Identity(writer) => writer.write(buf),
            Encoder::Gzip(encoder) => encoder.write(buf),
            Encoder::Deflate(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Identity(writer) => writer.flush(),
            Encoder::Gzip(encoder) => encoder.flush(),
            Encoder::Deflate(encoder) => encoder.flush(),
        }
    }
}
