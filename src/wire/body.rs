use std::io::{self, Write};

/// Frames everything written to it as HTTP/1.1 chunks.
pub struct ChunkedWriter<W: Write> {
    inner: W,
}

impl<W: Write> ChunkedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes the terminating zero-size chunk.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.write_all(b"0\r\n\r\n")?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for ChunkedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        write!(self.inner, "{:X}\r\n", buf.len())?;
        self.inner.write_all(buf)?;
        self.inner.write_all(b"\r\n")?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Body sink for a response whose length is not known up front: chunked for HTTP/1.1 clients,
/// delimited by connection close otherwise.
pub enum BodyWriter<W: Write> {
    Chunked(ChunkedWriter<W>),
    UntilClose(W),
}

impl<W: Write> BodyWriter<W> {
    pub fn new(inner: W, chunked: bool) -> Self {
        if chunked {
            BodyWriter::Chunked(ChunkedWriter::new(inner))
        } else {
            BodyWriter::UntilClose(inner)
        }
    }

    pub fn finish(self) -> io::Result<W> {
        match self {
            BodyWriter::Chunked(writer) => writer.finish(),
            BodyWriter::UntilClose(mut inner) => {
                inner.flush()?;
                Ok(inner)
            }
        }
    }
}

impl<W: Write> Write for BodyWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            BodyWriter::Chunked(writer) => writer.write(buf),
            BodyWriter::UntilClose(inner) => inner.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            BodyWriter::Chunked(writer) => writer.flush(),
            BodyWriter::UntilClose(inner) => inner.flush(),
        }
    }
}
