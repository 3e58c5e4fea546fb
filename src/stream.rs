//! `std::io` adapters that re-encode a byte stream on the fly
//!
//! Both adapters decode with one codec into a UTF-16 pivot and encode the
//! pivot with another, carrying partial sequences across reads and writes.
//! Codec errors surface as [`io::ErrorKind::InvalidData`].

use std::io::{self, Read, Write};

use crate::{Codec, Decoder, Encoder, Error};

const DEFAULT_CAPACITY: usize = 8 * 1024;

fn invalid_data(err: Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

/// Reader yielding the bytes of `inner` re-encoded from one codec to another
#[derive(Debug)]
pub struct TranscodingReader<R> {
    inner: R,
    decoder: Decoder,
    encoder: Encoder,
    raw: Vec<u8>,
    pivot: Vec<u16>,
    pending: Vec<u8>,
    pos: usize,
    finished: bool,
}

impl<R: Read> TranscodingReader<R> {
    /// Wraps `inner`, reading it in 8 KiB chunks
    pub fn new(inner: R, from: &Codec, to: &Codec) -> Self {
        Self::with_capacity(DEFAULT_CAPACITY, inner, from, to)
    }

    /// Wraps `inner`, reading it `capacity` bytes at a time
    pub fn with_capacity(capacity: usize, inner: R, from: &Codec, to: &Codec) -> Self {
        Self {
            inner,
            decoder: from.decoder(),
            encoder: to.encoder(),
            raw: vec![0; capacity.max(4)],
            pivot: Vec::new(),
            pending: Vec::new(),
            pos: 0,
            finished: false,
        }
    }

    /// Gets a reference to the underlying reader
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwraps this reader, discarding any converted but unread output
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self) -> io::Result<()> {
        while self.pos == self.pending.len() && !self.finished {
            self.pending.clear();
            self.pos = 0;

            let n = loop {
                match self.inner.read(&mut self.raw) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            };
            let flush = n == 0;

            self.pivot.clear();
            self.decoder
                .decode_into(&self.raw[..n], &mut self.pivot, flush)
                .map_err(invalid_data)?;
            self.encoder
                .encode_into(&self.pivot, &mut self.pending, flush)
                .map_err(invalid_data)?;

            if flush {
                self.finished = true;
                log::trace!(
                    "{} to {} reader reached end of input",
                    self.decoder.codec().name(),
                    self.encoder.codec().name()
                );
            }
        }
        Ok(())
    }
}

impl<R: Read> Read for TranscodingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.fill()?;
        let available = &self.pending[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

/// Writer that re-encodes everything written to it before passing it on.
///
/// A sequence split across `write` calls is held until it completes. Call
/// [`TranscodingWriter::finish`] at the end of the stream so anything still
/// held is flushed through the fallbacks; dropping the writer discards it.
#[derive(Debug)]
pub struct TranscodingWriter<W> {
    inner: W,
    decoder: Decoder,
    encoder: Encoder,
    pivot: Vec<u16>,
    out: Vec<u8>,
}

impl<W: Write> TranscodingWriter<W> {
    /// Wraps `inner`
    pub fn new(inner: W, from: &Codec, to: &Codec) -> Self {
        Self {
            inner,
            decoder: from.decoder(),
            encoder: to.encoder(),
            pivot: Vec::new(),
            out: Vec::new(),
        }
    }

    /// Gets a reference to the underlying writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Flushes held partial sequences and returns the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.pump(&[], true)?;
        self.inner.flush()?;
        log::trace!(
            "{} to {} writer finished",
            self.decoder.codec().name(),
            self.encoder.codec().name()
        );
        Ok(self.inner)
    }

    /// A codec error leaves both halves as they were before the call, so
    /// the rejected bytes can be skipped or replaced and writing resumed.
    fn pump(&mut self, bytes: &[u8], flush: bool) -> io::Result<()> {
        self.pivot.clear();
        self.out.clear();
        let decoder = self.decoder.clone();
        self.decoder
            .decode_into(bytes, &mut self.pivot, flush)
            .map_err(invalid_data)?;
        if let Err(err) = self.encoder.encode_into(&self.pivot, &mut self.out, flush) {
            self.decoder = decoder;
            return Err(invalid_data(err));
        }
        self.inner.write_all(&self.out)
    }
}

impl<W: Write> Write for TranscodingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pump(buf, false)?;
        Ok(buf.len())
    }

    /// Flushes the inner writer; sequences still incomplete stay held
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
