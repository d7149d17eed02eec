//! COMPRESS=DEFLATE stream wrapper (RFC 4978).
//!
//! Both directions are raw DEFLATE without a zlib header. Every flush ends
//! with a sync flush so the peer can decode everything written so far.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const INPUT_CHUNK: usize = 8192;

/// A stream that compresses writes and decompresses reads.
pub struct DeflateStream<S> {
    inner: S,
    compress: Compress,
    decompress: Decompress,
    /// Compressed bytes read from `inner` and not yet inflated.
    input: Vec<u8>,
    input_pos: usize,
    input_eof: bool,
    /// Compressed bytes not yet written to `inner`.
    output: Vec<u8>,
    output_pos: usize,
    /// Data was deflated since the last sync flush.
    dirty: bool,
}

impl<S> DeflateStream<S> {
    /// Wraps `inner`.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            compress: Compress::new(Compression::default(), false),
            decompress: Decompress::new(false),
            input: Vec::with_capacity(INPUT_CHUNK),
            input_pos: 0,
            input_eof: false,
            output: Vec::new(),
            output_pos: 0,
            dirty: false,
        }
    }

    /// Returns a reference to the wrapped stream.
    pub const fn get_ref(&self) -> &S {
        &self.inner
    }

    fn deflate(&mut self, data: &[u8], flush: FlushCompress) -> io::Result<()> {
        let mut consumed = 0;
        loop {
            self.output.reserve(data.len() - consumed + 64);
            let before_in = self.compress.total_in();
            self.compress
                .compress_vec(&data[consumed..], &mut self.output, flush)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            consumed += usize::try_from(self.compress.total_in() - before_in)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            // Output space left over means the compressor has nothing more.
            if consumed == data.len() && self.output.len() < self.output.capacity() {
                return Ok(());
            }
        }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for DeflateStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        loop {
            let input = &this.input[this.input_pos..];
            let before_in = this.decompress.total_in();
            let before_out = this.decompress.total_out();
            let status = this
                .decompress
                .decompress(input, buf.initialize_unfilled(), FlushDecompress::None)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let consumed = usize::try_from(this.decompress.total_in() - before_in)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let produced = usize::try_from(this.decompress.total_out() - before_out)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            this.input_pos += consumed;
            buf.advance(produced);

            if produced > 0 {
                return Poll::Ready(Ok(()));
            }
            if status == Status::StreamEnd || this.input_eof {
                return Poll::Ready(Ok(()));
            }
            if consumed > 0 && this.input_pos < this.input.len() {
                continue;
            }

            // Need more compressed input.
            this.input.drain(..this.input_pos);
            this.input_pos = 0;
            let start = this.input.len();
            this.input.resize(start + INPUT_CHUNK, 0);
            let mut read_buf = ReadBuf::new(&mut this.input[start..]);
            let polled = Pin::new(&mut this.inner).poll_read(cx, &mut read_buf);
            let filled = read_buf.filled().len();
            this.input.truncate(start + filled);
            ready!(polled)?;
            if filled == 0 {
                this.input_eof = true;
            }
        }
    }
}

impl<S: AsyncWrite + Unpin> DeflateStream<S> {
    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while self.output_pos < self.output.len() {
            let n = ready!(
                Pin::new(&mut self.inner).poll_write(cx, &self.output[self.output_pos..])
            )?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.output_pos += n;
        }
        self.output.clear();
        self.output_pos = 0;
        Poll::Ready(Ok(()))
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for DeflateStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.output.len() - this.output_pos >= INPUT_CHUNK {
            ready!(this.poll_drain(cx))?;
        }
        this.deflate(data, FlushCompress::None)?;
        this.dirty = true;
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.dirty {
            this.deflate(&[], FlushCompress::Sync)?;
            this.dirty = false;
        }
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        ready!(self.as_mut().poll_flush(cx))?;
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
