//! Closable pipe endpoints
//!
//! `InputPipe` owns the write end of a child's stdin, `OutputPipe` owns the
//! buffered read end of its stdout or stderr. Each endpoint can be closed
//! exactly once; after that every operation fails with
//! [`Error::StreamClosed`] instead of touching the OS handle.

use async_process::{ChildStderr, ChildStdin, ChildStdout};
use futures_lite::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use std::io;
use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::process::Stream;

/// Write end of a child's stdin
pub struct InputPipe<W = ChildStdin> {
    inner: Option<W>,
}

impl<W: AsyncWrite + Unpin> InputPipe<W> {
    /// Wrap an open writer
    pub fn new(writer: W) -> Self {
        Self {
            inner: Some(writer),
        }
    }

    /// Whether the pipe has not been closed yet
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Borrow the underlying writer while the pipe is open
    pub fn get_ref(&self) -> Option<&W> {
        self.inner.as_ref()
    }

    fn writer(&mut self) -> Result<&mut W> {
        self.inner
            .as_mut()
            .ok_or_else(|| Error::stream_closed(Stream::Stdin))
    }

    /// Write once, returning how many bytes the pipe accepted
    ///
    /// A short count is not an error; the caller retries the remainder.
    pub async fn write(&mut self, data: &[u8]) -> Result<usize> {
        let writer = self.writer()?;
        let written = writer.write(data).await?;
        writer.flush().await?;
        trace!(requested = data.len(), written, "wrote to stdin");
        Ok(written)
    }

    /// Write every byte, retrying short writes
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let writer = self.writer()?;
        writer.write_all(data).await?;
        writer.flush().await?;
        trace!(written = data.len(), "wrote all to stdin");
        Ok(())
    }

    /// Flush and close the writer
    ///
    /// Returns false if the pipe was already closed. A failing flush is
    /// logged; the descriptor is released either way.
    pub async fn close(&mut self) -> bool {
        match self.inner.take() {
            Some(mut writer) => {
                if let Err(e) = writer.close().await {
                    warn!(error = %e, "error while closing stdin");
                }
                true
            }
            None => false,
        }
    }
}

/// Buffered read end of a child's stdout or stderr
pub struct OutputPipe<R> {
    stream: Stream,
    inner: Option<BufReader<R>>,
}

/// Read end of the child's stdout
pub type StdoutPipe = OutputPipe<ChildStdout>;

/// Read end of the child's stderr
pub type StderrPipe = OutputPipe<ChildStderr>;

impl<R: AsyncRead + Unpin> OutputPipe<R> {
    /// Wrap an open reader; `stream` names it in errors and logs
    pub fn new(stream: Stream, reader: R) -> Self {
        Self {
            stream,
            inner: Some(BufReader::new(reader)),
        }
    }

    /// Which stream this pipe reads
    pub fn stream(&self) -> Stream {
        self.stream
    }

    /// Whether the pipe has not been closed yet
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Borrow the underlying reader while the pipe is open
    ///
    /// Bytes already pulled into the buffer are not visible through it.
    pub fn get_ref(&self) -> Option<&R> {
        self.inner.as_ref().map(BufReader::get_ref)
    }

    fn reader(&mut self) -> Result<&mut BufReader<R>> {
        let stream = self.stream;
        self.inner
            .as_mut()
            .ok_or_else(|| Error::stream_closed(stream))
    }

    /// Read at most `max` bytes; empty once the stream has ended
    ///
    /// Returns whatever is buffered or arrives with the next read, never
    /// more than one buffer's worth. A `max` of zero is rejected with
    /// `InvalidInput` so an empty result always means end of stream.
    pub async fn read(&mut self, max: usize) -> Result<Vec<u8>> {
        if max == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "read length must be greater than zero",
            )
            .into());
        }

        let stream = self.stream;
        let reader = self.reader()?;
        let available = reader.fill_buf().await?;
        let n = max.min(available.len());
        let buf = available[..n].to_vec();
        reader.consume(n);
        trace!(%stream, requested = max, read = n, "read");
        Ok(buf)
    }

    /// Read through the next `\n`, or whatever is left at end of stream
    pub async fn read_line(&mut self) -> Result<Vec<u8>> {
        let stream = self.stream;
        let reader = self.reader()?;
        let mut buf = Vec::new();
        reader.read_until(b'\n', &mut buf).await?;
        trace!(%stream, read = buf.len(), "read line");
        Ok(buf)
    }

    /// Read until the writer closes its end
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let stream = self.stream;
        let reader = self.reader()?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        trace!(%stream, read = buf.len(), "read to end");
        Ok(buf)
    }

    /// Drop the reader, closing the descriptor
    ///
    /// Returns false if the pipe was already closed. Buffered bytes that
    /// were never read are discarded.
    pub fn close(&mut self) -> bool {
        self.inner.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::future::block_on;
    use futures_lite::io::Cursor;

    fn output(data: &[u8]) -> OutputPipe<Cursor<Vec<u8>>> {
        OutputPipe::new(Stream::Stdout, Cursor::new(data.to_vec()))
    }

    #[test]
    fn test_read_line_then_read() {
        block_on(async {
            let mut pipe = output(b"line1\nline2");
            assert_eq!(pipe.read_line().await.unwrap(), b"line1\n");
            assert_eq!(pipe.read(5).await.unwrap(), b"line2");
            assert!(pipe.read(5).await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_read_line_partial_at_end() {
        block_on(async {
            let mut pipe = output(b"no newline");
            assert_eq!(pipe.read_line().await.unwrap(), b"no newline");
            assert!(pipe.read_line().await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_read_to_end_after_partial_read() {
        block_on(async {
            let mut pipe = output(b"foobar\n");
            assert_eq!(pipe.read(3).await.unwrap(), b"foo");
            assert_eq!(pipe.read_to_end().await.unwrap(), b"bar\n");
        });
    }

    #[test]
    fn test_read_bound_larger_than_data() {
        block_on(async {
            let mut pipe = output(b"foo\n");
            assert_eq!(pipe.read(usize::MAX).await.unwrap(), b"foo\n");
            assert!(pipe.read(1 << 40).await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_read_zero_is_rejected() {
        block_on(async {
            let mut pipe = output(b"foo\n");
            match pipe.read(0).await {
                Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidInput),
                other => panic!("expected InvalidInput, got {:?}", other),
            }
            // Nothing was consumed
            assert_eq!(pipe.read(4).await.unwrap(), b"foo\n");
        });
    }

    #[test]
    fn test_output_close_is_idempotent() {
        block_on(async {
            let mut pipe = OutputPipe::new(Stream::Stderr, Cursor::new(b"x".to_vec()));
            assert!(pipe.close());
            assert!(!pipe.close());
            assert!(!pipe.is_open());
            assert!(pipe.get_ref().is_none());

            match pipe.read_line().await {
                Err(Error::StreamClosed { stream }) => assert_eq!(stream, Stream::Stderr),
                other => panic!("expected StreamClosed, got {:?}", other),
            }
        });
    }

    #[test]
    fn test_input_write_and_close() {
        block_on(async {
            let mut pipe = InputPipe::new(Cursor::new(Vec::new()));
            assert_eq!(pipe.write(b"foo").await.unwrap(), 3);
            pipe.write_all(b"bar").await.unwrap();
            assert_eq!(pipe.get_ref().unwrap().get_ref(), b"foobar");

            assert!(pipe.close().await);
            assert!(!pipe.close().await);

            match pipe.write(b"x").await {
                Err(Error::StreamClosed { stream }) => assert_eq!(stream, Stream::Stdin),
                other => panic!("expected StreamClosed, got {:?}", other),
            }
        });
    }
}
