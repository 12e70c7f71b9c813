//! Bounded-chunk reading of transcoder output.

use bytes::Bytes;
use futures::Stream;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::process::RunningProcess;
use crate::{Error, Result};

enum ReadOutcome {
    Full,
    Eof,
    Cancelled,
    Failed(std::io::Error),
}

/// Reads a transcoder's output in chunks of a fixed size.
///
/// Every chunk except the last is exactly `chunk_size` bytes. A chunk is only
/// read when the consumer asks for the next one, so a slow client slows the
/// transcoder down through the pipe instead of buffering in memory.
///
/// Dropping the streamer drops the [`RunningProcess`], which terminates the
/// child.
pub struct ChunkedStreamer {
    process: Option<RunningProcess>,
    chunk_size: usize,
    cancel: CancellationToken,
    bytes_read: u64,
    eof: bool,
}

impl ChunkedStreamer {
    /// Wrap a running process. A `chunk_size` of zero is treated as one.
    pub fn new(process: RunningProcess, chunk_size: usize) -> Self {
        let cancel = process.cancel_token();
        Self {
            process: Some(process),
            chunk_size: chunk_size.max(1),
            cancel,
            bytes_read: 0,
            eof: false,
        }
    }

    /// Bytes per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Total bytes handed out so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read the next chunk, or `None` once the stream has ended.
    ///
    /// End of output waits for the transcoder to exit. Cancellation through
    /// the process's token terminates it and ends the stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StreamInterrupted`] if reading fails or the transcoder
    /// exits unsuccessfully.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.eof {
            self.finish().await?;
            return Ok(None);
        }

        let mut buf = vec![0u8; self.chunk_size];
        let mut filled = 0;

        let outcome = {
            let Some(stdout) = self.process.as_mut().and_then(RunningProcess::stdout_mut) else {
                return Ok(None);
            };
            loop {
                if filled == buf.len() {
                    break ReadOutcome::Full;
                }
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => break ReadOutcome::Cancelled,
                    read = stdout.read(&mut buf[filled..]) => match read {
                        Ok(0) => break ReadOutcome::Eof,
                        Ok(n) => filled += n,
                        Err(e) => break ReadOutcome::Failed(e),
                    },
                }
            }
        };

        match outcome {
            ReadOutcome::Full => {}
            ReadOutcome::Eof => self.eof = true,
            ReadOutcome::Cancelled => {
                tracing::debug!("Stream cancelled after {} bytes", self.bytes_read);
                self.abort().await;
                return Ok(None);
            }
            ReadOutcome::Failed(e) => {
                self.abort().await;
                return Err(Error::interrupted(format!("reading transcoder output: {e}")));
            }
        }

        if filled == 0 {
            self.finish().await?;
            return Ok(None);
        }

        buf.truncate(filled);
        self.bytes_read += filled as u64;
        Ok(Some(Bytes::from(buf)))
    }

    /// Turn the streamer into a byte stream for an HTTP body.
    ///
    /// A failure is yielded once as an I/O error, which aborts the response.
    pub fn into_stream(mut self) -> impl Stream<Item = std::io::Result<Bytes>> + Send + 'static {
        async_stream::stream! {
            loop {
                match self.next_chunk().await {
                    Ok(Some(chunk)) => yield Ok(chunk),
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!("Stream ended early after {} bytes: {}", self.bytes_read, e);
                        yield Err(std::io::Error::from(e));
                        break;
                    }
                }
            }
        }
    }

    /// Copy the whole stream into `sink`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// A failing sink cancels the transcoder and returns
    /// [`Error::StreamInterrupted`].
    pub async fn pump<W>(mut self, sink: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        while let Some(chunk) = self.next_chunk().await? {
            if let Err(e) = sink.write_all(&chunk).await {
                self.abort().await;
                return Err(Error::interrupted(format!("output closed: {e}")));
            }
        }
        sink.flush().await?;
        Ok(self.bytes_read)
    }

    async fn finish(&mut self) -> Result<()> {
        match self.process.take() {
            Some(process) => process.finish().await,
            None => Ok(()),
        }
    }

    async fn abort(&mut self) {
        if let Some(process) = self.process.take() {
            // Already logged by the process; the stream ends either way.
            let _ = process.cancel().await;
        }
    }
}
