//! Background reader for one streamed response.
//!
//! A spawned task owns the byte stream, decodes it and writes to two bounded
//! channels: decoded chunks, and at most one transport error. The consumer
//! prefers chunks and, once an error is seen, hands out every chunk that was
//! buffered before it, so no decoded data is lost to a late failure.

use edgee_core::error::TransportError;
use edgee_core::provider::{ByteStream, StreamChunk};
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::sse::ChunkDecoder;

/// Consumer side of a streamed response. Dropping it aborts the reader task.
pub struct ChunkReader {
    chunks: mpsc::Receiver<StreamChunk>,
    errors: mpsc::Receiver<TransportError>,
    errors_closed: bool,
    pending_error: Option<TransportError>,
    task: JoinHandle<()>,
}

impl ChunkReader {
    /// Spawn the reader task. `capacity` bounds the chunk channel.
    pub fn spawn(stream: ByteStream, capacity: usize) -> Self {
        let (chunk_tx, chunks) = mpsc::channel(capacity.max(1));
        let (error_tx, errors) = mpsc::channel(1);
        let task = tokio::spawn(read_stream(stream, chunk_tx, error_tx));

        Self {
            chunks,
            errors,
            errors_closed: false,
            pending_error: None,
            task,
        }
    }

    /// The next chunk, the stream's error after all buffered chunks, or
    /// `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<StreamChunk, TransportError>> {
        loop {
            if self.pending_error.is_some() {
                return match self.chunks.try_recv() {
                    Ok(chunk) => Some(Ok(chunk)),
                    Err(_) => self.pending_error.take().map(Err),
                };
            }

            tokio::select! {
                biased;

                chunk = self.chunks.recv() => {
                    return match chunk {
                        Some(chunk) => Some(Ok(chunk)),
                        // The task sends its error before releasing the chunk sender.
                        None => self.errors.try_recv().ok().map(Err),
                    };
                }
                error = self.errors.recv(), if !self.errors_closed => match error {
                    Some(error) => self.pending_error = Some(error),
                    None => self.errors_closed = true,
                },
            }
        }
    }
}

impl Drop for ChunkReader {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn read_stream(
    mut stream: ByteStream,
    chunks: mpsc::Sender<StreamChunk>,
    errors: mpsc::Sender<TransportError>,
) {
    let mut decoder = ChunkDecoder::new();

    while let Some(item) = stream.next().await {
        let bytes = match item {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(error = %e, "Stream read failed");
                let _ = errors.send(e).await;
                return;
            }
        };

        for chunk in decoder.push(&bytes) {
            if chunks.send(chunk).await.is_err() {
                debug!("Chunk receiver dropped, abandoning stream");
                return;
            }
        }

        if decoder.is_done() {
            break;
        }
    }

    if let Some(chunk) = decoder.finish() {
        let _ = chunks.send(chunk).await;
    }

    if decoder.skipped() > 0 {
        debug!(skipped = decoder.skipped(), "Skipped malformed stream payloads");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn body(parts: Vec<Result<&'static str, TransportError>>) -> ByteStream {
        stream::iter(parts.into_iter().map(|p| p.map(|s| s.as_bytes().to_vec()))).boxed()
    }

    const HELLO: &str = "data: {\"choices\":[{\"delta\":{\"content\":\"Hello\"}}]}\n\n";
    const WORLD: &str = "data: {\"choices\":[{\"delta\":{\"content\":\" world\"}}]}\n\n";

    #[tokio::test]
    async fn yields_chunks_until_done() {
        let mut reader = ChunkReader::spawn(body(vec![Ok(HELLO), Ok(WORLD), Ok("data: [DONE]\n\n")]), 10);

        let mut text = String::new();
        while let Some(item) = reader.next().await {
            text.push_str(item.unwrap().text());
        }
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn buffered_chunks_are_drained_before_error() {
        let mut reader = ChunkReader::spawn(
            body(vec![
                Ok(HELLO),
                Ok(WORLD),
                Err(TransportError::StreamInterrupted("connection reset".into())),
            ]),
            10,
        );

        assert_eq!(reader.next().await.unwrap().unwrap().text(), "Hello");
        assert_eq!(reader.next().await.unwrap().unwrap().text(), " world");
        let err = reader.next().await.unwrap().unwrap_err();
        assert!(matches!(err, TransportError::StreamInterrupted(_)));
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn connection_close_without_done_ends_stream() {
        let mut reader = ChunkReader::spawn(body(vec![Ok(HELLO)]), 1);
        assert_eq!(reader.next().await.unwrap().unwrap().text(), "Hello");
        assert!(reader.next().await.is_none());
    }

    #[tokio::test]
    async fn dropping_reader_aborts_task() {
        let (alive_tx, alive_rx) = tokio::sync::oneshot::channel::<()>();
        let parts: ByteStream = stream::iter((0..50).map(|_| Ok(HELLO.as_bytes().to_vec())))
            .chain(stream::pending())
            .map(move |item| {
                let _alive = &alive_tx;
                item
            })
            .boxed();

        let reader = ChunkReader::spawn(parts, 1);
        drop(reader);

        let closed = tokio::time::timeout(std::time::Duration::from_secs(1), alive_rx)
            .await
            .expect("reader task should be aborted");
        assert!(closed.is_err());
    }
}
