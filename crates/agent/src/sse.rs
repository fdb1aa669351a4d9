//! Server-sent-event framing for streamed completions.
//!
//! The wire carries one JSON chunk per `data:` line and ends with
//! `data: [DONE]`. Everything else (comments, `event:`, `id:`, blank
//! separators) is ignored. Bytes are buffered until a full line is
//! available, so multi-byte characters split across reads survive.

use edgee_core::provider::StreamChunk;
use tracing::{debug, trace};

const DATA_PREFIX: &[u8] = b"data:";
const DONE_MARKER: &str = "[DONE]";

/// One framed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// The payload of a `data:` line
    Data(String),
    /// The `[DONE]` sentinel
    Done,
}

/// Incremental line framer.
#[derive(Debug, Default)]
pub struct FrameParser {
    buf: Vec<u8>,
    done: bool,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `[DONE]` has been seen. Nothing is yielded afterwards.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed bytes and return every frame completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Frame> {
        if self.done {
            return Vec::new();
        }
        self.buf.extend_from_slice(bytes);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(frame) = self.line(&line[..line.len() - 1]) {
                frames.push(frame);
                if self.done {
                    self.buf.clear();
                    break;
                }
            }
        }
        frames
    }

    /// Flush a trailing line that had no final newline.
    pub fn finish(&mut self) -> Option<Frame> {
        if self.done || self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        self.line(&line)
    }

    fn line(&mut self, line: &[u8]) -> Option<Frame> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let payload = line.strip_prefix(DATA_PREFIX)?;
        let payload = String::from_utf8_lossy(payload);
        let payload = payload.trim();
        if payload.is_empty() {
            return None;
        }
        if payload == DONE_MARKER {
            self.done = true;
            return Some(Frame::Done);
        }
        Some(Frame::Data(payload.to_string()))
    }
}

/// Frames bytes and decodes each payload into a [`StreamChunk`].
///
/// Payloads that fail to decode are skipped and counted.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    parser: FrameParser,
    skipped: usize,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.parser.is_done()
    }

    /// Number of malformed payloads skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn push(&mut self, bytes: &[u8]) -> Vec<StreamChunk> {
        let frames = self.parser.push(bytes);
        frames.into_iter().filter_map(|f| self.decode(f)).collect()
    }

    pub fn finish(&mut self) -> Option<StreamChunk> {
        let frame = self.parser.finish()?;
        self.decode(frame)
    }

    fn decode(&mut self, frame: Frame) -> Option<StreamChunk> {
        let Frame::Data(payload) = frame else {
            return None;
        };
        trace!(payload = %payload, "SSE payload");
        match serde_json::from_str(&payload) {
            Ok(chunk) => Some(chunk),
            Err(e) => {
                self.skipped += 1;
                debug!(error = %e, "Ignoring unparseable SSE chunk");
                None
            }
        }
    }
}
