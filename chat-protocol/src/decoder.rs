//! Incremental NDJSON frame decoder.
//!
//! Network reads do not respect frame boundaries: one read may carry half a
//! frame, several frames, or frames glued together without a newline. The
//! decoder buffers bytes until a line is complete, then parses every JSON
//! value on that line. A malformed value is logged and skipped; the rest of
//! the stream keeps flowing.

use serde_json::Deserializer;
use tracing::warn;

use crate::frame::StreamFrame;

/// Buffers partial lines between reads.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    skipped: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns the frames it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        self.buf.extend_from_slice(chunk);
        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            self.decode_line(&line[..line.len() - 1], &mut frames);
        }
        frames
    }

    /// Decodes whatever is left once the body has ended.
    pub fn finish(&mut self) -> Vec<StreamFrame> {
        let rest = std::mem::take(&mut self.buf);
        let mut frames = Vec::new();
        self.decode_line(&rest, &mut frames);
        frames
    }

    /// Number of fragments dropped as unparsable so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode_line(&mut self, line: &[u8], out: &mut Vec<StreamFrame>) {
        let text = String::from_utf8_lossy(line);
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        for value in Deserializer::from_str(text).into_iter::<StreamFrame>() {
            match value {
                Ok(frame) => out.push(frame),
                Err(e) => {
                    self.skipped += 1;
                    warn!(error = %e, fragment = %text, "skipping unparsable stream fragment");
                    // The deserializer cannot resync inside a broken value.
                    break;
                }
            }
        }
    }
}
