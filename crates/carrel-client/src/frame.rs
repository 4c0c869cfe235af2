//! Line-oriented frame decoding for the streaming response.
//!
//! The chat endpoint streams newline-delimited JSON frames. Network reads
//! arrive in arbitrary chunk boundaries, so partial lines are buffered across
//! chunks and only complete lines are yielded. Bytes are buffered raw and
//! decoded per line, so a multi-byte character split across two reads stays
//! intact. Frames may carry an optional `data:` event marker; blank
//! keep-alive lines are skipped.

/// Incremental decoder for newline-delimited frames.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of bytes, returning every complete frame it finishes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if let Some(frame) = clean_frame(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    /// Flush the trailing partial line at end of stream, if the final frame
    /// was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        clean_frame(&rest)
    }
}

/// Decode and strip framing from one raw line; `None` for blank keep-alives.
fn clean_frame(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\n', '\r']);
    let line = line.strip_prefix("data:").unwrap_or(line).trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
