use crate::core::ProgressUpdate;
use thiserror::Error;

/// One server-sent event, assembled from its `event:`/`data:` lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed progress payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected event type: {0:?}")]
    UnexpectedEvent(Option<String>),
}

/// Decode the payload of a "progress" frame. Failures are returned, not
/// swallowed, so the caller can drop the frame and keep its last snapshot.
pub fn decode_progress_frame(frame: &SseFrame) -> Result<ProgressUpdate, DecodeError> {
    match frame.event.as_deref() {
        Some("progress") | None => Ok(serde_json::from_str(&frame.data)?),
        _ => Err(DecodeError::UnexpectedEvent(frame.event.clone())),
    }
}

/// Incremental SSE wire parser. Feed raw transport chunks, get completed
/// frames back. Tolerates CRLF line endings, comment lines, multi-line data,
/// and chunk boundaries that split lines (or UTF-8 sequences) mid-way.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let mut line = String::from_utf8_lossy(&line[..line.len() - 1]).into_owned();
            if line.ends_with('\r') {
                line.pop();
            }
            if let Some(frame) = self.push_line(&line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn push_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            // Comment / keep-alive line
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id/retry and unknown fields are ignored; the backend keys
            // streams by task, not by event id.
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        if self.data.is_empty() && self.event.is_none() {
            return None;
        }
        let frame = SseFrame {
            event: self.event.take(),
            data: self.data.join("\n"),
        };
        self.data.clear();
        Some(frame)
    }
}
