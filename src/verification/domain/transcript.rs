//! Incremental handshake detection over a process's standard output.

use super::envelope::{contains_marker, scan_server_info};
use serde_json::Value;

/// A recognized handshake answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Handshake {
    /// `serverInfo` reported by the server, when it could be extracted.
    pub server_info: Option<Value>,
}

/// Bounded buffer of output lines with marker detection.
///
/// After every chunk the accumulated output is checked, including the line
/// still being written, so an answer without a trailing newline is seen
/// while the process keeps running. Lines too long to ever be scanned are
/// dropped while they stream in, and the retained text never exceeds the
/// output cap.
#[derive(Debug)]
pub struct StdoutTranscript {
    text: String,
    partial: Vec<u8>,
    discarding: bool,
    marker_seen: bool,
    detected: bool,
    max_line_length: usize,
    max_output_bytes: usize,
}

impl StdoutTranscript {
    /// Creates an empty transcript.
    #[must_use]
    pub const fn new(max_line_length: usize, max_output_bytes: usize) -> Self {
        Self {
            text: String::new(),
            partial: Vec::new(),
            discarding: false,
            marker_seen: false,
            detected: false,
            max_line_length,
            max_output_bytes,
        }
    }

    /// Appends a chunk of output.
    ///
    /// Returns the handshake the first time a marker appears in the output;
    /// later calls return `None`.
    pub fn push(&mut self, chunk: &[u8]) -> Option<Handshake> {
        for segment in chunk.split_inclusive(|byte| *byte == b'\n') {
            let (body, terminated) = match segment.split_last() {
                Some((b'\n', body)) => (body, true),
                _ => (segment, false),
            };
            if !self.discarding {
                self.partial.extend_from_slice(body);
                if self.partial.len() > self.line_byte_limit() {
                    self.marker_seen |= contains_marker(&String::from_utf8_lossy(&self.partial));
                    self.partial.clear();
                    self.discarding = true;
                }
            }
            if terminated {
                if self.discarding {
                    self.discarding = false;
                } else {
                    let line = std::mem::take(&mut self.partial);
                    self.accept_line(&line);
                }
            }
        }
        if !self.discarding && !self.partial.is_empty() {
            self.marker_seen |= contains_marker(&String::from_utf8_lossy(&self.partial));
        }
        self.detect()
    }

    /// Closes the stream, considering any trailing partial line.
    pub fn finish(&mut self) -> Option<Handshake> {
        if !self.discarding && !self.partial.is_empty() {
            let line = std::mem::take(&mut self.partial);
            self.accept_line(&line);
        }
        self.detect()
    }

    /// Returns the retained complete lines.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    // Worst case four UTF-8 bytes per character.
    const fn line_byte_limit(&self) -> usize {
        self.max_line_length.saturating_mul(4)
    }

    fn accept_line(&mut self, raw: &[u8]) {
        let decoded = String::from_utf8_lossy(raw);
        let line = decoded.trim_end_matches('\r');
        self.marker_seen |= contains_marker(line);
        if self.text.len().saturating_add(line.len()) < self.max_output_bytes {
            self.text.push_str(line);
            self.text.push('\n');
        }
    }

    fn detect(&mut self) -> Option<Handshake> {
        if self.detected || !self.marker_seen {
            return None;
        }
        self.detected = true;
        let mut scanned = self.text.clone();
        if !self.discarding {
            scanned.push_str(&String::from_utf8_lossy(&self.partial));
        }
        Some(Handshake {
            server_info: scan_server_info(&scanned, self.max_line_length),
        })
    }
}
