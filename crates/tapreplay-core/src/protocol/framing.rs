//! Newline framing for the raw event byte stream.
//!
//! Reads from a child process's stdout arrive in arbitrary chunks: a single
//! `getevent` line may be split across two reads, and a multi-byte UTF-8
//! character may be split as well.  [`LineFramer`] buffers raw bytes and only
//! decodes a line once its terminating `\n` has arrived, so the sequence of
//! produced lines is identical no matter where the chunk boundaries fall.

use tracing::warn;

/// Longest line kept, in bytes, excluding the `\n`.  Anything longer is
/// dropped up to its newline and produced as an empty line.
pub const MAX_LINE_LEN: usize = 4096;

/// Splits a byte stream into complete lines, carrying partial lines across pushes.
#[derive(Debug, Default)]
pub struct LineFramer {
    pending: Vec<u8>,
    overlong: bool,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every line it completed, in order.
    ///
    /// The trailing `\n` (and a preceding `\r`, if any) is stripped.  Invalid
    /// UTF-8 is replaced with U+FFFD rather than rejected.  A line longer
    /// than [`MAX_LINE_LEN`] comes out empty.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        let mut rest = chunk;

        while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
            self.append(&rest[..pos]);
            lines.push(self.take_line());
            rest = &rest[pos + 1..];
        }

        self.append(rest);
        lines
    }

    /// Returns the unterminated remainder at end of stream, if it holds anything.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() && !self.overlong {
            return None;
        }
        Some(self.take_line())
    }

    /// Number of buffered bytes not yet terminated by a newline.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl LineFramer {
    fn append(&mut self, bytes: &[u8]) {
        if self.overlong {
            return;
        }
        if self.pending.len() + bytes.len() > MAX_LINE_LEN {
            warn!(limit = MAX_LINE_LEN, "line too long, discarding up to the next newline");
            self.pending.clear();
            self.overlong = true;
            return;
        }
        self.pending.extend_from_slice(bytes);
    }

    fn take_line(&mut self) -> String {
        let line = if self.overlong {
            String::new()
        } else {
            decode_line(&self.pending)
        };
        self.pending.clear();
        self.overlong = false;
        line
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
