//! JSON Lines frame source.
//!
//! Each non-blank line is one frame:
//!
//! ```text
//! {"axes": [0.0, 1.0], "buttons": [0, 0, 0, 1]}
//! ```
//!
//! Lines are read as raw bytes, so a line that is not valid UTF-8 is just
//! another unparseable frame rather than a broken stream.

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tracing::debug;

use super::FrameSource;
use crate::error::Result;
use crate::teleop::mapper::RawFrame;

/// Reads one [`RawFrame`] per line from an async reader.
pub struct JsonlFrameSource<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: u64,
}

impl<R: AsyncBufRead + Unpin> JsonlFrameSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
        }
    }
}

impl JsonlFrameSource<BufReader<Stdin>> {
    /// Reads frames from standard input.
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R> FrameSource for JsonlFrameSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            self.line_no += 1;

            let line = trim_line(&self.buf);
            if line.is_empty() {
                continue;
            }

            debug!("Frame line {}: {}", self.line_no, String::from_utf8_lossy(line));
            return Ok(Some(serde_json::from_slice(line)?));
        }
    }
}

/// Strips leading and trailing ASCII whitespace, including the newline.
fn trim_line(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
