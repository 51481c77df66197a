//! JSON Lines command sink.
//!
//! Writes one `{"linear": .., "angular": ..}` object per line and flushes
//! after every command.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};

use super::CommandSink;
use crate::error::Result;
use crate::teleop::ramper::VelocityCommand;

/// Writes commands as JSON Lines to an async writer.
pub struct JsonlCommandSink<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> JsonlCommandSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonlCommandSink<Stdout> {
    /// Writes commands to standard output.
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W> CommandSink for JsonlCommandSink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn publish(&mut self, cmd: &VelocityCommand) -> Result<()> {
        let mut line = serde_json::to_vec(cmd)?;
        line.push(b'\n');

        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
