//! # Command Sink Module
//!
//! Hands velocity commands to whatever drives the robot base.

use async_trait::async_trait;

use crate::error::Result;
use crate::teleop::ramper::VelocityCommand;

pub mod jsonl;

/// Trait for consumers of velocity commands
#[async_trait]
pub trait CommandSink: Send {
    /// Publishes one command.
    async fn publish(&mut self, cmd: &VelocityCommand) -> Result<()>;
}
