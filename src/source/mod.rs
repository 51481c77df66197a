//! # Frame Source Module
//!
//! Delivers raw joystick frames to the teleop loop.
//!
//! This module handles:
//! - The [`FrameSource`] abstraction the loop reads from
//! - JSON Lines frames from any async reader (stdin by default)
//! - Linux evdev gamepads, with autorepeat for held sticks

use async_trait::async_trait;

use crate::error::Result;
use crate::teleop::mapper::RawFrame;

pub mod joystick;
pub mod jsonl;

/// Trait for anything that yields raw joystick frames
#[async_trait]
pub trait FrameSource: Send {
    /// Waits for the next frame.
    ///
    /// Returns `Ok(None)` once the input is exhausted. Per-frame problems
    /// (see [`TeleopError::is_recoverable`](crate::error::TeleopError::is_recoverable))
    /// leave the source usable.
    async fn next_frame(&mut self) -> Result<Option<RawFrame>>;
}
