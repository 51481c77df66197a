//! # Error Types
//!
//! Custom error types for joy-teleop using `thiserror`.

use thiserror::Error;

/// Main error type for joy-teleop
#[derive(Debug, Error)]
pub enum TeleopError {
    /// Raw joystick frame has too few axes or buttons
    #[error("malformed joystick frame: {axes} axes (need 2), {buttons} buttons (need 4)")]
    MalformedFrame { axes: usize, buttons: usize },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding errors on the line transport
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Joystick device errors
    #[error("Controller error: {0}")]
    Controller(String),

    /// No usable joystick device found
    #[error("No joystick device found in /dev/input")]
    ControllerNotFound,
}

impl TeleopError {
    /// Returns true for per-sample errors after which the loop keeps running.
    ///
    /// A malformed or unparseable frame only costs that one sample; the ramp
    /// state is left exactly as it was.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TeleopError::MalformedFrame { .. } | TeleopError::Json(_))
    }
}

/// Result type alias for joy-teleop
pub type Result<T> = std::result::Result<T, TeleopError>;
