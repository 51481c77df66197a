//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every key is optional; an empty file yields the
//! defaults.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, TeleopError};
use crate::teleop::calibration::{Deadzone, MAX_DEADZONE};
use crate::teleop::ramper::{AxisRamp, RampParams};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub ramp: RampConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ramp and speed-limit tuning
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RampConfig {
    #[serde(default = "default_linear_accel")]
    pub linear_accel: f64,

    #[serde(default = "default_linear_decel")]
    pub linear_decel: f64,

    #[serde(default = "default_angular_accel")]
    pub angular_accel: f64,

    #[serde(default = "default_angular_decel")]
    pub angular_decel: f64,

    #[serde(default = "default_speed_step")]
    pub speed_step: f64,

    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    #[serde(default = "default_max_speed_limit")]
    pub max_speed_limit: f64,

    #[serde(default = "default_max_speed")]
    pub default_max_speed: f64,
}

/// Where joystick frames come from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// JSON Lines on standard input
    #[default]
    Stdin,
    /// Linux evdev gamepad
    Evdev,
}

/// Joystick input configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct InputConfig {
    #[serde(default)]
    pub source: InputSource,

    /// evdev device path; empty means auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_deadzone")]
    pub deadzone: f64,

    /// Raw analog axis range override; unset means use the device's absinfo
    #[serde(default)]
    pub axis_min: Option<i32>,

    #[serde(default)]
    pub axis_max: Option<i32>,

    /// Re-send the last evdev frame at this rate while idle; 0 disables
    #[serde(default = "default_autorepeat_hz")]
    pub autorepeat_hz: f64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily log files; empty disables file logging
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_linear_accel() -> f64 { AxisRamp::LINEAR.accel }
fn default_linear_decel() -> f64 { AxisRamp::LINEAR.decel }
fn default_angular_accel() -> f64 { AxisRamp::ANGULAR.accel }
fn default_angular_decel() -> f64 { AxisRamp::ANGULAR.decel }
fn default_speed_step() -> f64 { 0.025 }
fn default_min_speed() -> f64 { 0.05 }
fn default_max_speed_limit() -> f64 { 1.0 }
fn default_max_speed() -> f64 { 0.5 }

fn default_deadzone() -> f64 { 0.05 }
fn default_autorepeat_hz() -> f64 { 20.0 }

fn default_log_level() -> String { "info".to_string() }

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            linear_accel: default_linear_accel(),
            linear_decel: default_linear_decel(),
            angular_accel: default_angular_accel(),
            angular_decel: default_angular_decel(),
            speed_step: default_speed_step(),
            min_speed: default_min_speed(),
            max_speed_limit: default_max_speed_limit(),
            default_max_speed: default_max_speed(),
        }
    }
}

impl RampConfig {
    /// Converts to ramper parameters.
    #[must_use]
    pub fn params(&self) -> RampParams {
        RampParams {
            linear: AxisRamp {
                accel: self.linear_accel,
                decel: self.linear_decel,
            },
            angular: AxisRamp {
                accel: self.angular_accel,
                decel: self.angular_decel,
            },
            speed_step: self.speed_step,
            min_speed: self.min_speed,
            max_speed_limit: self.max_speed_limit,
            default_max_speed: self.default_max_speed,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source: InputSource::default(),
            device_path: String::new(),
            deadzone: default_deadzone(),
            axis_min: None,
            axis_max: None,
            autorepeat_hz: default_autorepeat_hz(),
        }
    }
}

impl InputConfig {
    #[must_use]
    pub fn deadzone(&self) -> Deadzone {
        Deadzone::new(self.deadzone)
    }

    /// Returns the configured axis range override, if both ends are set.
    #[must_use]
    pub fn axis_range(&self) -> Option<(i32, i32)> {
        self.axis_min.zip(self.axis_max)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> TeleopError {
    TeleopError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joy_teleop::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        let ramp = &self.ramp;

        // Validate ramp steps
        for (name, value) in [
            ("linear_accel", ramp.linear_accel),
            ("linear_decel", ramp.linear_decel),
            ("angular_accel", ramp.angular_accel),
            ("angular_decel", ramp.angular_decel),
            ("speed_step", ramp.speed_step),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(invalid(format!("{} must be greater than 0.0 and at most 1.0", name)));
            }
        }

        // Validate speed ceiling range
        if !(ramp.min_speed > 0.0) {
            return Err(invalid("min_speed must be greater than 0.0"));
        }

        if !(ramp.max_speed_limit <= 10.0) {
            return Err(invalid("max_speed_limit must be at most 10.0"));
        }

        if ramp.min_speed > ramp.max_speed_limit {
            return Err(invalid("min_speed must not exceed max_speed_limit"));
        }

        if !(ramp.default_max_speed >= ramp.min_speed && ramp.default_max_speed <= ramp.max_speed_limit) {
            return Err(invalid(
                "default_max_speed must be within speed range (min_speed to max_speed_limit)",
            ));
        }

        // Validate input
        if !(0.0..=MAX_DEADZONE).contains(&self.input.deadzone) {
            return Err(invalid(format!("deadzone must be between 0.0 and {}", MAX_DEADZONE)));
        }

        match (self.input.axis_min, self.input.axis_max) {
            (Some(min), Some(max)) if min >= max => {
                return Err(invalid("axis_min must be less than axis_max"));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(invalid("axis_min and axis_max must be set together"));
            }
            _ => {}
        }

        if !(0.0..=1000.0).contains(&self.input.autorepeat_hz) {
            return Err(invalid("autorepeat_hz must be between 0 and 1000"));
        }

        // Validate logging
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(invalid("log level must be one of: trace, debug, info, warn, error"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ramp.params(), RampParams::default());
    }

    #[test]
    fn test_empty_toml_equals_default() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[ramp]
linear_accel = 0.08
default_max_speed = 0.3

[input]
source = "evdev"
device_path = "/dev/input/event3"
axis_min = -32768
axis_max = 32767

[logging]
level = "debug"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.ramp.linear_accel, 0.08);
        assert_eq!(config.ramp.linear_decel, 0.04);
        assert_eq!(config.ramp.default_max_speed, 0.3);
        assert_eq!(config.input.source, InputSource::Evdev);
        assert_eq!(config.input.device_path, "/dev/input/event3");
        assert_eq!(config.input.axis_range(), Some((-32768, 32767)));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/joy-teleop.toml");
        assert!(matches!(result, Err(TeleopError::Io(_))));
    }

    #[test]
    fn test_unknown_source_rejected() {
        let result = Config::from_toml("[input]\nsource = \"serial\"\n");
        assert!(matches!(result, Err(TeleopError::Config(_))));
    }

    #[test]
    fn test_params_conversion() {
        let mut config = Config::default();
        config.ramp.angular_decel = 0.2;
        config.ramp.max_speed_limit = 2.0;

        let params = config.ramp.params();
        assert_eq!(params.angular.decel, 0.2);
        assert_eq!(params.angular.accel, 0.05);
        assert_eq!(params.max_speed_limit, 2.0);
    }

    #[test]
    fn test_zero_accel() {
        let mut config = Config::default();
        config.ramp.linear_accel = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_decel_too_high() {
        let mut config = Config::default();
        config.ramp.angular_decel = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_step_rejected() {
        let mut config = Config::default();
        config.ramp.speed_step = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_speed_zero() {
        let mut config = Config::default();
        config.ramp.min_speed = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_speed_limit_too_high() {
        let mut config = Config::default();
        config.ramp.max_speed_limit = 11.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_speed_above_limit() {
        let mut config = Config::default();
        config.ramp.min_speed = 0.8;
        config.ramp.max_speed_limit = 0.6;
        config.ramp.default_max_speed = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_max_speed_out_of_range() {
        let mut config = Config::default();
        config.ramp.default_max_speed = 1.5;
        assert!(config.validate().is_err());

        config.ramp.default_max_speed = 0.01;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_range() {
        let mut config = Config::default();
        config.input.deadzone = 0.6;
        assert!(config.validate().is_err());

        config.input.deadzone = 0.0;
        assert!(config.validate().is_ok());
        assert_eq!(config.input.deadzone(), Deadzone::none());
    }

    #[test]
    fn test_axis_range_inverted() {
        let mut config = Config::default();
        config.input.axis_min = Some(255);
        config.input.axis_max = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_axis_range_defaults_to_device() {
        let config = Config::default();
        assert_eq!(config.input.axis_range(), None);
    }

    #[test]
    fn test_axis_range_half_set() {
        let mut config = Config::default();
        config.input.axis_min = Some(0);
        assert!(config.validate().is_err());

        config.input.axis_max = Some(255);
        assert!(config.validate().is_ok());
        assert_eq!(config.input.axis_range(), Some((0, 255)));
    }

    #[test]
    fn test_autorepeat_range() {
        let mut config = Config::default();
        config.input.autorepeat_hz = -1.0;
        assert!(config.validate().is_err());

        config.input.autorepeat_hz = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_log_levels() {
        for level in LOG_LEVELS {
            let mut config = Config::default();
            config.logging.level = level.to_uppercase();
            assert!(config.validate().is_ok(), "Log level {} should be valid", level);
        }
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_linear_accel(), 0.04);
        assert_eq!(default_linear_decel(), 0.04);
        assert_eq!(default_angular_accel(), 0.05);
        assert_eq!(default_angular_decel(), 0.1);
        assert_eq!(default_speed_step(), 0.025);
        assert_eq!(default_min_speed(), 0.05);
        assert_eq!(default_max_speed_limit(), 1.0);
        assert_eq!(default_max_speed(), 0.5);
        assert_eq!(default_deadzone(), 0.05);
        assert_eq!(default_autorepeat_hz(), 20.0);
        assert_eq!(default_log_level(), "info");
    }
}
