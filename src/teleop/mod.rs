//! # Teleop Module
//!
//! Joystick-to-velocity core.
//!
//! This module handles:
//! - Mapping raw positional joystick frames to typed state
//! - Deadzone handling for analog sticks
//! - Ramping velocity per axis with direction-reversal protection
//! - Brake, speed ceiling and reset buttons
//! - Driving the map/ramp pipeline from a frame source to a command sink

pub mod calibration;
pub mod mapper;
pub mod node;
pub mod ramper;
