//! # Joystick Device Module
//!
//! Reads a gamepad through the Linux evdev interface and turns its events
//! into [`RawFrame`]s laid out the way a ROS `joy` node lays them out.
//!
//! ## Axis Order
//!
//! | Index | evdev Code | Xbox-style pad |
//! |-------|------------|----------------|
//! | 0 | ABS_X | Left stick horizontal |
//! | 1 | ABS_Y | Left stick vertical |
//! | 2 | ABS_Z | Left trigger |
//! | 3 | ABS_RX | Right stick horizontal |
//! | 4 | ABS_RY | Right stick vertical |
//! | 5 | ABS_RZ | Right trigger |
//! | 6 | ABS_HAT0X | D-Pad horizontal |
//! | 7 | ABS_HAT0Y | D-Pad vertical |
//!
//! Analog axes are scaled from their raw range to -1.0..=1.0 and negated, so
//! stick up and stick left read positive. Each axis uses the minimum and
//! maximum the device reports for it, unless `axis_min`/`axis_max` are set in
//! the config, which then apply to every analog axis.
//!
//! ## Button Order
//!
//! | Index | evdev Code | Xbox-style pad |
//! |-------|------------|----------------|
//! | 0 | BTN_SOUTH | A |
//! | 1 | BTN_EAST | B |
//! | 2 | BTN_NORTH | X |
//! | 3 | BTN_WEST | Y |
//! | 4 | BTN_TL | LB |
//! | 5 | BTN_TR | RB |
//! | 6 | BTN_SELECT | Back |
//! | 7 | BTN_START | Start |
//! | 8 | BTN_MODE | Guide |
//! | 9 | BTN_THUMBL | Left stick click |
//! | 10 | BTN_THUMBR | Right stick click |
//!
//! ## Autorepeat
//!
//! evdev only reports changes, so a stick held still produces no events and
//! the ramp would stall. When no event arrives within the autorepeat period
//! the last complete frame is delivered again.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use evdev::{AbsoluteAxisType, Device, EventStream, InputEvent, InputEventKind, Key, Synchronization};
use tracing::{debug, info};

use super::FrameSource;
use crate::config::InputConfig;
use crate::error::{Result, TeleopError};
use crate::teleop::mapper::RawFrame;

/// Axes reported in each frame, in frame order.
pub const AXIS_ORDER: [AbsoluteAxisType; 8] = [
    AbsoluteAxisType::ABS_X,
    AbsoluteAxisType::ABS_Y,
    AbsoluteAxisType::ABS_Z,
    AbsoluteAxisType::ABS_RX,
    AbsoluteAxisType::ABS_RY,
    AbsoluteAxisType::ABS_RZ,
    AbsoluteAxisType::ABS_HAT0X,
    AbsoluteAxisType::ABS_HAT0Y,
];

/// Number of leading [`AXIS_ORDER`] entries that are analog.
pub const ANALOG_AXES: usize = 6;

/// Buttons reported in each frame, in frame order.
pub const BUTTON_ORDER: [Key; 11] = [
    Key::BTN_SOUTH,
    Key::BTN_EAST,
    Key::BTN_NORTH,
    Key::BTN_WEST,
    Key::BTN_TL,
    Key::BTN_TR,
    Key::BTN_SELECT,
    Key::BTN_START,
    Key::BTN_MODE,
    Key::BTN_THUMBL,
    Key::BTN_THUMBR,
];

/// Raw range of one analog axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRange {
    center: f64,
    half_range: f64,
}

impl AxisRange {
    #[must_use]
    pub fn new(min: i32, max: i32) -> Self {
        let min = f64::from(min);
        let max = f64::from(max);
        Self {
            center: (min + max) / 2.0,
            half_range: ((max - min) / 2.0).max(f64::EPSILON),
        }
    }

    // Scales a raw reading to -1.0..=1.0, negated.
}

/// Accumulates evdev events into frames, one frame per `SYN_REPORT`.
#[derive(Debug, Clone)]
pub struct FrameAccumulator {
    ranges: [AxisRange; ANALOG_AXES],
    axes: [f64; AXIS_ORDER.len()],
    buttons: [bool; BUTTON_ORDER.len()],
    reported: bool,
}

impl FrameAccumulator {
    /// Creates an accumulator where every analog axis reports `axis_min..=axis_max`.
    #[must_use]
    pub fn new(axis_min: i32, axis_max: i32) -> Self {
        Self::with_ranges([(axis_min, axis_max); ANALOG_AXES])
    }

    /// Creates an accumulator with a `(min, max)` range per analog axis, in
    /// [`AXIS_ORDER`].
    #[must_use]
    pub fn with_ranges(ranges: [(i32, i32); ANALOG_AXES]) -> Self {
        Self {
            ranges: ranges.map(|(min, max)| AxisRange::new(min, max)),
            axes: [0.0; AXIS_ORDER.len()],
            buttons: [false; BUTTON_ORDER.len()],
            reported: false,
        }
    }

    /// Returns true once at least one complete frame has been reported.
    #[must_use]
    pub fn has_report(&self) -> bool {
        self.reported
    }

    /// Returns the current frame.
    #[must_use]
    pub fn frame(&self) -> RawFrame {
        RawFrame::new(self.axes.to_vec(), self.buttons.to_vec())
    }

    /// Processes one event; returns a frame when the event closes a report.
    pub fn process_event(&mut self, event: &InputEvent) -> Option<RawFrame> {
        match event.kind() {
            InputEventKind::AbsAxis(axis) => {
                self.process_axis_event(axis, event.value());
                None
            }
            InputEventKind::Key(key) => {
                self.process_key_event(key, event.value() != 0);
                None
            }
            InputEventKind::Synchronization(Synchronization::SYN_REPORT) => {
                self.reported = true;
                Some(self.frame())
            }
            _ => None,
        }
    }

    fn process_axis_event(&mut self, axis: AbsoluteAxisType, value: i32) {
        let Some(index) = AXIS_ORDER.iter().position(|&a| a == axis) else {
            // Gyro, accelerometer and other axes
            return;
        };

        self.axes[index] = if index < ANALOG_AXES {
            self.ranges[index].normalize(value)
        } else {
            -f64::from(value).clamp(-1.0, 1.0)
        };
    }

    fn process_key_event(&mut self, key: Key, pressed: bool) {
        if let Some(index) = BUTTON_ORDER.iter().position(|&k| k == key) {
            self.buttons[index] = pressed;
        }
    }
}

/// Gamepad opened through evdev.
pub struct EvdevJoystick {
    events: EventStream,
    device_path: String,
    accumulator: FrameAccumulator,
    autorepeat: Option<Duration>,
}

impl std::fmt::Debug for EvdevJoystick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevJoystick")
            .field("device_path", &self.device_path)
            .field("autorepeat", &self.autorepeat)
            .finish_non_exhaustive()
    }
}

impl EvdevJoystick {
    /// Opens the device named in the config, or the first gamepad found.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: no gamepad in `/dev/input`
    /// - `Controller`: the device could not be opened or streamed
    pub fn open(config: &InputConfig) -> Result<Self> {
        let (device, device_path) = if config.device_path.is_empty() {
            Self::detect()?
        } else {
            let device = Device::open(&config.device_path).map_err(|e| {
                TeleopError::Controller(format!("Failed to open {}: {}", config.device_path, e))
            })?;
            (device, config.device_path.clone())
        };

        info!(
            "Using joystick {} at {}",
            device.name().unwrap_or("(unnamed)"),
            device_path
        );

        let accumulator = match config.axis_range() {
            Some((min, max)) => {
                info!("Using configured axis range {}..={}", min, max);
                FrameAccumulator::new(min, max)
            }
            None => {
                let ranges = Self::device_ranges(&device)?;
                debug!("Axis ranges reported by device: {:?}", ranges);
                FrameAccumulator::with_ranges(ranges)
            }
        };

        let events = device
            .into_event_stream()
            .map_err(|e| TeleopError::Controller(format!("Failed to stream {}: {}", device_path, e)))?;

        let autorepeat = (config.autorepeat_hz > 0.0)
            .then(|| Duration::from_secs_f64(1.0 / config.autorepeat_hz));

        Ok(Self {
            events,
            device_path,
            accumulator,
            autorepeat,
        })
    }

    /// Returns the `/dev/input/eventX` path in use.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    fn detect() -> Result<(Device, String)> {
        let input_dir = Path::new("/dev/input");

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| TeleopError::Controller(format!("Failed to read /dev/input: {}", e)))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .map_or(false, |name| name.to_string_lossy().starts_with("event"))
            })
            .collect();

        // Deterministic choice when several pads are connected
        entries.sort();

        for path in entries {
            match Device::open(&path) {
                Ok(device) => {
                    if Self::is_gamepad(&device) {
                        return Ok((device, path.to_string_lossy().to_string()));
                    }
                    debug!("Skipping non-gamepad device {}", path.display());
                }
                Err(e) => {
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(TeleopError::ControllerNotFound)
    }

    /// Reads the `(minimum, maximum)` absinfo of each analog axis.
    fn device_ranges(device: &Device) -> Result<[(i32, i32); ANALOG_AXES]> {
        let abs = device
            .get_abs_state()
            .map_err(|e| TeleopError::Controller(format!("Failed to read axis ranges: {}", e)))?;

        Ok(std::array::from_fn(|i| {
            let info = &abs[usize::from(AXIS_ORDER[i].0)];
            (info.minimum, info.maximum)
        }))
    }

    fn is_gamepad(device: &Device) -> bool {
        let has_sticks = device.supported_absolute_axes().map_or(false, |axes| {
            axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y)
        });
        let has_buttons = device
            .supported_keys()
            .map_or(false, |keys| keys.contains(Key::BTN_SOUTH));
        has_sticks && has_buttons
    }
}

#[async_trait]
impl FrameSource for EvdevJoystick {
    async fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        loop {
            let event = match self.autorepeat {
                Some(period) if self.accumulator.has_report() => {
                    match tokio::time::timeout(period, self.events.next_event()).await {
                        Ok(event) => event,
                        Err(_) => return Ok(Some(self.accumulator.frame())),
                    }
                }
                _ => self.events.next_event().await,
            }
            .map_err(|e| TeleopError::Controller(format!("Failed to read event: {}", e)))?;

            if let Some(frame) = self.accumulator.process_event(&event) {
                return Ok(Some(frame));
            }
        }
    }
}
