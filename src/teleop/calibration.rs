//! # Calibration Module
//!
//! Deadzone handling for normalized stick axes.
//!
//! Analog sticks rarely rest at exactly 0.0. The ramper only coasts and
//! decelerates when an axis reads exactly zero, so stick noise near center
//! has to be snapped to 0.0 before it reaches the ramp. Values outside the
//! deadzone are rescaled to use the full range again.
//!
//! ## Usage
//!
//! ```
//! use joy_teleop::teleop::calibration::Deadzone;
//!
//! let dz = Deadzone::new(0.1);
//!
//! // Input near center (within deadzone)
//! assert_eq!(dz.apply(0.05), 0.0);
//!
//! // Input at full deflection
//! assert!((dz.apply(-1.0) + 1.0).abs() < 1e-9);
//! ```

/// Largest accepted deadzone fraction.
pub const MAX_DEADZONE: f64 = 0.5;

/// Applies a symmetric deadzone to a normalized input.
///
/// Input and output are in the range -1.0 to 1.0, where 0.0 is center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Deadzone {
    /// Deadzone as a fraction (0.0 to 0.5).
    threshold: f64,
}

impl Deadzone {
    /// Creates a new deadzone. Values outside 0.0..=0.5 are clamped.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() {
            threshold.clamp(0.0, MAX_DEADZONE)
        } else {
            0.0
        };
        Self { threshold }
    }

    /// A deadzone that passes every value through unchanged.
    #[must_use]
    pub fn none() -> Self {
        Self { threshold: 0.0 }
    }

    /// Returns the configured threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Applies the deadzone to a normalized input.
    ///
    /// # Examples
    ///
    /// ```
    /// use joy_teleop::teleop::calibration::Deadzone;
    ///
    /// let dz = Deadzone::new(0.2);
    /// assert_eq!(dz.apply(-0.2), 0.0);
    /// assert!((dz.apply(0.6) - 0.5).abs() < 1e-9);
    /// ```
    #[must_use]
    pub fn apply(&self, input: f64) -> f64 {
        if self.threshold == 0.0 {
            return input;
        }

        let abs_input = input.abs();
        if abs_input <= self.threshold {
            0.0
        } else {
            // Scale remaining range to 0..1
            input.signum() * (abs_input - self.threshold) / (1.0 - self.threshold)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadzone_default_is_passthrough() {
        let dz = Deadzone::default();
        assert_eq!(dz, Deadzone::none());
        assert_eq!(dz.apply(0.001), 0.001);
        assert_eq!(dz.apply(-0.3), -0.3);
    }

    #[test]
    fn test_deadzone_clamps_threshold() {
        assert_eq!(Deadzone::new(0.9).threshold(), MAX_DEADZONE);
        assert_eq!(Deadzone::new(-0.1).threshold(), 0.0);
        assert_eq!(Deadzone::new(f64::NAN).threshold(), 0.0);
    }

    #[test]
    fn test_deadzone_within_zone() {
        let dz = Deadzone::new(0.1);
        assert_eq!(dz.apply(0.0), 0.0);
        assert_eq!(dz.apply(0.1), 0.0);
        assert_eq!(dz.apply(-0.09), 0.0);
    }

    #[test]
    fn test_deadzone_outside_zone_keeps_sign() {
        let dz = Deadzone::new(0.1);
        assert!(dz.apply(0.2) > 0.0);
        assert!(dz.apply(-0.2) < 0.0);
    }

    #[test]
    fn test_deadzone_preserves_endpoints() {
        let dz = Deadzone::new(0.25);
        assert!((dz.apply(1.0) - 1.0).abs() < 1e-9);
        assert!((dz.apply(-1.0) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_deadzone_scaling() {
        let dz = Deadzone::new(0.5);
        // Halfway through the live range
        assert!((dz.apply(0.75) - 0.5).abs() < 1e-9);
    }
}
