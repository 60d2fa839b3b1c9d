//! Time system for continuous-time rollback
//!
//! Provides simulation time helpers shared by histories and tickers:
//! - `Seconds` - Continuous simulation time
//! - `TIME_TOLERANCE` - Bucket width used when matching recorded timestamps
//! - `FixedStepClock` - Accumulator that turns frame deltas into fixed steps

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Continuous simulation time, in seconds
pub type Seconds = f64;

/// Two timestamps closer than this are considered the same moment.
///
/// Recorded input times are produced by a fixed-step clock, so any two
/// distinct samples are orders of magnitude further apart than this.
pub const TIME_TOLERANCE: Seconds = 1e-4;

/// Check whether two timestamps fall in the same tolerance bucket
pub fn same_time(a: Seconds, b: Seconds, tolerance: Seconds) -> bool {
    (a - b).abs() <= tolerance
}

/// Reject NaN and infinite timestamps
pub fn ensure_finite(time: Seconds) -> Result<Seconds> {
    if time.is_finite() {
        Ok(time)
    } else {
        Err(Error::NonFiniteTime(time))
    }
}

/// Fixed-step simulation clock
///
/// Accumulates variable frame deltas and releases them as whole fixed steps,
/// producing the non-decreasing target times a ticker is driven with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedStepClock {
    /// Length of one fixed step
    step: Seconds,
    /// Frame time not yet consumed by a step
    accumulator: Seconds,
    /// Number of steps taken since creation
    steps: u64,
}

impl FixedStepClock {
    /// Create a clock stepping at `rate` steps per second
    pub fn with_rate(rate: f64) -> Result<Self> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(Error::invalid_setting("rate", format!("{rate} is not a positive rate")));
        }
        Ok(Self {
            step: 1.0 / rate,
            accumulator: 0.0,
            steps: 0,
        })
    }

    /// Feed a frame delta and return how many fixed steps became due
    pub fn advance(&mut self, frame_delta: Seconds) -> u32 {
        self.accumulator += frame_delta.max(0.0);
        let mut due = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            self.steps += 1;
            due += 1;
        }
        due
    }

    /// Current simulation time
    ///
    /// Computed from the step count rather than by repeated addition so that
    /// two clocks with the same step count agree exactly.
    pub fn time(&self) -> Seconds {
        self.steps as f64 * self.step
    }

    /// Length of one fixed step
    pub fn step(&self) -> Seconds {
        self.step
    }

    /// Number of steps taken
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Fraction of the next step already accumulated, in `[0, 1)`
    pub fn overstep_fraction(&self) -> f64 {
        self.accumulator / self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_same_time() {
        assert!(same_time(1.0, 1.00005, TIME_TOLERANCE));
        assert!(!same_time(1.0, 1.001, TIME_TOLERANCE));
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite(2.5), Ok(2.5));
        assert!(ensure_finite(f64::NAN).is_err());
        assert!(ensure_finite(f64::INFINITY).is_err());
    }

    #[test]
    fn test_fixed_step_clock() {
        let mut clock = FixedStepClock::with_rate(50.0).unwrap();
        assert_eq!(clock.advance(0.01), 0);
        assert_eq!(clock.advance(0.015), 1);
        assert_eq!(clock.steps(), 1);
        assert_relative_eq!(clock.time(), 0.02);
        assert_relative_eq!(clock.overstep_fraction(), 0.25, epsilon = 1e-9);

        assert_eq!(clock.advance(0.1), 5);
        assert_eq!(clock.steps(), 6);
    }

    #[test]
    fn test_fixed_step_clock_rejects_bad_rate() {
        assert!(FixedStepClock::with_rate(0.0).is_err());
        assert!(FixedStepClock::with_rate(f64::NAN).is_err());
    }
}
