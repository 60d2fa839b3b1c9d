//! Ticker settings
//!
//! Tuning knobs for the rollback engine. Settings are plain serde data so they
//! can live in the game's RON config next to the rest of its definitions:
//!
//! ```ron
//! (
//!     max_delta_time: 0.05,
//!     max_seek_iterations: 20,
//!     history_length: 2.0,
//! )
//! ```
//!
//! Missing fields fall back to their defaults.

use crate::Result;
use retick_core::{Error as CoreError, Seconds};
use serde::{Deserialize, Serialize};

/// Configuration for a `Ticker`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TickerSettings {
    /// Longest single extrapolation step
    ///
    /// Only bounds extrapolation and partial steps. A complete recorded input
    /// interval is always ticked in one step, however long: a 2.5s gap
    /// between received inputs becomes a single 2.5s tick. Every peer then
    /// ticks exactly the same intervals.
    pub max_delta_time: Seconds,

    /// Maximum number of loop iterations in one seek
    ///
    /// Bounds the cost of a seek against corrupted timestamps or clock skew.
    /// When exhausted, playback still jumps to the target time.
    pub max_seek_iterations: u32,

    /// Maximum number of inputs recorded per second
    ///
    /// `0` (or any non-positive value) disables rate limiting.
    pub max_input_rate: f64,

    /// How much history is kept behind the playback time
    pub history_length: Seconds,

    /// Reconcile on every rewind, even when the prediction matched
    pub always_reconcile: bool,

    /// Log a field-level diff whenever a prediction is corrected
    pub debug_log_reconciles: bool,
}

impl TickerSettings {
    /// Parse settings from a RON string and validate them
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let settings: TickerSettings = ron::from_str(source)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Render these settings as pretty RON
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| crate::Error::Serialization(e.to_string()))
    }

    /// Check that every value is usable
    pub fn validate(&self) -> retick_core::Result<()> {
        if !(self.max_delta_time.is_finite() && self.max_delta_time > 0.0) {
            return Err(CoreError::invalid_setting(
                "max_delta_time",
                format!("{} is not a positive duration", self.max_delta_time),
            ));
        }
        if self.max_seek_iterations == 0 {
            return Err(CoreError::invalid_setting(
                "max_seek_iterations",
                "a seek needs at least one iteration",
            ));
        }
        if !self.max_input_rate.is_finite() {
            return Err(CoreError::invalid_setting(
                "max_input_rate",
                format!("{} is not finite", self.max_input_rate),
            ));
        }
        if !(self.history_length.is_finite() && self.history_length >= 0.0) {
            return Err(CoreError::invalid_setting(
                "history_length",
                format!("{} is not a non-negative duration", self.history_length),
            ));
        }
        Ok(())
    }

    /// Minimum spacing between recorded inputs, if rate limiting is enabled
    pub fn min_input_interval(&self) -> Option<Seconds> {
        (self.max_input_rate > 0.0).then(|| 1.0 / self.max_input_rate)
    }
}

impl Default for TickerSettings {
    fn default() -> Self {
        Self {
            max_delta_time: 1.0 / 30.0,
            max_seek_iterations: 15,
            max_input_rate: 0.0,
            history_length: 1.0,
            always_reconcile: false,
            debug_log_reconciles: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_default_is_valid() {
        let settings = TickerSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.min_input_interval(), None);
    }

    #[test]
    fn test_min_input_interval() {
        let settings = TickerSettings {
            max_input_rate: 20.0,
            ..Default::default()
        };
        assert_eq!(settings.min_input_interval(), Some(0.05));
    }

    #[test]
    fn test_from_ron_partial() {
        let settings = TickerSettings::from_ron_str(
            "(max_seek_iterations: 40, always_reconcile: true, history_length: 2.5)",
        )
        .unwrap();

        assert_eq!(settings.max_seek_iterations, 40);
        assert!(settings.always_reconcile);
        assert_eq!(settings.history_length, 2.5);
        assert_eq!(settings.max_delta_time, TickerSettings::default().max_delta_time);
    }

    #[test]
    fn test_from_ron_rejects_invalid_values() {
        let err = TickerSettings::from_ron_str("(max_delta_time: -1.0)").unwrap_err();
        assert!(matches!(
            err,
            Error::Core(retick_core::Error::InvalidSetting {
                name: "max_delta_time",
                ..
            })
        ));

        let err = TickerSettings::from_ron_str("(max_seek_iterations: 0)").unwrap_err();
        assert!(matches!(err, Error::Core(_)));
    }

    #[test]
    fn test_from_ron_parse_error() {
        let err = TickerSettings::from_ron_str("(max_delta_time: \"fast\")").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_ron_string_parses_back() {
        let settings = TickerSettings {
            max_input_rate: 30.0,
            debug_log_reconciles: true,
            ..Default::default()
        };
        let text = settings.to_ron_string().unwrap();
        assert_eq!(TickerSettings::from_ron_str(&text).unwrap(), settings);
    }
}
