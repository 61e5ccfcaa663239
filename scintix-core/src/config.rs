//! Response configuration shared by the accumulator, reducer and classifier.

use crate::classification::AntiCoincidenceRule;
use crate::error::{Error, Result};
use crate::units::{KEV, MICROSECOND};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "serde")]
use std::{fs::File, io::BufReader, path::Path};

/// Default coincidence gate width.
pub const DEFAULT_TIME_WINDOW: f64 = 1.0 * MICROSECOND;

/// Default energy threshold for both volumes.
pub const DEFAULT_THRESHOLD: f64 = 10.0 * KEV;

/// Configuration of the per-event response.
///
/// All quantities are in internal units (see [`crate::units`]).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResponseConfig {
    /// Width of the acceptance window around the first deposit.
    pub time_window: f64,
    /// Coincidence threshold in the target.
    pub threshold1: f64,
    /// Coincidence threshold in the detector.
    pub threshold2: f64,
    /// Minimum photon count for a photon detector to count as fired.
    pub pmt_threshold: u32,
    /// Request a seed save for events with at most this many detected photons.
    pub save_threshold: Option<u64>,
    /// Comparison used for the second anti-coincidence.
    pub anti_coincidence_rule: AntiCoincidenceRule,
    /// Per-event report level; 0 silences it.
    pub verbose: u8,
    /// Force drawing of optical-photon trajectories.
    pub force_draw_photons: bool,
    /// Suppress drawing of optical-photon trajectories.
    pub force_no_draw_photons: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            time_window: DEFAULT_TIME_WINDOW,
            threshold1: DEFAULT_THRESHOLD,
            threshold2: DEFAULT_THRESHOLD,
            pmt_threshold: 1,
            save_threshold: None,
            anti_coincidence_rule: AntiCoincidenceRule::default(),
            verbose: 1,
            force_draw_photons: false,
            force_no_draw_photons: false,
        }
    }
}

impl ResponseConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the acceptance window.
    #[must_use]
    pub fn with_time_window(mut self, window: f64) -> Self {
        self.time_window = window;
        self
    }

    /// Sets both coincidence thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, threshold1: f64, threshold2: f64) -> Self {
        self.threshold1 = threshold1;
        self.threshold2 = threshold2;
        self
    }

    /// Sets the photon-detector activation threshold.
    #[must_use]
    pub fn with_pmt_threshold(mut self, threshold: u32) -> Self {
        self.pmt_threshold = threshold;
        self
    }

    /// Enables seed-save requests for low-light events.
    ///
    /// A threshold of zero disables them.
    #[must_use]
    pub fn with_save_threshold(mut self, threshold: u64) -> Self {
        self.save_threshold = (threshold > 0).then_some(threshold);
        self
    }

    /// Selects the anti-coincidence comparison.
    #[must_use]
    pub fn with_anti_coincidence_rule(mut self, rule: AntiCoincidenceRule) -> Self {
        self.anti_coincidence_rule = rule;
        self
    }

    /// Sets the per-event report level.
    #[must_use]
    pub fn with_verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Sets the optical-photon drawing flags.
    #[must_use]
    pub fn with_photon_drawing(mut self, force_draw: bool, force_no_draw: bool) -> Self {
        self.force_draw_photons = force_draw;
        self.force_no_draw_photons = force_no_draw;
        self
    }

    /// Checks that all values are usable.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] for a non-positive window or a
    /// negative threshold.
    pub fn validate(&self) -> Result<()> {
        if !(self.time_window.is_finite() && self.time_window > 0.0) {
            return Err(Error::invalid(
                "time_window",
                format!("must be positive and finite, got {}", self.time_window),
            ));
        }
        for (field, value) in [("threshold1", self.threshold1), ("threshold2", self.threshold2)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::invalid(
                    field,
                    format!("must be non-negative and finite, got {value}"),
                ));
            }
        }
        Ok(())
    }

    /// Loads and validates a configuration from a JSON string.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    /// Returns an error for malformed JSON or invalid values.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is invalid.
    #[cfg(feature = "serde")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }
}
