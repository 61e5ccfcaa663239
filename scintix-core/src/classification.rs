//! Coincidence and anti-coincidence classification.

use crate::accumulator::{AccumulatedEnergy, Volume};
use crate::config::ResponseConfig;
use crate::sink::{Channel, HistogramSink};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of the coincidence decision for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Classification {
    /// Both volumes above threshold.
    Coincidence,
    /// Only the target above threshold.
    AntiCoincidence1,
    /// Only the detector above threshold.
    AntiCoincidence2,
}

impl Classification {
    /// Histogram channel the classification is recorded on.
    #[must_use]
    pub fn channel(self) -> Channel {
        match self {
            Self::Coincidence => Channel::Coincidence,
            Self::AntiCoincidence1 => Channel::AntiCoincidence1,
            Self::AntiCoincidence2 => Channel::AntiCoincidence2,
        }
    }

    /// Volume whose pulse height is recorded for the classification.
    #[must_use]
    pub fn volume(self) -> Volume {
        match self {
            Self::Coincidence | Self::AntiCoincidence2 => Volume::Detector,
            Self::AntiCoincidence1 => Volume::Target,
        }
    }
}

/// Target-side comparison of the second anti-coincidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AntiCoincidenceRule {
    /// `edep1 < threshold2`.
    #[default]
    Literal,
    /// `edep1 < threshold1`.
    Symmetric,
}

/// Threshold classifier. Holds no per-event state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    threshold1: f64,
    threshold2: f64,
    rule: AntiCoincidenceRule,
}

impl Classifier {
    /// Creates a classifier using the literal anti-coincidence rule.
    #[must_use]
    pub fn new(threshold1: f64, threshold2: f64) -> Self {
        Self {
            threshold1,
            threshold2,
            rule: AntiCoincidenceRule::Literal,
        }
    }

    /// Creates a classifier from the response configuration.
    #[must_use]
    pub fn from_config(config: &ResponseConfig) -> Self {
        Self::new(config.threshold1, config.threshold2).with_rule(config.anti_coincidence_rule)
    }

    /// Selects the anti-coincidence rule.
    #[must_use]
    pub fn with_rule(mut self, rule: AntiCoincidenceRule) -> Self {
        self.rule = rule;
        self
    }

    /// Returns the active rule.
    #[must_use]
    pub fn rule(&self) -> AntiCoincidenceRule {
        self.rule
    }

    /// Classifies an event by its per-volume energies.
    ///
    /// Predicates are tried in the order coincidence, anti-coincidence 1,
    /// anti-coincidence 2; the first that holds is returned.
    #[must_use]
    pub fn classify(&self, edep1: f64, edep2: f64) -> Option<Classification> {
        let target_on = edep1 >= self.threshold1;
        let detector_on = edep2 >= self.threshold2;
        let target_off = match self.rule {
            AntiCoincidenceRule::Literal => edep1 < self.threshold2,
            AntiCoincidenceRule::Symmetric => edep1 < self.threshold1,
        };

        if target_on && detector_on {
            Some(Classification::Coincidence)
        } else if target_on && !detector_on {
            Some(Classification::AntiCoincidence1)
        } else if target_off && detector_on {
            Some(Classification::AntiCoincidence2)
        } else {
            None
        }
    }

    /// Classifies the event and records the selected pulse height, weighted
    /// by the mean weight of the selected volume.
    ///
    /// A selected volume without energy has no mean weight and is not
    /// recorded; the classification is still returned.
    pub fn classify_and_fill<H: HistogramSink + ?Sized>(
        &self,
        energy: &AccumulatedEnergy,
        sink: &mut H,
    ) -> Option<Classification> {
        let classification = self.classify(energy.edep1, energy.edep2)?;
        let volume = classification.volume();
        if let Some(weight) = energy.mean_weight(volume) {
            sink.fill_h1(classification.channel(), energy.edep(volume), weight);
        }
        Some(classification)
    }
}
