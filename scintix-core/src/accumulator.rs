//! Time-gated energy accumulation for the two sensitive volumes.
//!
//! The gate is anchored at the first deposit of the event: every later
//! deposit whose timestamp differs from it by more than the configured window
//! is dropped. This models a finite electronics gate.

use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sensitive volume receiving energy deposits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Volume {
    /// Volume id 1.
    Target,
    /// Volume id 2.
    Detector,
}

impl Volume {
    /// Maps a tracking volume id onto a sensitive volume.
    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::Target),
            2 => Some(Self::Detector),
            _ => None,
        }
    }

    /// Returns the tracking volume id.
    #[must_use]
    pub fn id(self) -> u32 {
        match self {
            Self::Target => 1,
            Self::Detector => 2,
        }
    }

    #[inline]
    fn index(self) -> usize {
        match self {
            Self::Target => 0,
            Self::Detector => 1,
        }
    }
}

/// A single energy contribution reported while tracking.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepositEvent {
    /// Tracking volume id (1 = target, 2 = detector).
    pub volume_id: u32,
    /// Deposited energy.
    pub energy: f64,
    /// Global time of the deposit.
    pub time: f64,
    /// Statistical weight of the track.
    pub weight: f64,
}

impl DepositEvent {
    /// Creates a new deposit.
    #[must_use]
    pub fn new(volume_id: u32, energy: f64, time: f64, weight: f64) -> Self {
        Self {
            volume_id,
            energy,
            time,
            weight,
        }
    }
}

/// Finalized energy totals of one event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccumulatedEnergy {
    /// Energy deposited in the target.
    pub edep1: f64,
    /// Energy deposited in the detector.
    pub edep2: f64,
    /// Weight-scaled energy in the target, `Σ energy * weight`.
    pub weighted_edep1: f64,
    /// Weight-scaled energy in the detector.
    pub weighted_edep2: f64,
}

impl AccumulatedEnergy {
    /// Energy deposited in `volume`.
    #[must_use]
    pub fn edep(&self, volume: Volume) -> f64 {
        match volume {
            Volume::Target => self.edep1,
            Volume::Detector => self.edep2,
        }
    }

    /// Energy-weighted mean track weight in `volume`, absent without energy.
    #[must_use]
    pub fn mean_weight(&self, volume: Volume) -> Option<f64> {
        match volume {
            Volume::Target => mean_weight(self.weighted_edep1, self.edep1),
            Volume::Detector => mean_weight(self.weighted_edep2, self.edep2),
        }
    }

    /// Mean weight in the target.
    #[must_use]
    pub fn mean_weight1(&self) -> Option<f64> {
        self.mean_weight(Volume::Target)
    }

    /// Mean weight in the detector.
    #[must_use]
    pub fn mean_weight2(&self) -> Option<f64> {
        self.mean_weight(Volume::Detector)
    }

    /// Energy deposited in both volumes.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.edep1 + self.edep2
    }

    /// Mean weight over both volumes.
    #[must_use]
    pub fn total_mean_weight(&self) -> Option<f64> {
        mean_weight(self.weighted_edep1 + self.weighted_edep2, self.total())
    }
}

#[inline]
fn mean_weight(weighted: f64, edep: f64) -> Option<f64> {
    (edep > 0.0).then(|| weighted / edep)
}

/// Per-event energy accumulator.
///
/// Owned by the event being processed; [`reset`](Self::reset) must be called
/// before the first deposit of every event.
#[derive(Debug, Clone)]
pub struct EventAccumulator {
    time_window: f64,
    edep: [f64; 2],
    weighted_edep: [f64; 2],
    window_start: Option<f64>,
}

impl EventAccumulator {
    /// Creates an accumulator gating deposits to `time_window` around the first one.
    #[must_use]
    pub fn new(time_window: f64) -> Self {
        Self {
            time_window,
            edep: [0.0; 2],
            weighted_edep: [0.0; 2],
            window_start: None,
        }
    }

    /// Returns the width of the acceptance window.
    #[must_use]
    pub fn time_window(&self) -> f64 {
        self.time_window
    }

    /// Returns the time of the first deposit, if any arrived this event.
    #[must_use]
    pub fn window_start(&self) -> Option<f64> {
        self.window_start
    }

    /// Clears the totals and the window start.
    pub fn reset(&mut self) {
        self.edep = [0.0; 2];
        self.weighted_edep = [0.0; 2];
        self.window_start = None;
    }

    /// Adds one deposit, dropping it silently if it falls outside the window.
    ///
    /// The first deposit of the event fixes the window start even when it is
    /// otherwise ignored (unknown volume, negative energy).
    pub fn add_deposit(&mut self, volume_id: u32, energy: f64, time: f64, weight: f64) {
        if !time.is_finite() {
            debug!("ignoring deposit with non-finite time {time}");
            return;
        }

        let t0 = *self.window_start.get_or_insert(time);
        if (time - t0).abs() > self.time_window {
            debug!(
                "deposit of {energy} MeV at {time} ns outside window [{t0} ± {}] ns",
                self.time_window
            );
            return;
        }

        let Some(volume) = Volume::from_id(volume_id) else {
            debug!("ignoring deposit in unknown volume {volume_id}");
            return;
        };

        if !(energy.is_finite() && energy >= 0.0) {
            debug!("ignoring deposit with invalid energy {energy}");
            return;
        }

        let idx = volume.index();
        self.edep[idx] += energy;
        self.weighted_edep[idx] += energy * weight;
    }

    /// Adds a [`DepositEvent`].
    #[inline]
    pub fn add(&mut self, deposit: &DepositEvent) {
        self.add_deposit(
            deposit.volume_id,
            deposit.energy,
            deposit.time,
            deposit.weight,
        );
    }

    /// Returns the totals accumulated so far.
    #[must_use]
    pub fn finalize(&self) -> AccumulatedEnergy {
        AccumulatedEnergy {
            edep1: self.edep[0],
            edep2: self.edep[1],
            weighted_edep1: self.weighted_edep[0],
            weighted_edep2: self.weighted_edep[1],
        }
    }
}
