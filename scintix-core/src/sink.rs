//! Interfaces to the downstream collaborators of the event processor.

use crate::event::Trajectory;
use crate::hit::DetectorHit;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fixed histogram channels filled at the end of every event.
///
/// Channel 6 is not used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Channel {
    /// Energy deposited in the target.
    TargetPulseHeight,
    /// Energy deposited in the detector.
    DetectorPulseHeight,
    /// Energy deposited in both volumes.
    TotalPulseHeight,
    /// Detector energy of coincident events.
    Coincidence,
    /// Target energy of target-only events.
    AntiCoincidence1,
    /// Detector energy of detector-only events.
    AntiCoincidence2,
    /// Scintillation photons produced.
    ScintPhotons,
    /// Photons detected by all photon detectors.
    PmtPhotons,
    /// Scintillation photons per unit of target energy.
    PhotonsPerEnergy,
}

impl Channel {
    /// All channels in index order.
    pub const ALL: [Channel; 9] = [
        Channel::TargetPulseHeight,
        Channel::DetectorPulseHeight,
        Channel::TotalPulseHeight,
        Channel::Coincidence,
        Channel::AntiCoincidence1,
        Channel::AntiCoincidence2,
        Channel::ScintPhotons,
        Channel::PmtPhotons,
        Channel::PhotonsPerEnergy,
    ];

    /// Returns the numeric histogram id.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::TargetPulseHeight => 0,
            Self::DetectorPulseHeight => 1,
            Self::TotalPulseHeight => 2,
            Self::Coincidence => 3,
            Self::AntiCoincidence1 => 4,
            Self::AntiCoincidence2 => 5,
            Self::ScintPhotons => 7,
            Self::PmtPhotons => 8,
            Self::PhotonsPerEnergy => 9,
        }
    }

    /// Human-readable histogram title.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::TargetPulseHeight => "energy deposit in target",
            Self::DetectorPulseHeight => "energy deposit in detector",
            Self::TotalPulseHeight => "total energy deposit",
            Self::Coincidence => "coincidence: energy in detector",
            Self::AntiCoincidence1 => "anti-coincidence: energy in target",
            Self::AntiCoincidence2 => "anti-coincidence: energy in detector",
            Self::ScintPhotons => "scintillation photons produced",
            Self::PmtPhotons => "photons detected by PMTs",
            Self::PhotonsPerEnergy => "scintillation photons per MeV in target",
        }
    }
}

/// One-dimensional histogram service.
pub trait HistogramSink {
    /// Adds `value` with statistical `weight` to the histogram of `channel`.
    fn fill_h1(&mut self, channel: Channel, value: f64, weight: f64);
}

impl<T: HistogramSink + ?Sized> HistogramSink for &mut T {
    fn fill_h1(&mut self, channel: Channel, value: f64, weight: f64) {
        (**self).fill_h1(channel, value, weight);
    }
}

/// A recorded histogram fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillRecord {
    /// Target channel.
    pub channel: Channel,
    /// Filled value.
    pub value: f64,
    /// Fill weight.
    pub weight: f64,
}

/// Records every fill in order, useful for inspection.
impl HistogramSink for Vec<FillRecord> {
    fn fill_h1(&mut self, channel: Channel, value: f64, weight: f64) {
        self.push(FillRecord {
            channel,
            value,
            weight,
        });
    }
}

/// Run-level energy bookkeeping, called once per event.
pub trait RunTotalizer {
    /// Adds the finalized per-volume energies of one event.
    fn add_edep(&mut self, edep1: f64, edep2: f64);
}

impl<T: RunTotalizer + ?Sized> RunTotalizer for &mut T {
    fn add_edep(&mut self, edep1: f64, edep2: f64) {
        (**self).add_edep(edep1, edep2);
    }
}

/// Keeps the per-event energy pairs in order.
impl RunTotalizer for Vec<(f64, f64)> {
    fn add_edep(&mut self, edep1: f64, edep2: f64) {
        self.push((edep1, edep2));
    }
}

/// Visualization hook. Purely cosmetic; never influences aggregation.
pub trait TrajectoryPainter {
    /// Draws one trajectory after its drawing flags were applied.
    fn draw_trajectory(&mut self, trajectory: &Trajectory);

    /// Draws one photon-detector hit that passed the activation threshold.
    fn draw_detector_hit(&mut self, hit: &DetectorHit);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_through<H: HistogramSink>(mut sink: H) {
        sink.fill_h1(Channel::PmtPhotons, 12.0, 1.0);
    }

    #[test]
    fn test_channel_indices() {
        let indices: Vec<usize> = Channel::ALL.iter().map(|c| c.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 7, 8, 9]);
    }

    #[test]
    fn test_recording_sinks() {
        let mut fills: Vec<FillRecord> = Vec::new();
        fill_through(&mut fills);
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].channel, Channel::PmtPhotons);

        let mut totals: Vec<(f64, f64)> = Vec::new();
        totals.add_edep(0.1, 0.2);
        assert_eq!(totals, vec![(0.1, 0.2)]);
    }
}
