//! End-of-event reduction of the hit collections.
//!
//! Scintillator hits reduce to a total energy, an energy-weighted centroid and
//! the largest single deposit. Photon-detector hits reduce to a photon total,
//! a photon-weighted reconstructed position and the number of detectors above
//! the activation threshold.

use crate::config::ResponseConfig;
use crate::hit::{DetectorHit, Vec3, VolumetricHit, WeightedHit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position and energy of the largest single scintillator deposit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MaxDeposit {
    /// Position of the hit.
    pub position: Vec3,
    /// Energy of the hit.
    pub energy: f64,
}

/// Reduced scintillator hits.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScintReduction {
    /// Number of hits reduced.
    pub n_hits: usize,
    /// Sum of deposited energies.
    pub total_edep: f64,
    /// Energy-weighted centroid, absent when no energy was deposited.
    pub centroid: Option<Vec3>,
    /// Largest deposit, first one wins on ties.
    pub max_deposit: Option<MaxDeposit>,
}

/// Reduced photon-detector hits.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetectorReduction {
    /// Number of hits reduced.
    pub n_hits: usize,
    /// Sum of photon counts.
    pub total_photons: u64,
    /// Photon-weighted position, absent when no photon was detected.
    pub reconstructed_position: Option<Vec3>,
    /// Number of detectors at or above the activation threshold.
    pub above_threshold: u32,
}

/// Optical-photon bookkeeping of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhotonCounts {
    /// Photons produced by scintillation.
    pub produced_scint: u64,
    /// Photons produced by Cerenkov emission.
    pub produced_cerenkov: u64,
    /// Photons absorbed in the bulk.
    pub absorbed_bulk: u64,
    /// Photons absorbed at optical boundaries.
    pub absorbed_boundary: u64,
    /// Photons detected by the photon detectors.
    pub detected: u64,
}

impl PhotonCounts {
    /// Total photons produced, saturating at `u64::MAX`.
    #[must_use]
    pub fn produced(&self) -> u64 {
        self.produced_scint.saturating_add(self.produced_cerenkov)
    }

    /// Produced photons not accounted for by absorption or detection.
    ///
    /// Zero for a closed photon budget; negative values mean more photons
    /// were absorbed or detected than produced. Computed in `i128`, which
    /// holds any combination of `u64` counters exactly.
    #[must_use]
    pub fn unaccounted(&self) -> i128 {
        i128::from(self.produced_scint) + i128::from(self.produced_cerenkov)
            - i128::from(self.absorbed_bulk)
            - i128::from(self.detected)
            - i128::from(self.absorbed_boundary)
    }
}

/// Sums floats in a canonical order so the result is independent of input order.
fn ordered_sum(terms: impl Iterator<Item = f64>) -> f64 {
    let mut terms: Vec<f64> = terms.collect();
    terms.sort_unstable_by(f64::total_cmp);
    terms.iter().sum()
}

/// Weighted average of hit positions.
///
/// Returns the centroid and the total weight, or `None` when the total weight
/// is not positive. The result is bit-identical for any permutation of `hits`.
#[must_use]
pub fn weighted_centroid<H: WeightedHit>(hits: &[H]) -> Option<(Vec3, f64)> {
    let total = ordered_sum(hits.iter().map(WeightedHit::weight));
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    let sum = Vec3::new(
        ordered_sum(hits.iter().map(|h| h.position().x * h.weight())),
        ordered_sum(hits.iter().map(|h| h.position().y * h.weight())),
        ordered_sum(hits.iter().map(|h| h.position().z * h.weight())),
    );
    Some((sum / total, total))
}

/// Reduces the hit collections of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitReducer {
    pmt_threshold: u32,
}

impl HitReducer {
    /// Creates a reducer with the given photon-detector activation threshold.
    #[must_use]
    pub fn new(pmt_threshold: u32) -> Self {
        Self { pmt_threshold }
    }

    /// Creates a reducer from the response configuration.
    #[must_use]
    pub fn from_config(config: &ResponseConfig) -> Self {
        Self::new(config.pmt_threshold)
    }

    /// Returns the activation threshold.
    #[must_use]
    pub fn pmt_threshold(&self) -> u32 {
        self.pmt_threshold
    }

    /// Reduces the scintillator hits.
    #[must_use]
    pub fn reduce_scint(&self, hits: &[VolumetricHit]) -> ScintReduction {
        let mut max_deposit: Option<MaxDeposit> = None;
        for hit in hits {
            let current = max_deposit.map_or(0.0, |m| m.energy);
            if hit.energy > current {
                max_deposit = Some(MaxDeposit {
                    position: hit.position,
                    energy: hit.energy,
                });
            }
        }

        let total_edep = ordered_sum(hits.iter().map(|h| h.energy));
        let centroid = weighted_centroid(hits).map(|(c, _)| c);

        ScintReduction {
            n_hits: hits.len(),
            total_edep,
            centroid,
            max_deposit,
        }
    }

    /// Reduces the photon-detector hits.
    ///
    /// Hits below the activation threshold get their drawing flag cleared;
    /// this is the only mutation performed on the hits.
    pub fn reduce_detector(&self, hits: &mut [DetectorHit]) -> DetectorReduction {
        let mut total_photons = 0u64;
        let mut above_threshold = 0u32;
        for hit in hits.iter_mut() {
            total_photons += u64::from(hit.photon_count);
            if hit.photon_count >= self.pmt_threshold {
                above_threshold += 1;
            } else {
                hit.set_above_threshold(false);
            }
        }

        let reconstructed_position = if total_photons > 0 {
            weighted_centroid(&*hits).map(|(c, _)| c)
        } else {
            None
        };

        DetectorReduction {
            n_hits: hits.len(),
            total_photons,
            reconstructed_position,
            above_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn x(v: f64) -> Vec3 {
        Vec3::new(v, 0.0, 0.0)
    }

    #[test]
    fn test_detector_reduction_with_threshold() {
        let mut hits = vec![
            DetectorHit::new(x(0.0), 2),
            DetectorHit::new(x(1.0), 5),
            DetectorHit::new(x(2.0), 1),
        ];
        let reduction = HitReducer::new(3).reduce_detector(&mut hits);

        assert_eq!(reduction.total_photons, 8);
        assert_eq!(reduction.above_threshold, 1);
        // (0*2 + 1*5 + 2*1) / 8
        let pos = reduction.reconstructed_position.unwrap();
        assert_relative_eq!(pos.x, 0.875);
        assert_relative_eq!(pos.y, 0.0);

        assert!(!hits[0].is_above_threshold());
        assert!(hits[1].is_above_threshold());
        assert!(!hits[2].is_above_threshold());
    }

    #[test]
    fn test_detector_reduction_without_photons() {
        let mut hits = vec![DetectorHit::new(x(4.0), 0), DetectorHit::new(x(8.0), 0)];
        let reduction = HitReducer::new(1).reduce_detector(&mut hits);

        assert_eq!(reduction.total_photons, 0);
        assert_eq!(reduction.above_threshold, 0);
        assert!(reduction.reconstructed_position.is_none());
        assert!(hits.iter().all(|h| !h.is_above_threshold()));

        let empty = HitReducer::new(1).reduce_detector(&mut []);
        assert_eq!(empty, DetectorReduction::default());
    }

    #[test]
    fn test_zero_threshold_fires_every_detector() {
        let mut hits = vec![DetectorHit::new(x(0.0), 0), DetectorHit::new(x(1.0), 3)];
        let reduction = HitReducer::new(0).reduce_detector(&mut hits);
        assert_eq!(reduction.above_threshold, 2);
        assert!(hits.iter().all(DetectorHit::is_above_threshold));
    }

    #[test]
    fn test_scint_reduction() {
        let hits = vec![
            VolumetricHit::new(Vec3::new(0.0, 0.0, 0.0), 0.1),
            VolumetricHit::new(Vec3::new(10.0, 0.0, 4.0), 0.3),
            VolumetricHit::new(Vec3::new(-2.0, 6.0, 0.0), 0.1),
        ];
        let reduction = HitReducer::new(1).reduce_scint(&hits);

        assert_eq!(reduction.n_hits, 3);
        assert_relative_eq!(reduction.total_edep, 0.5, epsilon = 1e-12);
        let c = reduction.centroid.unwrap();
        assert_relative_eq!(c.x, 5.6, epsilon = 1e-12);
        assert_relative_eq!(c.y, 1.2, epsilon = 1e-12);
        assert_relative_eq!(c.z, 2.4, epsilon = 1e-12);

        let max = reduction.max_deposit.unwrap();
        assert_eq!(max.position, Vec3::new(10.0, 0.0, 4.0));
        assert_relative_eq!(max.energy, 0.3);
    }

    #[test]
    fn test_scint_max_deposit_ties_keep_first() {
        let hits = vec![
            VolumetricHit::new(x(1.0), 0.2),
            VolumetricHit::new(x(2.0), 0.2),
            VolumetricHit::new(x(3.0), 0.1),
        ];
        let max = HitReducer::new(1).reduce_scint(&hits).max_deposit.unwrap();
        assert_eq!(max.position, x(1.0));
    }

    #[test]
    fn test_scint_reduction_without_energy() {
        let hits = vec![VolumetricHit::new(x(1.0), 0.0)];
        let reduction = HitReducer::new(1).reduce_scint(&hits);
        assert_relative_eq!(reduction.total_edep, 0.0);
        assert!(reduction.centroid.is_none());
        assert!(reduction.max_deposit.is_none());
    }

    #[test]
    fn test_centroid_is_permutation_invariant() {
        let mut hits: Vec<VolumetricHit> = (0..50)
            .map(|i| {
                let f = f64::from(i);
                VolumetricHit::new(
                    Vec3::new(f * 0.37 - 3.1, (f * 1.3).sin() * 17.0, 1.0 / (f + 1.0)),
                    0.001 * (f * 7.0 % 11.0 + 0.3),
                )
            })
            .collect();
        let (reference, total) = weighted_centroid(&hits).unwrap();

        hits.reverse();
        assert_eq!(weighted_centroid(&hits).unwrap(), (reference, total));

        hits.rotate_left(17);
        assert_eq!(weighted_centroid(&hits).unwrap(), (reference, total));

        hits.swap(3, 41);
        assert_eq!(weighted_centroid(&hits).unwrap(), (reference, total));
    }

    #[test]
    fn test_photon_reconciliation() {
        let counts = PhotonCounts {
            produced_scint: 100,
            produced_cerenkov: 10,
            absorbed_bulk: 60,
            absorbed_boundary: 30,
            detected: 20,
        };
        assert_eq!(counts.produced(), 110);
        assert_eq!(counts.unaccounted(), 0);

        let leaky = PhotonCounts {
            detected: 12,
            ..counts
        };
        assert_eq!(leaky.unaccounted(), 8);

        let over = PhotonCounts {
            detected: 25,
            ..counts
        };
        assert_eq!(over.unaccounted(), -5);
    }

    #[test]
    fn test_photon_reconciliation_extreme_counts() {
        let saturated = PhotonCounts {
            produced_scint: u64::MAX,
            produced_cerenkov: u64::MAX,
            ..PhotonCounts::default()
        };
        assert_eq!(saturated.produced(), u64::MAX);
        assert_eq!(saturated.unaccounted(), 2 * i128::from(u64::MAX));

        let drained = PhotonCounts {
            absorbed_bulk: u64::MAX,
            detected: u64::MAX,
            absorbed_boundary: u64::MAX,
            ..PhotonCounts::default()
        };
        assert_eq!(drained.unaccounted(), -3 * i128::from(u64::MAX));
    }
}
