//! Hit types delivered by the sensitive detectors.

use std::ops::Div;

use log::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Name of the scintillator hit collection.
pub const SCINT_COLLECTION: &str = "scintCollection";

/// Name of the photon-detector hit collection.
pub const PMT_COLLECTION: &str = "pmtHitCollection";

/// Position in the internal length unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl Div<f64> for Vec3 {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// Common view over hits that contribute to a weighted centroid.
///
/// Scintillator hits are weighted by deposited energy, photon-detector hits
/// by their photon count.
pub trait WeightedHit {
    /// Returns the hit position.
    fn position(&self) -> Vec3;

    /// Returns the centroid weight of the hit.
    fn weight(&self) -> f64;
}

/// Energy deposit recorded by the scintillator sensitive detector.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VolumetricHit {
    /// Position of the deposit.
    pub position: Vec3,
    /// Deposited energy.
    pub energy: f64,
}

impl VolumetricHit {
    /// Creates a new scintillator hit.
    #[inline]
    #[must_use]
    pub fn new(position: Vec3, energy: f64) -> Self {
        Self { position, energy }
    }
}

impl WeightedHit for VolumetricHit {
    #[inline]
    fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    fn weight(&self) -> f64 {
        self.energy
    }
}

#[cfg(feature = "serde")]
fn default_above_threshold() -> bool {
    true
}

/// Hit on a single photon detector (PMT).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorHit {
    /// Position of the photon detector.
    pub position: Vec3,
    /// Number of photons that reached the detector this event.
    pub photon_count: u32,
    /// Cleared for detectors below the activation threshold so they are not drawn.
    #[cfg_attr(feature = "serde", serde(default = "default_above_threshold"))]
    above_threshold: bool,
}

impl DetectorHit {
    /// Creates a new photon-detector hit. The hit starts out drawable.
    #[inline]
    #[must_use]
    pub fn new(position: Vec3, photon_count: u32) -> Self {
        Self {
            position,
            photon_count,
            above_threshold: true,
        }
    }

    /// Returns false once the hit has been found below threshold.
    #[inline]
    #[must_use]
    pub fn is_above_threshold(&self) -> bool {
        self.above_threshold
    }

    /// Marks the hit as above or below the activation threshold.
    #[inline]
    pub fn set_above_threshold(&mut self, above: bool) {
        self.above_threshold = above;
    }
}

impl WeightedHit for DetectorHit {
    #[inline]
    fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    fn weight(&self) -> f64 {
        f64::from(self.photon_count)
    }
}

/// Hits of one sensitive detector, tagged by hit kind.
#[derive(Debug, Clone, PartialEq)]
pub enum HitCollection {
    /// Energy deposits in the scintillator.
    Volumetric(Vec<VolumetricHit>),
    /// Photon-detector hits.
    Detector(Vec<DetectorHit>),
}

impl HitCollection {
    /// Returns the number of hits.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Volumetric(hits) => hits.len(),
            Self::Detector(hits) => hits.len(),
        }
    }

    /// Returns true if the collection holds no hits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Volumetric(_) => "volumetric",
            Self::Detector(_) => "detector",
        }
    }
}

/// Hit collections of one event, looked up by collection name.
///
/// A name that was never inserted is a valid "no hits" state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventHits {
    collections: Vec<(String, HitCollection)>,
}

impl EventHits {
    /// Creates an empty set of collections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collection, replacing any previous collection of the same name.
    pub fn insert(&mut self, name: impl Into<String>, collection: HitCollection) {
        let name = name.into();
        match self.collections.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = collection,
            None => self.collections.push((name, collection)),
        }
    }

    /// Adds the scintillator collection under [`SCINT_COLLECTION`].
    #[must_use]
    pub fn with_scint_hits(mut self, hits: Vec<VolumetricHit>) -> Self {
        self.insert(SCINT_COLLECTION, HitCollection::Volumetric(hits));
        self
    }

    /// Adds the photon-detector collection under [`PMT_COLLECTION`].
    #[must_use]
    pub fn with_pmt_hits(mut self, hits: Vec<DetectorHit>) -> Self {
        self.insert(PMT_COLLECTION, HitCollection::Detector(hits));
        self
    }

    /// Looks up a collection by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HitCollection> {
        self.collections
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    /// Returns the scintillator hits stored under `name`.
    ///
    /// A collection of the wrong kind is reported and treated as absent.
    #[must_use]
    pub fn volumetric(&self, name: &str) -> Option<&[VolumetricHit]> {
        match self.get(name)? {
            HitCollection::Volumetric(hits) => Some(hits.as_slice()),
            other => {
                warn!(
                    "collection `{name}` holds {} hits, expected volumetric",
                    other.kind()
                );
                None
            }
        }
    }

    /// Returns the photon-detector hits stored under `name`.
    #[must_use]
    pub fn detector(&self, name: &str) -> Option<&[DetectorHit]> {
        match self.get(name)? {
            HitCollection::Detector(hits) => Some(hits.as_slice()),
            HitCollection::Volumetric(_) => {
                warn!("collection `{name}` holds volumetric hits, expected detector");
                None
            }
        }
    }

    /// Mutable access to the photon-detector hits stored under `name`.
    pub fn detector_mut(&mut self, name: &str) -> Option<&mut [DetectorHit]> {
        let collection = self
            .collections
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)?;
        match collection {
            HitCollection::Detector(hits) => Some(hits.as_mut_slice()),
            HitCollection::Volumetric(_) => {
                warn!("collection `{name}` holds volumetric hits, expected detector");
                None
            }
        }
    }

    /// Returns the number of registered collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Returns true if no collection was registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vec3_division() {
        let b = Vec3::new(4.0, 6.0, 3.0);
        assert_eq!(b / 2.0, Vec3::new(2.0, 3.0, 1.5));
        assert_eq!(Vec3::ZERO / 4.0, Vec3::ZERO);
    }

    #[test]
    fn test_hit_weights() {
        let scint = VolumetricHit::new(Vec3::new(1.0, 0.0, 0.0), 0.25);
        assert_relative_eq!(scint.weight(), 0.25);

        let pmt = DetectorHit::new(Vec3::new(0.0, 1.0, 0.0), 7);
        assert_relative_eq!(pmt.weight(), 7.0);
        assert!(pmt.is_above_threshold());
    }

    #[test]
    fn test_missing_collection_is_no_hits() {
        let hits = EventHits::new();
        assert!(hits.volumetric(SCINT_COLLECTION).is_none());
        assert!(hits.detector(PMT_COLLECTION).is_none());
    }

    #[test]
    fn test_collection_lookup_by_kind() {
        let mut hits = EventHits::new()
            .with_scint_hits(vec![VolumetricHit::new(Vec3::ZERO, 1.0)])
            .with_pmt_hits(vec![DetectorHit::new(Vec3::ZERO, 3)]);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits.volumetric(SCINT_COLLECTION).map(<[_]>::len), Some(1));
        assert_eq!(hits.detector(PMT_COLLECTION).map(<[_]>::len), Some(1));

        // Looked up under the wrong kind: treated as absent.
        assert!(hits.detector(SCINT_COLLECTION).is_none());
        assert!(hits.volumetric(PMT_COLLECTION).is_none());

        let pmts = hits.detector_mut(PMT_COLLECTION).unwrap();
        pmts[0].set_above_threshold(false);
        assert!(!hits.detector(PMT_COLLECTION).unwrap()[0].is_above_threshold());
    }

    #[test]
    fn test_insert_replaces_same_name() {
        let mut hits = EventHits::new().with_scint_hits(Vec::new());
        hits.insert(
            SCINT_COLLECTION,
            HitCollection::Volumetric(vec![VolumetricHit::new(Vec3::ZERO, 2.0)]),
        );
        assert_eq!(hits.len(), 1);
        assert!(!hits.get(SCINT_COLLECTION).unwrap().is_empty());
    }
}
