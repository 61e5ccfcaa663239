//! Per-event context, summaries and input records.

use crate::accumulator::DepositEvent;
use crate::classification::Classification;
use crate::hit::{DetectorHit, EventHits, Vec3, VolumetricHit};
use crate::reduction::{DetectorReduction, MaxDeposit, PhotonCounts, ScintReduction};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Optical-photon production and absorption counted while tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PhotonProduction {
    /// Photons produced by scintillation.
    pub scintillation: u64,
    /// Photons produced by Cerenkov emission.
    pub cerenkov: u64,
    /// Photons absorbed in the bulk.
    pub absorbed_bulk: u64,
    /// Photons absorbed at optical boundaries.
    pub absorbed_boundary: u64,
}

/// Mutable per-event context.
///
/// Tracking collaborators increment the photon counters while the event is
/// being simulated; the event processor fills in the hit-derived quantities
/// at the end of the event.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventInformation {
    event_id: u64,
    production: PhotonProduction,
    scint_edep: f64,
    energy_weighted_position: Option<Vec3>,
    max_deposit: Option<MaxDeposit>,
    hit_count: u64,
    pmts_above_threshold: u32,
    reconstructed_position: Option<Vec3>,
}

impl EventInformation {
    /// Creates an empty context for `event_id`.
    #[must_use]
    pub fn new(event_id: u64) -> Self {
        Self {
            event_id,
            ..Self::default()
        }
    }

    /// Returns the event id.
    #[must_use]
    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    pub fn inc_photon_count_scint(&mut self) {
        self.production.scintillation = self.production.scintillation.saturating_add(1);
    }

    pub fn inc_photon_count_ceren(&mut self) {
        self.production.cerenkov = self.production.cerenkov.saturating_add(1);
    }

    pub fn inc_absorption(&mut self) {
        self.production.absorbed_bulk = self.production.absorbed_bulk.saturating_add(1);
    }

    pub fn inc_boundary_absorption(&mut self) {
        self.production.absorbed_boundary = self.production.absorbed_boundary.saturating_add(1);
    }

    /// Adds counters gathered elsewhere, e.g. by a stepping collaborator.
    pub fn add_production(&mut self, production: &PhotonProduction) {
        let own = &mut self.production;
        own.scintillation = own.scintillation.saturating_add(production.scintillation);
        own.cerenkov = own.cerenkov.saturating_add(production.cerenkov);
        own.absorbed_bulk = own.absorbed_bulk.saturating_add(production.absorbed_bulk);
        own.absorbed_boundary = own
            .absorbed_boundary
            .saturating_add(production.absorbed_boundary);
    }

    #[must_use]
    pub fn photon_count_scint(&self) -> u64 {
        self.production.scintillation
    }

    #[must_use]
    pub fn photon_count_ceren(&self) -> u64 {
        self.production.cerenkov
    }

    #[must_use]
    pub fn absorption_count(&self) -> u64 {
        self.production.absorbed_bulk
    }

    #[must_use]
    pub fn boundary_absorption_count(&self) -> u64 {
        self.production.absorbed_boundary
    }

    /// Energy deposited in the scintillator hits.
    #[must_use]
    pub fn scint_edep(&self) -> f64 {
        self.scint_edep
    }

    #[must_use]
    pub fn energy_weighted_position(&self) -> Option<Vec3> {
        self.energy_weighted_position
    }

    #[must_use]
    pub fn max_deposit(&self) -> Option<MaxDeposit> {
        self.max_deposit
    }

    /// Photons detected by all photon detectors.
    #[must_use]
    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    #[must_use]
    pub fn pmts_above_threshold(&self) -> u32 {
        self.pmts_above_threshold
    }

    #[must_use]
    pub fn reconstructed_position(&self) -> Option<Vec3> {
        self.reconstructed_position
    }

    /// Photon bookkeeping including the detected photons.
    #[must_use]
    pub fn photon_counts(&self) -> PhotonCounts {
        PhotonCounts {
            produced_scint: self.production.scintillation,
            produced_cerenkov: self.production.cerenkov,
            absorbed_bulk: self.production.absorbed_bulk,
            absorbed_boundary: self.production.absorbed_boundary,
            detected: self.hit_count,
        }
    }

    pub(crate) fn record_scint(&mut self, reduction: &ScintReduction) {
        self.scint_edep += reduction.total_edep;
        self.energy_weighted_position = reduction.centroid;
        self.max_deposit = reduction.max_deposit;
    }

    pub(crate) fn record_detector(&mut self, reduction: &DetectorReduction) {
        self.hit_count = self.hit_count.saturating_add(reduction.total_photons);
        self.pmts_above_threshold += reduction.above_threshold;
        self.reconstructed_position = reduction.reconstructed_position;
    }
}

/// Request to persist the random-number state of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SaveRequest {
    /// Event whose seed should be saved.
    pub event_id: u64,
}

/// Derived quantities of one event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventSummary {
    pub event_id: u64,
    /// Energy deposited in the target.
    pub edep1: f64,
    /// Energy deposited in the detector.
    pub edep2: f64,
    /// Mean track weight in the target, absent without energy.
    pub weighted_mean1: Option<f64>,
    /// Mean track weight in the detector, absent without energy.
    pub weighted_mean2: Option<f64>,
    pub total_energy: f64,
    pub total_weighted_mean: Option<f64>,
    pub classification: Option<Classification>,
    /// Energy summed over the scintillator hits.
    pub scint_edep: f64,
    /// Energy-weighted centroid of the scintillator hits.
    pub centroid_position_scint: Option<Vec3>,
    /// Photon-weighted centroid of the photon-detector hits.
    pub centroid_position_detector: Option<Vec3>,
    pub max_deposit: Option<MaxDeposit>,
    pub pmts_above_threshold: u32,
    pub photon_counts: PhotonCounts,
}

/// Result of processing one event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    pub summary: EventSummary,
    /// The event context as filled at the end of the event.
    pub information: EventInformation,
    /// Emitted when the event qualifies for a seed save.
    pub save_request: Option<SaveRequest>,
}

/// Particle species of a trajectory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum ParticleKind {
    OpticalPhoton,
    Other(String),
}

impl From<String> for ParticleKind {
    fn from(name: String) -> Self {
        if name == "opticalphoton" {
            Self::OpticalPhoton
        } else {
            Self::Other(name)
        }
    }
}

impl From<&str> for ParticleKind {
    fn from(name: &str) -> Self {
        Self::from(name.to_owned())
    }
}

impl From<ParticleKind> for String {
    fn from(kind: ParticleKind) -> Self {
        match kind {
            ParticleKind::OpticalPhoton => "opticalphoton".to_owned(),
            ParticleKind::Other(name) => name,
        }
    }
}

/// Track trajectory handed to the visualization hook.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trajectory {
    pub track_id: u32,
    pub particle: ParticleKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub points: Vec<Vec3>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub force_draw: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub force_no_draw: bool,
}

impl Trajectory {
    /// Creates a trajectory without points or drawing flags.
    #[must_use]
    pub fn new(track_id: u32, particle: impl Into<ParticleKind>) -> Self {
        Self {
            track_id,
            particle: particle.into(),
            points: Vec::new(),
            force_draw: false,
            force_no_draw: false,
        }
    }

    #[must_use]
    pub fn is_optical_photon(&self) -> bool {
        self.particle == ParticleKind::OpticalPhoton
    }
}

/// Everything the tracking engine reports for one event.
///
/// A hit collection that is `None` was not produced this event.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EventRecord {
    pub event_id: u64,
    pub deposits: Vec<DepositEvent>,
    pub scint_hits: Option<Vec<VolumetricHit>>,
    pub pmt_hits: Option<Vec<DetectorHit>>,
    pub photons: PhotonProduction,
    pub trajectories: Vec<Trajectory>,
}

impl EventRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new(event_id: u64) -> Self {
        Self {
            event_id,
            ..Self::default()
        }
    }

    /// Moves the hit collections into a name-keyed lookup.
    pub fn take_hits(&mut self) -> EventHits {
        let mut hits = EventHits::new();
        if let Some(scint) = self.scint_hits.take() {
            hits = hits.with_scint_hits(scint);
        }
        if let Some(pmt) = self.pmt_hits.take() {
            hits = hits.with_pmt_hits(pmt);
        }
        hits
    }
}
