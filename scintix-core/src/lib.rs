//! scintix-core: per-event detector response aggregation.
//!
//! This crate turns the raw energy deposits and photon-detector hits of one
//! simulated event into summary quantities: time-gated energy per volume,
//! coincidence classification, weighted hit positions and optical-photon
//! bookkeeping. Histogram storage, run bookkeeping and visualization are
//! reached through the traits in [`sink`].
//!

pub mod accumulator;
pub mod classification;
pub mod config;
pub mod error;
pub mod event;
pub mod hit;
pub mod processor;
pub mod reduction;
pub mod sink;
pub mod units;

pub use accumulator::{AccumulatedEnergy, DepositEvent, EventAccumulator, Volume};
pub use classification::{AntiCoincidenceRule, Classification, Classifier};
pub use config::ResponseConfig;
pub use error::{Error, Result};
pub use event::{
    EventInformation, EventOutcome, EventRecord, EventSummary, ParticleKind, PhotonProduction,
    SaveRequest, Trajectory,
};
pub use hit::{DetectorHit, EventHits, HitCollection, Vec3, VolumetricHit, WeightedHit};
pub use processor::EventProcessor;
pub use reduction::{DetectorReduction, HitReducer, MaxDeposit, PhotonCounts, ScintReduction};
pub use sink::{Channel, FillRecord, HistogramSink, RunTotalizer, TrajectoryPainter};
