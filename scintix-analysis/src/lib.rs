//! scintix-analysis: run-level bookkeeping for scintix.
//!
//! This crate provides the reference sinks and run drivers:
//! - **Histograms** - fixed-binning `H1` per response channel, booked from JSON
//! - **Run totals** - mean and spread of target and detector energy
//! - **Drivers** - sequential and rayon-parallel event loops with mergeable
//!   per-worker sinks
//!
#![warn(missing_docs)]

pub mod error;
mod histogram;
mod processing;
mod run;

pub use error::{Error, Result};
pub use histogram::{BinSpec, H1, HistoManager, HistogramBooking};
pub use processing::{run_events, run_events_parallel, RunOutput};
pub use run::{RunSummary, RunTotals};
