//! Run-level energy totals.
#![allow(clippy::cast_precision_loss)]

use std::fmt;

use scintix_core::units::KEV;
use scintix_core::RunTotalizer;
use serde::{Deserialize, Serialize};

/// Running sums of per-event target and detector energy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RunTotals {
    /// Events seen.
    pub n_events: u64,
    /// Sum of target energies.
    pub sum1: f64,
    /// Sum of squared target energies.
    pub sum1_sq: f64,
    /// Sum of detector energies.
    pub sum2: f64,
    /// Sum of squared detector energies.
    pub sum2_sq: f64,
}

impl RunTotals {
    /// Creates empty totals.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the sums of another partial run.
    pub fn merge(&mut self, other: &RunTotals) {
        self.n_events += other.n_events;
        self.sum1 += other.sum1;
        self.sum1_sq += other.sum1_sq;
        self.sum2 += other.sum2;
        self.sum2_sq += other.sum2_sq;
    }

    /// Mean and spread of the energies; `None` before any event.
    #[must_use]
    pub fn summary(&self) -> Option<RunSummary> {
        if self.n_events == 0 {
            return None;
        }
        let n = self.n_events as f64;
        let mean1 = self.sum1 / n;
        let mean2 = self.sum2 / n;
        Some(RunSummary {
            n_events: self.n_events,
            mean1,
            rms1: spread(self.sum1_sq / n, mean1),
            mean2,
            rms2: spread(self.sum2_sq / n, mean2),
        })
    }
}

fn spread(mean_sq: f64, mean: f64) -> f64 {
    (mean_sq - mean * mean).max(0.0).sqrt()
}

impl RunTotalizer for RunTotals {
    fn add_edep(&mut self, edep1: f64, edep2: f64) {
        self.n_events += 1;
        self.sum1 += edep1;
        self.sum1_sq += edep1 * edep1;
        self.sum2 += edep2;
        self.sum2_sq += edep2 * edep2;
    }
}

/// End-of-run energy statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Events seen.
    pub n_events: u64,
    /// Mean target energy per event.
    pub mean1: f64,
    /// Spread of the target energy.
    pub rms1: f64,
    /// Mean detector energy per event.
    pub mean2: f64,
    /// Spread of the detector energy.
    pub rms2: f64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "events processed: {}", self.n_events)?;
        writeln!(
            f,
            "target energy:    {:.3} keV (rms {:.3} keV)",
            self.mean1 / KEV,
            self.rms1 / KEV
        )?;
        write!(
            f,
            "detector energy:  {:.3} keV (rms {:.3} keV)",
            self.mean2 / KEV,
            self.rms2 / KEV
        )
    }
}
