//! Event processor: drives accumulation, reduction and classification for
//! one event at a time and pushes the results to the sinks.
#![allow(clippy::cast_precision_loss)]

use log::info;

use crate::accumulator::{DepositEvent, EventAccumulator};
use crate::classification::Classifier;
use crate::config::ResponseConfig;
use crate::event::{
    EventInformation, EventOutcome, EventRecord, EventSummary, SaveRequest, Trajectory,
};
use crate::hit::{EventHits, PMT_COLLECTION, SCINT_COLLECTION};
use crate::reduction::HitReducer;
use crate::sink::{Channel, HistogramSink, RunTotalizer, TrajectoryPainter};
use crate::units::{KEV, MM};

/// Boxed visualization hook.
pub type Painter = Box<dyn TrajectoryPainter + Send>;

/// Processes events sequentially, one at a time.
///
/// The processor owns its sinks; a run that is split across threads uses one
/// processor per thread.
pub struct EventProcessor<H, R> {
    config: ResponseConfig,
    accumulator: EventAccumulator,
    reducer: HitReducer,
    classifier: Classifier,
    histograms: H,
    run: R,
    painter: Option<Painter>,
}

impl<H: HistogramSink, R: RunTotalizer> EventProcessor<H, R> {
    /// Creates a processor writing to the given sinks.
    #[must_use]
    pub fn new(config: ResponseConfig, histograms: H, run: R) -> Self {
        Self {
            accumulator: EventAccumulator::new(config.time_window),
            reducer: HitReducer::from_config(&config),
            classifier: Classifier::from_config(&config),
            config,
            histograms,
            run,
            painter: None,
        }
    }

    /// Attaches a visualization hook.
    #[must_use]
    pub fn with_painter(mut self, painter: Painter) -> Self {
        self.painter = Some(painter);
        self
    }

    /// Returns the response configuration.
    #[must_use]
    pub fn config(&self) -> &ResponseConfig {
        &self.config
    }

    /// Returns the histogram sink.
    #[must_use]
    pub fn histograms(&self) -> &H {
        &self.histograms
    }

    /// Returns the run totalizer.
    #[must_use]
    pub fn run(&self) -> &R {
        &self.run
    }

    /// Releases the sinks.
    #[must_use]
    pub fn into_sinks(self) -> (H, R) {
        (self.histograms, self.run)
    }

    /// Starts a new event and returns its context.
    pub fn begin_event(&mut self, event_id: u64) -> EventInformation {
        self.accumulator.reset();
        EventInformation::new(event_id)
    }

    /// Feeds one deposit of the current event.
    pub fn add_deposit(&mut self, deposit: &DepositEvent) {
        self.accumulator.add(deposit);
    }

    /// Finishes the current event.
    ///
    /// The filled context is handed back in [`EventOutcome::information`].
    /// `hits` holds the finalized hit collections; below-threshold detector
    /// hits get their drawing flag cleared. Trajectories only matter when a
    /// painter is attached.
    pub fn end_event(
        &mut self,
        mut info: EventInformation,
        hits: &mut EventHits,
        trajectories: &mut [Trajectory],
    ) -> EventOutcome {
        let verbose = self.config.verbose > 0;
        let event_id = info.event_id();
        if verbose {
            info!("event {event_id}: finalizing");
        }

        let energy = self.accumulator.finalize();
        let weight1 = energy.mean_weight1();
        let weight2 = energy.mean_weight2();

        if let Some(w) = weight1 {
            self.histograms
                .fill_h1(Channel::TargetPulseHeight, energy.edep1, w);
        }
        if let Some(w) = weight2 {
            self.histograms
                .fill_h1(Channel::DetectorPulseHeight, energy.edep2, w);
        }
        let total_weight = energy.total_mean_weight();
        if let Some(w) = total_weight {
            self.histograms
                .fill_h1(Channel::TotalPulseHeight, energy.total(), w);
        }

        let classification = self
            .classifier
            .classify_and_fill(&energy, &mut self.histograms);

        self.run.add_edep(energy.edep1, energy.edep2);

        let fill_weight = weight1.unwrap_or(0.0);
        let scint_count = info.photon_count_scint() as f64;
        self.histograms
            .fill_h1(Channel::ScintPhotons, scint_count, fill_weight);
        if energy.edep1 > 0.0 {
            self.histograms
                .fill_h1(Channel::PhotonsPerEnergy, scint_count / energy.edep1, fill_weight);
        }

        if let Some(painter) = self.painter.as_mut() {
            for trajectory in trajectories.iter_mut() {
                if trajectory.is_optical_photon() {
                    trajectory.force_draw = self.config.force_draw_photons;
                    trajectory.force_no_draw = self.config.force_no_draw_photons;
                }
                painter.draw_trajectory(trajectory);
            }
        }

        if let Some(scint_hits) = hits.volumetric(SCINT_COLLECTION) {
            let reduction = self.reducer.reduce_scint(scint_hits);
            info.record_scint(&reduction);
            if verbose {
                match reduction.centroid {
                    None => info!("event {event_id}: no energy in scintillator hits"),
                    Some(pos) => info!(
                        "event {event_id}: scintillator centroid ({:.4}, {:.4}, {:.4}) mm",
                        pos.x / MM,
                        pos.y / MM,
                        pos.z / MM
                    ),
                }
                info!(
                    "event {event_id}: scintillator edep {:.3} keV in {} hits",
                    info.scint_edep() / KEV,
                    reduction.n_hits
                );
            }
        }

        if let Some(pmt_hits) = hits.detector_mut(PMT_COLLECTION) {
            let reduction = self.reducer.reduce_detector(pmt_hits);
            info.record_detector(&reduction);
            self.histograms.fill_h1(
                Channel::PmtPhotons,
                reduction.total_photons as f64,
                fill_weight,
            );
            match reduction.reconstructed_position {
                Some(pos) if verbose => info!(
                    "event {event_id}: reconstructed position ({:.4}, {:.4}, {:.4}) mm",
                    pos.x / MM,
                    pos.y / MM,
                    pos.z / MM
                ),
                None if verbose => {
                    info!("event {event_id}: no photons detected, position not reconstructed");
                }
                _ => {}
            }
            if let Some(painter) = self.painter.as_mut() {
                for hit in pmt_hits.iter().filter(|h| h.is_above_threshold()) {
                    painter.draw_detector_hit(hit);
                }
            }
        }

        let photon_counts = info.photon_counts();
        if verbose {
            info!(
                "event {event_id}: {} photons detected, {} PMTs at or above {} photons",
                photon_counts.detected,
                info.pmts_above_threshold(),
                self.reducer.pmt_threshold()
            );
            info!(
                "event {event_id}: produced {} scintillation + {} Cerenkov photons, \
                 absorbed {} in bulk + {} at boundaries, {} unaccounted",
                photon_counts.produced_scint,
                photon_counts.produced_cerenkov,
                photon_counts.absorbed_bulk,
                photon_counts.absorbed_boundary,
                photon_counts.unaccounted()
            );
        }

        let save_request = self
            .config
            .save_threshold
            .filter(|&threshold| threshold > 0 && info.hit_count() <= threshold)
            .map(|_| SaveRequest { event_id });

        let summary = EventSummary {
            event_id,
            edep1: energy.edep1,
            edep2: energy.edep2,
            weighted_mean1: weight1,
            weighted_mean2: weight2,
            total_energy: energy.total(),
            total_weighted_mean: total_weight,
            classification,
            scint_edep: info.scint_edep(),
            centroid_position_scint: info.energy_weighted_position(),
            centroid_position_detector: info.reconstructed_position(),
            max_deposit: info.max_deposit(),
            pmts_above_threshold: info.pmts_above_threshold(),
            photon_counts,
        };

        EventOutcome {
            summary,
            information: info,
            save_request,
        }
    }

    /// Runs a complete event record through the processor.
    pub fn process(&mut self, mut record: EventRecord) -> EventOutcome {
        let mut info = self.begin_event(record.event_id);
        for deposit in &record.deposits {
            self.add_deposit(deposit);
        }
        info.add_production(&record.photons);
        let mut hits = record.take_hits();
        self.end_event(info, &mut hits, &mut record.trajectories)
    }
}
