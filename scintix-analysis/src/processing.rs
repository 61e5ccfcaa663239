//! Run drivers: feed a sequence of event records through an
//! [`EventProcessor`] backed by [`HistoManager`] and [`RunTotals`].

use log::{debug, info};
use rayon::prelude::*;
use scintix_core::{
    EventOutcome, EventProcessor, EventRecord, EventSummary, ResponseConfig, SaveRequest,
};

use crate::error::Result;
use crate::histogram::{HistoManager, HistogramBooking};
use crate::run::{RunSummary, RunTotals};

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    /// Merged histograms of all booked channels.
    pub histograms: HistoManager,
    /// Merged energy totals.
    pub totals: RunTotals,
    /// Per-event summaries, ordered by event id.
    pub summaries: Vec<EventSummary>,
    /// Seed-save requests, ordered by event id.
    pub save_requests: Vec<SaveRequest>,
}

impl RunOutput {
    /// Mean and spread of the deposited energies.
    #[must_use]
    pub fn run_summary(&self) -> Option<RunSummary> {
        self.totals.summary()
    }
}

/// One processor plus the outcomes it produced.
struct Worker {
    processor: EventProcessor<HistoManager, RunTotals>,
    outcomes: Vec<EventOutcome>,
}

impl Worker {
    fn new(config: &ResponseConfig, histograms: &HistoManager) -> Self {
        Self {
            processor: EventProcessor::new(config.clone(), histograms.clone(), RunTotals::new()),
            outcomes: Vec::new(),
        }
    }

    fn process(mut self, record: EventRecord) -> Self {
        let event_id = record.event_id;
        let outcome = self.processor.process(record);
        debug!(
            "event {event_id}: classification {:?}",
            outcome.summary.classification
        );
        self.outcomes.push(outcome);
        self
    }
}

/// Merges partial runs into `histograms`, which holds the empty booking.
fn collect(workers: Vec<Worker>, mut histograms: HistoManager) -> Result<RunOutput> {
    let mut totals = RunTotals::new();
    let mut summaries = Vec::new();
    let mut save_requests = Vec::new();

    for worker in workers {
        let (worker_histograms, worker_totals) = worker.processor.into_sinks();
        histograms.merge(&worker_histograms)?;
        totals.merge(&worker_totals);
        for outcome in worker.outcomes {
            save_requests.extend(outcome.save_request);
            summaries.push(outcome.summary);
        }
    }

    summaries.sort_by_key(|s| s.event_id);
    save_requests.sort_by_key(|r| r.event_id);

    info!(
        "run finished: {} events, {} seed save requests",
        totals.n_events,
        save_requests.len()
    );

    Ok(RunOutput {
        histograms,
        totals,
        summaries,
        save_requests,
    })
}

/// Processes events one after another.
///
/// # Errors
/// Returns an error if the configuration or the histogram booking is invalid.
pub fn run_events<I>(
    records: I,
    config: &ResponseConfig,
    booking: &HistogramBooking,
) -> Result<RunOutput>
where
    I: IntoIterator<Item = EventRecord>,
{
    config.validate()?;
    let booked = HistoManager::new(booking)?;

    let worker = records
        .into_iter()
        .fold(Worker::new(config, &booked), Worker::process);

    collect(vec![worker], booked)
}

/// Processes events on the rayon thread pool.
///
/// Each worker thread owns its processor and sinks; the partial results are
/// merged once all events are done. Histogram contents and run totals match
/// [`run_events`] up to floating-point summation order.
///
/// # Errors
/// Returns an error if the configuration or the histogram booking is invalid.
pub fn run_events_parallel(
    records: Vec<EventRecord>,
    config: &ResponseConfig,
    booking: &HistogramBooking,
) -> Result<RunOutput> {
    config.validate()?;
    let booked = HistoManager::new(booking)?;

    let workers: Vec<Worker> = records
        .into_par_iter()
        .fold(|| Worker::new(config, &booked), Worker::process)
        .collect();
    debug!("merging {} partial runs", workers.len());

    collect(workers, booked)
}
