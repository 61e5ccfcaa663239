use approx::assert_relative_eq;
use scintix_analysis::{run_events, HistoManager, HistogramBooking, RunOutput};
use scintix_core::units::{KEV, MICROSECOND};
use scintix_core::{
    AntiCoincidenceRule, Channel, Classification, DepositEvent, DetectorHit, EventRecord,
    ResponseConfig, Vec3, VolumetricHit,
};

fn config() -> ResponseConfig {
    ResponseConfig::new().with_verbose(0)
}

fn run(records: Vec<EventRecord>, config: &ResponseConfig) -> RunOutput {
    run_events(records, config, &HistogramBooking::default()).unwrap()
}

fn entries(histograms: &HistoManager, channel: Channel) -> u64 {
    histograms.get(channel).unwrap().entries()
}

fn deposits(event_id: u64, deposits: Vec<DepositEvent>) -> EventRecord {
    EventRecord {
        deposits,
        ..EventRecord::new(event_id)
    }
}

#[test]
fn test_low_target_energy_is_anti_coincidence_2() {
    let record = deposits(
        0,
        vec![
            DepositEvent::new(1, 5.0 * KEV, 0.0, 1.0),
            DepositEvent::new(2, 20.0 * KEV, 0.1 * MICROSECOND, 1.0),
        ],
    );
    let output = run(vec![record], &config());

    assert_eq!(
        output.summaries[0].classification,
        Some(Classification::AntiCoincidence2)
    );
    assert_eq!(entries(&output.histograms, Channel::AntiCoincidence2), 1);
    assert_eq!(entries(&output.histograms, Channel::Coincidence), 0);
    assert_eq!(entries(&output.histograms, Channel::AntiCoincidence1), 0);
    let anti2 = output.histograms.get(Channel::AntiCoincidence2).unwrap();
    assert_relative_eq!(anti2.mean().unwrap(), 20.0 * KEV, epsilon = 1e-12);
}

#[test]
fn test_late_deposit_is_discarded() {
    let record = deposits(
        0,
        vec![
            DepositEvent::new(1, 30.0 * KEV, 0.0, 1.0),
            DepositEvent::new(1, 500.0 * KEV, 2.0 * MICROSECOND, 1.0),
        ],
    );
    let output = run(vec![record], &config());

    assert_relative_eq!(output.summaries[0].edep1, 30.0 * KEV);
    assert_eq!(
        output.summaries[0].classification,
        Some(Classification::AntiCoincidence1)
    );
    assert_relative_eq!(output.totals.sum1, 30.0 * KEV);
}

#[test]
fn test_photon_detector_reduction() {
    let record = EventRecord {
        pmt_hits: Some(vec![
            DetectorHit::new(Vec3::new(0.0, 0.0, 0.0), 2),
            DetectorHit::new(Vec3::new(1.0, 0.0, 0.0), 5),
            DetectorHit::new(Vec3::new(2.0, 0.0, 0.0), 1),
        ]),
        ..EventRecord::new(4)
    };
    let output = run(vec![record], &config().with_pmt_threshold(3));
    let summary = &output.summaries[0];

    assert_eq!(summary.pmts_above_threshold, 1);
    let position = summary.centroid_position_detector.unwrap();
    assert_relative_eq!(position.x, 0.875);
    assert_relative_eq!(position.y, 0.0);
    assert_eq!(summary.photon_counts.detected, 8);
    assert_eq!(entries(&output.histograms, Channel::PmtPhotons), 1);
}

#[test]
fn test_symmetric_rule_changes_unequal_threshold_routing() {
    // edep1 sits between the two thresholds, above threshold2.
    let record = deposits(
        0,
        vec![
            DepositEvent::new(1, 15.0 * KEV, 0.0, 1.0),
            DepositEvent::new(2, 30.0 * KEV, 0.0, 1.0),
        ],
    );
    let literal = config().with_thresholds(20.0 * KEV, 10.0 * KEV);
    let symmetric = literal
        .clone()
        .with_anti_coincidence_rule(AntiCoincidenceRule::Symmetric);

    let a = run(vec![record.clone()], &literal);
    let b = run(vec![record], &symmetric);
    assert_eq!(a.summaries[0].classification, None);
    assert_eq!(entries(&a.histograms, Channel::AntiCoincidence2), 0);
    assert_eq!(
        b.summaries[0].classification,
        Some(Classification::AntiCoincidence2)
    );
    assert_eq!(entries(&b.histograms, Channel::AntiCoincidence2), 1);
}

#[test]
fn test_rerunning_events_is_idempotent() {
    let record = EventRecord {
        deposits: vec![
            DepositEvent::new(1, 40.0 * KEV, 0.0, 0.5),
            DepositEvent::new(2, 60.0 * KEV, 10.0, 1.0),
        ],
        scint_hits: Some(vec![
            VolumetricHit::new(Vec3::new(1.0, 2.0, 3.0), 10.0 * KEV),
            VolumetricHit::new(Vec3::new(-1.0, 0.0, 3.0), 30.0 * KEV),
        ]),
        ..EventRecord::new(1)
    };

    let once = run(vec![record.clone()], &config());
    let twice = run(vec![record.clone(), record], &config());

    assert_eq!(twice.summaries[0], twice.summaries[1]);
    assert_eq!(once.summaries[0], twice.summaries[0]);
    assert_eq!(entries(&twice.histograms, Channel::Coincidence), 2);
    assert_relative_eq!(
        twice.histograms.get(Channel::Coincidence).unwrap().sum_of_weights(),
        2.0
    );
}

#[test]
fn test_save_requests_follow_detected_light() {
    let dim = EventRecord {
        pmt_hits: Some(vec![DetectorHit::new(Vec3::ZERO, 3)]),
        ..EventRecord::new(7)
    };
    let bright = EventRecord {
        pmt_hits: Some(vec![DetectorHit::new(Vec3::ZERO, 300)]),
        ..EventRecord::new(2)
    };
    let output = run(vec![dim, bright], &config().with_save_threshold(5));

    assert_eq!(output.save_requests.len(), 1);
    assert_eq!(output.save_requests[0].event_id, 7);
    assert_eq!(output.summaries[0].event_id, 2);
}

#[test]
fn test_invalid_config_is_rejected() {
    let bad = config().with_time_window(-1.0);
    assert!(run_events(Vec::<EventRecord>::new(), &bad, &HistogramBooking::default()).is_err());
}

#[test]
fn test_events_from_json_lines() {
    let lines = r#"{"event_id": 1, "deposits": [{"volume_id": 1, "energy": 0.05, "time": 0.0, "weight": 1.0}, {"volume_id": 2, "energy": 0.02, "time": 5.0, "weight": 1.0}]}
{"event_id": 2, "pmt_hits": [{"position": {"x": 0.0, "y": 0.0, "z": 1.0}, "photon_count": 4}], "photons": {"scintillation": 12}}"#;
    let records: Vec<EventRecord> = lines
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let output = run(records, &config());
    assert_eq!(output.totals.n_events, 2);
    assert_eq!(
        output.summaries[0].classification,
        Some(Classification::Coincidence)
    );
    assert_eq!(output.summaries[1].photon_counts.produced_scint, 12);
    assert_eq!(output.summaries[1].photon_counts.detected, 4);
}
