//! Closed-loop localization: synthesize a recording for a known source,
//! scan it, and check the peak lands on the injected direction.

use dasloc_core::prelude::*;

const FS: f64 = 48_000.0;

fn array() -> ArrayConfig {
    ArrayConfig::new(0.05, 8, FS).unwrap()
}

fn tone() -> Vec<f64> {
    create_sine(1000.0, 4800, FS).unwrap()
}

#[test]
fn plane_wave_source_at_30_degrees() {
    let bf = PlaneWaveBeamformer::new(array());
    let signals = bf.testsignals(&tone(), 30.0).unwrap();
    assert_eq!(signals.num_channels(), 8);
    assert_eq!(signals.len(), 4800);

    let response = bf.scan(&signals, -90, 90, 1, false).unwrap();
    assert_eq!(response.len(), 181);
    assert_eq!(response.angle_bound(), 90);

    let peak = response.peak().unwrap();
    assert!((peak.angle_deg - 30).abs() <= 1, "peak at {}", peak.angle_deg);
}

#[test]
fn plane_wave_response_drops_away_from_source() {
    let bf = PlaneWaveBeamformer::new(array());
    let signals = bf.testsignals(&tone(), 30.0).unwrap();
    let response = bf.scan_full(&signals, false).unwrap();
    let peak = response.peak().unwrap();
    let opposite = response
        .iter()
        .find(|p| p.angle_deg == -30)
        .unwrap();
    assert!(peak.level_db - opposite.level_db > 3.0);
}

#[test]
fn point_source_at_minus_15_degrees() {
    let bf = PointSourceBeamformer::new(array());
    let distance = 1.0;
    let signals = bf.testsignals(&tone(), -15.0, distance).unwrap();

    let response = bf.scan(&signals, distance, false).unwrap();
    let max_angle = bf.max_angle(distance);
    assert_eq!(response.angles().first(), Some(&-max_angle));
    assert_eq!(response.angles().last(), Some(&max_angle));

    let peak = response.peak().unwrap();
    assert!((peak.angle_deg + 15).abs() <= 1, "peak at {}", peak.angle_deg);
}

#[test]
fn point_source_scan_spans_field_of_view_at_2m() {
    let bf = PointSourceBeamformer::new(array());
    let signals = bf.testsignals(&tone(), -5.0, 2.0).unwrap();
    let response = bf.scan(&signals, 2.0, false).unwrap();

    let max_angle = bf.max_angle(2.0);
    assert_eq!(max_angle, 10);
    assert_eq!(response.len(), 2 * max_angle as usize + 1);
    assert!((response.peak().unwrap().angle_deg + 5).abs() <= 1);
}

#[test]
fn point_source_scan_rejects_bad_input() {
    let bf = PointSourceBeamformer::new(array());
    let signals = SignalMatrix::replicate(&tone(), 8);
    assert!(matches!(bf.scan(&signals, 0.0, false), Err(DasError::Range(_))));

    let seven = SignalMatrix::replicate(&tone(), 7);
    assert!(matches!(bf.scan(&seven, 2.0, false), Err(DasError::Shape { .. })));
}

#[test]
fn scan_result_serializes_for_plotting() {
    let bf = PlaneWaveBeamformer::new(array());
    let signals = bf.testsignals(&tone(), -20.0).unwrap();
    let response = bf.scan(&signals, -45, 45, 15, true).unwrap();

    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("\"model\":\"plane\""));
    let back: ScanResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.angles(), vec![-45, -30, -15, 0, 15, 30, 45]);
}
