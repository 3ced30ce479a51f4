//! Synthetic array recordings
//!
//! Turns a mono signal into the multichannel recording an array would
//! capture from a single source, so a scan can be checked against a known
//! direction. The delays applied here are the complement of the ones a scan
//! applies for the same candidate: summing both gives the same total delay
//! on every channel, which is exactly the alignment the scan looks for.

use crate::geometry::{mic_delays, source_position, ArrayGeometry};
use crate::signal::{apply_delays, apply_linear_delay_schedule};
use crate::types::{DasError, DasResult, Sample, SignalMatrix};

/// Sine of `freq` Hz sampled at `sample_rate`: `sin(2π·freq·n/fs)`.
///
/// The frequency must satisfy `0 <= freq < sample_rate / 2`.
pub fn create_sine(freq: f64, length: usize, sample_rate: f64) -> DasResult<Vec<Sample>> {
    if !(sample_rate > 0.0) || !(0.0..sample_rate / 2.0).contains(&freq) {
        return Err(DasError::Range(format!(
            "frequency must satisfy 0 <= f < fs/2 (fs = {}), got {}",
            sample_rate, freq
        )));
    }
    let omega = 2.0 * std::f64::consts::PI * freq / sample_rate;
    Ok((0..length).map(|n| (omega * n as f64).sin()).collect())
}

/// Plane wave recording with `base_delay` samples between neighbours.
///
/// Channel `n` (1-based) lags by `round(|(n - 1)·base_delay|)` for a
/// positive base delay and by `round(|(N - n)·base_delay|)` for a negative
/// one.
pub fn plane_wave_testsignals(
    mono: &[Sample],
    mic_count: usize,
    base_delay: f64,
) -> DasResult<SignalMatrix> {
    let replicated = SignalMatrix::replicate(mono, mic_count);
    Ok(apply_linear_delay_schedule(&replicated, base_delay)?.reversed())
}

/// Point source recording for a source at `angle_deg` on the plane at `distance`.
pub fn point_source_testsignals(
    mono: &[Sample],
    geometry: &ArrayGeometry,
    angle_deg: f64,
    distance: f64,
) -> DasResult<SignalMatrix> {
    if !(distance.is_finite() && distance > 0.0) {
        return Err(DasError::Range(format!(
            "distance to the source plane must be positive, got {}",
            distance
        )));
    }
    if !(-90.0 < angle_deg && angle_deg < 90.0) {
        return Err(DasError::Range(format!(
            "angle must be in (-90, 90), got {}",
            angle_deg
        )));
    }
    let config = geometry.config();
    let source = source_position(angle_deg, distance);
    let delays = mic_delays(geometry.mic_positions(), &source, config.sample_rate(), true);
    apply_delays(&SignalMatrix::replicate(mono, config.mic_count()), &delays)
}
