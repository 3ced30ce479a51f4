//! Delay-and-Sum Beamformer: direction finding with a microphone array
//!
//! Sweeps a grid of candidate source directions. For each candidate the
//! channels are time-aligned, summed and scored by the RMS level of the sum
//! in dB. The candidate with the highest level is the estimated source
//! direction.
//!
//! Two propagation models are supported:
//!
//! - **Plane wave** ([`PlaneWaveBeamformer`]): the source is far away, the
//!   delay grows linearly along the array.
//! - **Point source** ([`PointSourceBeamformer`]): the source sits on a plane
//!   at a known distance, each microphone gets its own geometric delay.
//!
//! ```text
//!  ch 1 ──[delay d1]──┐
//!  ch 2 ──[delay d2]──┤
//!   ...               ├──(Σ)──> RMS ──> 20·log10 ──> level(α)
//!  ch N ──[delay dN]──┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use dasloc_core::beamformer::PlaneWaveBeamformer;
//! use dasloc_core::geometry::ArrayConfig;
//! use dasloc_core::testsignal::create_sine;
//!
//! let config = ArrayConfig::new(0.05, 8, 48_000.0).unwrap();
//! let bf = PlaneWaveBeamformer::new(config);
//!
//! let tone = create_sine(1000.0, 4800, 48_000.0).unwrap();
//! let signals = bf.testsignals(&tone, 30.0).unwrap();
//!
//! let response = bf.scan(&signals, -90, 90, 1, false).unwrap();
//! let peak = response.peak().unwrap();
//! assert!((peak.angle_deg - 30).abs() <= 1);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{debug, trace};

use crate::geometry::{ArrayConfig, ArrayGeometry};
use crate::signal::{apply_delays, apply_linear_delay_schedule, rms, to_decibels};
use crate::testsignal;
use crate::types::{DasError, DasResult, DelayVector, SignalMatrix, SPEED_OF_SOUND};
use crate::windows::Window;

/// Propagation model used to derive the steering delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropagationModel {
    /// Far-field source, planar wavefront
    #[default]
    Plane,
    /// Source at a finite distance, spherical wavefront
    Point,
}

impl std::fmt::Display for PropagationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropagationModel::Plane => write!(f, "plane"),
            PropagationModel::Point => write!(f, "point"),
        }
    }
}

/// Level of the steered sum for one candidate angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanPoint {
    /// Candidate angle in degrees
    pub angle_deg: i32,
    /// RMS level of the summed channels in dB
    pub level_db: f64,
}

/// Directional response: one level per scanned angle, angles ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Model the delays were derived from
    pub model: PropagationModel,
    /// Scanned points
    pub points: Vec<ScanPoint>,
}

impl ScanResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScanPoint> {
        self.points.iter()
    }

    pub fn angles(&self) -> Vec<i32> {
        self.points.iter().map(|p| p.angle_deg).collect()
    }

    pub fn levels(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.level_db).collect()
    }

    /// Point with the highest level (the estimated source direction).
    ///
    /// On ties the smallest angle wins.
    pub fn peak(&self) -> Option<ScanPoint> {
        self.points.iter().copied().fold(None, |best, p| match best {
            Some(b) if b.level_db >= p.level_db => Some(b),
            _ => Some(p),
        })
    }

    /// Largest absolute angle covered by the scan.
    pub fn angle_bound(&self) -> i32 {
        self.points
            .iter()
            .map(|p| p.angle_deg.abs())
            .max()
            .unwrap_or(0)
    }

    /// Levels relative to the peak (the peak sits at 0 dB).
    pub fn normalized(&self) -> Vec<ScanPoint> {
        let top = self.peak().map_or(0.0, |p| p.level_db);
        self.points
            .iter()
            .map(|p| ScanPoint {
                angle_deg: p.angle_deg,
                level_db: p.level_db - top,
            })
            .collect()
    }

    /// `angle_deg,level_db` table with a header row.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("angle_deg,level_db\n");
        for p in &self.points {
            let _ = writeln!(out, "{},{}", p.angle_deg, p.level_db);
        }
        out
    }
}

/// How the delays for one candidate are applied.
#[derive(Debug, Clone, PartialEq)]
enum DelayStrategy {
    /// One base delay, scaled linearly along the array
    Linear(f64),
    /// An independent delay for every channel
    PerChannel(DelayVector),
}

/// Window, delay, sum and score one candidate.
fn steered_level(
    signals: &SignalMatrix,
    weights: Option<&[f64]>,
    strategy: &DelayStrategy,
) -> DasResult<f64> {
    let weighted;
    let input = match weights {
        Some(w) => {
            weighted = signals.weighted(w)?;
            &weighted
        }
        None => signals,
    };
    let aligned = match strategy {
        DelayStrategy::Linear(base) => apply_linear_delay_schedule(input, *base)?,
        DelayStrategy::PerChannel(delays) => apply_delays(input, delays)?,
    };
    to_decibels(rms(&aligned.sum_channels()))
}

/// Score every angle, keeping ascending angle order.
#[cfg_attr(not(feature = "parallel"), allow(unused_variables))]
fn scan_angles<F>(angles: &[i32], parallel: bool, level_at: F) -> DasResult<Vec<ScanPoint>>
where
    F: Fn(i32) -> DasResult<f64> + Sync + Send,
{
    let point_at = |angle_deg: i32| -> DasResult<ScanPoint> {
        let level_db = level_at(angle_deg)?;
        trace!(angle_deg, level_db, "scan step");
        Ok(ScanPoint {
            angle_deg,
            level_db,
        })
    };

    #[cfg(feature = "parallel")]
    {
        if parallel {
            return angles.par_iter().map(|&a| point_at(a)).collect();
        }
    }

    angles.iter().map(|&a| point_at(a)).collect()
}

/// Per-microphone gains, `None` for the rectangular window.
///
/// A Hann window over two microphones weights both with zero, which would
/// silence the sum, so it is rejected.
fn window_weights(window: Window, mic_count: usize) -> DasResult<Option<Vec<f64>>> {
    if window.is_rectangular() {
        return Ok(None);
    }
    if mic_count < 3 {
        return Err(DasError::InvalidArray(format!(
            "{:?} window needs at least 3 microphones, got {}",
            window, mic_count
        )));
    }
    Ok(Some(window.generate(mic_count)))
}

fn finish(model: PropagationModel, points: Vec<ScanPoint>) -> ScanResult {
    let result = ScanResult { model, points };
    if let Some(peak) = result.peak() {
        debug!(
            %model,
            angles = result.len(),
            peak_angle = peak.angle_deg,
            peak_level_db = peak.level_db,
            "scan finished"
        );
    }
    result
}

/// Beamformer for far-field sources.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneWaveBeamformer {
    config: ArrayConfig,
    parallel: bool,
}

impl PlaneWaveBeamformer {
    pub fn new(config: ArrayConfig) -> Self {
        Self {
            config,
            parallel: true,
        }
    }

    /// Dispatch scan steps over the rayon pool (default) or run them in order.
    ///
    /// Has no effect without the `parallel` feature.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn config(&self) -> &ArrayConfig {
        &self.config
    }

    /// Delay between neighbouring microphones for a wave arriving from
    /// `angle_deg`: `pitch * sin(angle) / c`, in seconds or, with
    /// `in_samples`, in samples.
    pub fn delay_for_angle(&self, angle_deg: f64, in_samples: bool) -> DasResult<f64> {
        if !(-90.0..=90.0).contains(&angle_deg) {
            return Err(DasError::Range(format!(
                "angle must be in [-90, 90], got {}",
                angle_deg
            )));
        }
        let delta_t = self.config.pitch() * angle_deg.to_radians().sin() / SPEED_OF_SOUND;
        Ok(if in_samples {
            delta_t * self.config.sample_rate()
        } else {
            delta_t
        })
    }

    /// Scan `start_angle..=stop_angle` in steps of `step` degrees.
    ///
    /// `use_window` needs at least 3 microphones.
    pub fn scan(
        &self,
        signals: &SignalMatrix,
        start_angle: i32,
        stop_angle: i32,
        step: i32,
        use_window: bool,
    ) -> DasResult<ScanResult> {
        signals.expect_channels(self.config.mic_count())?;
        if start_angle < -90 || stop_angle > 90 {
            return Err(DasError::Range(format!(
                "angle range {}..={} exceeds [-90, 90]",
                start_angle, stop_angle
            )));
        }
        // Both ends are within [-90, 90] here, so the difference cannot overflow
        if step <= 0 || start_angle > stop_angle || stop_angle - start_angle < step {
            return Err(DasError::Range(format!(
                "invalid angle range {}..={} with step {}",
                start_angle, stop_angle, step
            )));
        }

        debug!(
            start_angle,
            stop_angle,
            step,
            channels = signals.num_channels(),
            samples = signals.len(),
            use_window,
            "plane wave scan"
        );

        let weights = window_weights(Window::from_flag(use_window), self.config.mic_count())?;
        let angles: Vec<i32> = (start_angle..=stop_angle).step_by(step as usize).collect();
        let points = scan_angles(&angles, self.parallel, |angle| {
            let base = self.delay_for_angle(angle as f64, true)?;
            steered_level(signals, weights.as_deref(), &DelayStrategy::Linear(base))
        })?;
        Ok(finish(PropagationModel::Plane, points))
    }

    /// Scan the full half plane, -90° to 90° in 1° steps.
    pub fn scan_full(&self, signals: &SignalMatrix, use_window: bool) -> DasResult<ScanResult> {
        self.scan(signals, -90, 90, 1, use_window)
    }

    /// Multichannel recording of `mono` arriving as a plane wave from `angle_deg`.
    pub fn testsignals(&self, mono: &[f64], angle_deg: f64) -> DasResult<SignalMatrix> {
        let base = self.delay_for_angle(angle_deg, true)?;
        testsignal::plane_wave_testsignals(mono, self.config.mic_count(), base)
    }
}

/// Beamformer for sources on a plane at a known distance.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSourceBeamformer {
    geometry: ArrayGeometry,
    parallel: bool,
}

impl PointSourceBeamformer {
    pub fn new(config: ArrayConfig) -> Self {
        Self {
            geometry: ArrayGeometry::new(config),
            parallel: true,
        }
    }

    /// See [`PlaneWaveBeamformer::with_parallel`].
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn config(&self) -> &ArrayConfig {
        self.geometry.config()
    }

    pub fn geometry(&self) -> &ArrayGeometry {
        &self.geometry
    }

    pub fn aperture_length(&self) -> f64 {
        self.geometry.aperture_length()
    }

    /// Largest angle scanned for sources at `distance`, rounded to whole degrees.
    ///
    /// Widens towards 90° as the source plane approaches the array.
    pub fn max_angle(&self, distance: f64) -> i32 {
        self.geometry.max_detectable_angle(distance).round() as i32
    }

    /// Scan every whole angle in `[-max_angle, max_angle]` on the source
    /// plane at `distance`.
    ///
    /// `use_window` needs at least 3 microphones.
    pub fn scan(
        &self,
        signals: &SignalMatrix,
        distance: f64,
        use_window: bool,
    ) -> DasResult<ScanResult> {
        let config = self.geometry.config();
        signals.expect_channels(config.mic_count())?;
        if !(distance.is_finite() && distance > 0.0) {
            return Err(DasError::Range(format!(
                "distance to the source plane must be positive, got {}",
                distance
            )));
        }

        let max_angle = self.max_angle(distance);
        debug!(
            distance,
            max_angle,
            channels = signals.num_channels(),
            samples = signals.len(),
            use_window,
            "point source scan"
        );

        let weights = window_weights(Window::from_flag(use_window), config.mic_count())?;
        let angles: Vec<i32> = (-max_angle..=max_angle).collect();
        let points = scan_angles(&angles, self.parallel, |angle| {
            let delays = self.geometry.delays_for(angle as f64, distance, false);
            steered_level(signals, weights.as_deref(), &DelayStrategy::PerChannel(delays))
        })?;
        Ok(finish(PropagationModel::Point, points))
    }

    /// Multichannel recording of `mono` emitted at `angle_deg` on the plane at `distance`.
    pub fn testsignals(&self, mono: &[f64], angle_deg: f64, distance: f64) -> DasResult<SignalMatrix> {
        testsignal::point_source_testsignals(mono, &self.geometry, angle_deg, distance)
    }
}
