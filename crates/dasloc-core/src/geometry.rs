//! Uniform Linear Array Geometry
//!
//! Microphone and source positions in the plane of the array, and the
//! propagation delays that follow from them.
//!
//! ```text
//!                    source (tan(α)·d, d)
//!                       *
//!                      /|
//!                     / |
//!                    /  | d
//!                   / α |
//!   depth 0 --o----o----+----o----o--   microphones, centred on the midpoint
//!           -L/2             +L/2       L = pitch · (mic_count − 1)
//! ```
//!
//! Channel 1 sits at `-L/2` and the last channel at `+L/2`. A positive angle
//! puts the source on the side of the last channel.

use serde::{Deserialize, Serialize};

use crate::types::{DasError, DasResult, DelayVector, SPEED_OF_SOUND};

/// Uniform linear array parameters.
///
/// Deserialized values go through the same checks as [`ArrayConfig::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawArrayConfig")]
pub struct ArrayConfig {
    pitch: f64,
    mic_count: usize,
    sample_rate: f64,
}

#[derive(Deserialize)]
struct RawArrayConfig {
    pitch: f64,
    mic_count: usize,
    sample_rate: f64,
}

impl TryFrom<RawArrayConfig> for ArrayConfig {
    type Error = DasError;

    fn try_from(raw: RawArrayConfig) -> DasResult<Self> {
        Self::new(raw.pitch, raw.mic_count, raw.sample_rate)
    }
}

impl ArrayConfig {
    /// Create an array description.
    ///
    /// - `pitch`: distance between neighbouring microphones in meters
    /// - `mic_count`: number of microphones (at least 2)
    /// - `sample_rate`: sampling rate in Hz
    pub fn new(pitch: f64, mic_count: usize, sample_rate: f64) -> DasResult<Self> {
        if !(pitch.is_finite() && pitch > 0.0) {
            return Err(DasError::InvalidArray(format!(
                "pitch must be positive, got {}",
                pitch
            )));
        }
        if mic_count < 2 {
            return Err(DasError::InvalidArray(format!(
                "at least 2 microphones required, got {}",
                mic_count
            )));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DasError::InvalidArray(format!(
                "sample rate must be positive, got {}",
                sample_rate
            )));
        }
        Ok(Self {
            pitch,
            mic_count,
            sample_rate,
        })
    }

    /// Create an array from its total length: `pitch = array_length / (mic_count - 1)`.
    pub fn from_array_length(array_length: f64, mic_count: usize, sample_rate: f64) -> DasResult<Self> {
        if mic_count < 2 {
            return Err(DasError::InvalidArray(format!(
                "at least 2 microphones required, got {}",
                mic_count
            )));
        }
        Self::new(array_length / (mic_count - 1) as f64, mic_count, sample_rate)
    }

    pub fn pitch(&self) -> f64 {
        self.pitch
    }

    pub fn mic_count(&self) -> usize {
        self.mic_count
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Distance between the first and last microphone.
    pub fn aperture_length(&self) -> f64 {
        self.pitch * (self.mic_count - 1) as f64
    }
}

/// A point in the array plane, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Offset along the array axis
    pub lateral: f64,
    /// Distance in front of the array
    pub depth: f64,
}

impl Position {
    pub fn new(lateral: f64, depth: f64) -> Self {
        Self { lateral, depth }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.lateral - other.lateral).hypot(self.depth - other.depth)
    }
}

/// Positions of `round(aperture_length / pitch) + 1` microphones spaced by
/// `pitch`, centred on the array midpoint, all at depth 0.
pub fn mic_positions(aperture_length: f64, pitch: f64) -> Vec<Position> {
    let count = (aperture_length / pitch).round() as usize + 1;
    let half = aperture_length / 2.0;
    (0..count)
        .map(|i| Position::new(-half + i as f64 * pitch, 0.0))
        .collect()
}

/// Source on the plane parallel to the array at `distance`, seen under
/// `angle_deg` from the array midpoint.
pub fn source_position(angle_deg: f64, distance: f64) -> Position {
    Position::new(angle_deg.to_radians().tan() * distance, distance)
}

/// Path length difference of each microphone to the source, in samples.
///
/// The closest microphone gets 0.
pub fn path_delays(mics: &[Position], source: &Position, sample_rate: f64) -> Vec<f64> {
    let distances: Vec<f64> = mics.iter().map(|m| m.distance_to(source)).collect();
    let nearest = distances.iter().copied().fold(f64::INFINITY, f64::min);
    distances
        .iter()
        .map(|d| (d - nearest) / SPEED_OF_SOUND * sample_rate)
        .collect()
}

/// Whole-sample delay per microphone for a source at `source`.
///
/// Each path delay is rounded to the nearest sample. Without `invert` the
/// closest microphone gets 0 and the others are positive. With `invert`
/// the vector is reflected (`max - d`), so the closest microphone gets the
/// largest delay and the farthest gets 0. The two vectors add up to the
/// same total on every channel.
pub fn mic_delays(
    mics: &[Position],
    source: &Position,
    sample_rate: f64,
    invert: bool,
) -> DelayVector {
    let delays: DelayVector = path_delays(mics, source, sample_rate)
        .into_iter()
        .map(|d| d.round() as usize)
        .collect();
    if !invert {
        return delays;
    }
    let max = delays.iter().copied().max().unwrap_or(0);
    delays.iter().map(|&d| max - d).collect()
}

/// Largest angle (degrees) worth scanning for sources at `distance`:
/// `atan(aperture_length / distance)`.
///
/// Beyond it the projected source position runs off towards infinity.
pub fn max_detectable_angle(aperture_length: f64, distance: f64) -> f64 {
    (aperture_length / distance).atan().to_degrees()
}

/// An array together with its microphone positions.
///
/// The positions only depend on the configuration, so they are computed once
/// and reused for every candidate source.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayGeometry {
    config: ArrayConfig,
    mics: Vec<Position>,
}

impl ArrayGeometry {
    pub fn new(config: ArrayConfig) -> Self {
        let mics = mic_positions(config.aperture_length(), config.pitch());
        Self { config, mics }
    }

    pub fn config(&self) -> &ArrayConfig {
        &self.config
    }

    pub fn mic_positions(&self) -> &[Position] {
        &self.mics
    }

    pub fn aperture_length(&self) -> f64 {
        self.config.aperture_length()
    }

    /// Delays for a source at `angle_deg` on the plane at `distance`.
    pub fn delays_for(&self, angle_deg: f64, distance: f64, invert: bool) -> DelayVector {
        let source = source_position(angle_deg, distance);
        mic_delays(&self.mics, &source, self.config.sample_rate(), invert)
    }

    /// [`max_detectable_angle`] for this array, in degrees.
    pub fn max_detectable_angle(&self, distance: f64) -> f64 {
        max_detectable_angle(self.aperture_length(), distance)
    }
}
