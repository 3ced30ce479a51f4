//! Core types for delay-and-sum localization
//!
//! This module defines the multichannel signal container shared by every
//! stage of the engine and the error type all engine operations report.
//!
//! ## Signal Layout
//!
//! Audio files store samples as interleaved frames (one sample per
//! microphone, then the next instant). The engine works channel by channel,
//! so a [`SignalMatrix`] keeps one contiguous buffer per microphone:
//!
//! ```text
//!  interleaved:  m0[0] m1[0] m2[0] | m0[1] m1[1] m2[1] | ...
//!
//!  SignalMatrix: channel 0 → m0[0] m0[1] m0[2] ...
//!                channel 1 → m1[0] m1[1] m1[2] ...
//!                channel 2 → m2[0] m2[1] m2[2] ...
//! ```

/// Speed of sound in air used by every delay computation, in m/s.
pub const SPEED_OF_SOUND: f64 = 340.0;

/// A real-valued audio sample
pub type Sample = f64;

/// Whole-sample delay per channel.
///
/// At least one entry is zero; every other entry is positive.
pub type DelayVector = Vec<usize>;

/// Result type for engine operations
pub type DasResult<T> = Result<T, DasError>;

/// Errors reported by the beamforming engine.
///
/// All of them are input validation failures, raised before any data is
/// touched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DasError {
    #[error("Signal shape mismatch: expected {expected} channels, got {actual}")]
    Shape { expected: usize, actual: usize },

    #[error("Ragged signal matrix: channel {channel} has {actual} samples, expected {expected}")]
    RaggedChannels {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Out of range: {0}")]
    Range(String),

    #[error("Invalid delay {delay}: must be a whole number of samples in [0, {length}]")]
    InvalidDelay { delay: f64, length: usize },

    #[error("Domain error: cannot convert {0} to decibels")]
    Domain(f64),

    #[error("Invalid array configuration: {0}")]
    InvalidArray(String),
}

impl DasError {
    /// True for the channel-count and ragged-matrix errors.
    pub fn is_shape_error(&self) -> bool {
        matches!(self, DasError::Shape { .. } | DasError::RaggedChannels { .. })
    }
}

/// Multichannel real signal, one buffer per microphone, all the same length.
///
/// Operations never modify a matrix in place; they return new matrices, so
/// scan iterations cannot interfere with each other.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalMatrix {
    channels: Vec<Vec<Sample>>,
}

impl SignalMatrix {
    /// Build a matrix from per-channel buffers.
    ///
    /// Fails if the channels differ in length.
    pub fn new(channels: Vec<Vec<Sample>>) -> DasResult<Self> {
        if let Some(first) = channels.first() {
            let expected = first.len();
            if let Some((channel, ch)) = channels
                .iter()
                .enumerate()
                .find(|(_, ch)| ch.len() != expected)
            {
                return Err(DasError::RaggedChannels {
                    channel,
                    expected,
                    actual: ch.len(),
                });
            }
        }
        Ok(Self { channels })
    }

    /// De-interleave frames of `num_channels` samples.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(data: &[Sample], num_channels: usize) -> DasResult<Self> {
        if num_channels == 0 {
            return Err(DasError::Shape {
                expected: 1,
                actual: 0,
            });
        }
        let frames = data.len() / num_channels;
        let channels = (0..num_channels)
            .map(|c| (0..frames).map(|f| data[f * num_channels + c]).collect())
            .collect();
        Ok(Self { channels })
    }

    /// Copy one mono signal onto `num_channels` identical channels.
    pub fn replicate(mono: &[Sample], num_channels: usize) -> Self {
        Self {
            channels: vec![mono.to_vec(); num_channels],
        }
    }

    /// Interleave the channels back into frames.
    pub fn to_interleaved(&self) -> Vec<Sample> {
        let mut out = Vec::with_capacity(self.num_channels() * self.len());
        for i in 0..self.len() {
            out.extend(self.channels.iter().map(|ch| ch[i]));
        }
        out
    }

    /// Number of channels (microphones).
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel(&self, index: usize) -> Option<&[Sample]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> &[Vec<Sample>] {
        &self.channels
    }

    pub fn into_channels(self) -> Vec<Vec<Sample>> {
        self.channels
    }

    /// Fail with [`DasError::Shape`] unless there are exactly `expected` channels.
    pub fn expect_channels(&self, expected: usize) -> DasResult<()> {
        if self.num_channels() != expected {
            return Err(DasError::Shape {
                expected,
                actual: self.num_channels(),
            });
        }
        Ok(())
    }

    /// Sample-wise sum of all channels.
    pub fn sum_channels(&self) -> Vec<Sample> {
        let mut sum = vec![0.0; self.len()];
        for ch in &self.channels {
            for (acc, &s) in sum.iter_mut().zip(ch) {
                *acc += s;
            }
        }
        sum
    }

    /// Scale each channel by its own gain.
    pub fn weighted(&self, gains: &[f64]) -> DasResult<Self> {
        self.expect_channels(gains.len())?;
        let channels = self
            .channels
            .iter()
            .zip(gains)
            .map(|(ch, &g)| ch.iter().map(|&s| s * g).collect())
            .collect();
        Ok(Self { channels })
    }

    /// Reverse the channel order.
    pub fn reversed(&self) -> Self {
        Self {
            channels: self.channels.iter().rev().cloned().collect(),
        }
    }
}
