//! # Delay-and-Sum Source Localization
//!
//! Estimates the direction of a single acoustic source from the signals of
//! a uniform linear microphone array.
//!
//! ## Overview
//!
//! For every candidate direction the channels are delayed so that a wave
//! from that direction would line up, summed, and scored by the RMS level of
//! the sum. The direction with the highest level is the source direction.
//!
//! - **Sample delays**: whole-sample shifting, RMS and dB conversion
//! - **Geometry**: microphone and source positions, propagation delays
//! - **Plane wave scan**: far-field sources, linear delay schedule
//! - **Point source scan**: sources at a known distance, per-microphone delays
//!
//! ## Signal Flow
//!
//! ```text
//! WAV → SignalMatrix → [window] → delay(α) → Σ channels → RMS → dB → level(α)
//!                                    ↑                                  │
//!                             candidate angle α ◄──── next α ◄──────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use dasloc_core::prelude::*;
//!
//! let config = ArrayConfig::from_array_length(0.35, 8, 48_000.0).unwrap();
//! let bf = PointSourceBeamformer::new(config);
//!
//! let tone = create_sine(1000.0, 4800, 48_000.0).unwrap();
//! let signals = bf.testsignals(&tone, -15.0, 1.0).unwrap();
//!
//! let response = bf.scan(&signals, 1.0, false).unwrap();
//! assert_eq!(response.angle_bound(), bf.max_angle(1.0));
//! println!("Source found at: {}°", response.peak().unwrap().angle_deg);
//! ```

pub mod beamformer;
pub mod config;
pub mod geometry;
pub mod observe;
pub mod signal;
pub mod testsignal;
pub mod types;
pub mod windows;

// WAV file I/O (requires `wav` feature)
#[cfg(feature = "wav")]
pub mod audio;

// Re-export main types
pub use beamformer::{
    PlaneWaveBeamformer, PointSourceBeamformer, PropagationModel, ScanPoint, ScanResult,
};
pub use config::{ConfigError, DasConfig};
pub use geometry::{ArrayConfig, ArrayGeometry, Position};
pub use types::{DasError, DasResult, DelayVector, SignalMatrix, SPEED_OF_SOUND};
pub use windows::Window;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::beamformer::{
        PlaneWaveBeamformer, PointSourceBeamformer, PropagationModel, ScanPoint, ScanResult,
    };
    pub use crate::geometry::{ArrayConfig, ArrayGeometry};
    pub use crate::signal::{delay_signal, rms, to_decibels};
    pub use crate::testsignal::create_sine;
    pub use crate::types::{DasError, DasResult, SignalMatrix};
}
