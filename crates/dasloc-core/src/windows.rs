//! Aperture Windows
//!
//! Weights applied across the microphones of the array (one gain per
//! channel, not per sample). Tapering the edge elements lowers the
//! sidelobes of the directional response at the cost of a wider main lobe.
//!
//! | Window      | Edge weight | Sidelobe Level |
//! |-------------|-------------|----------------|
//! | Rectangular | 1.0         | -13 dB         |
//! | Hann        | 0.0         | -32 dB         |

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Aperture window type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    /// Uniform weights (no tapering)
    #[default]
    Rectangular,
    /// Hann window: 0.5*(1 - cos(2πn/(N-1)))
    Hann,
}

impl Window {
    /// `Hann` when `use_window` is set, `Rectangular` otherwise.
    pub fn from_flag(use_window: bool) -> Self {
        if use_window {
            Window::Hann
        } else {
            Window::Rectangular
        }
    }

    /// Generate one weight per microphone.
    pub fn generate(&self, length: usize) -> Vec<f64> {
        match self {
            Window::Rectangular => vec![1.0; length],
            Window::Hann => hann_window(length),
        }
    }

    pub fn is_rectangular(&self) -> bool {
        matches!(self, Window::Rectangular)
    }
}

/// Generate a symmetric Hann window.
///
/// w[n] = 0.5 * (1 - cos(2πn/(N-1)))
///
/// Both end points are zero, so the outermost microphones drop out of the sum.
pub fn hann_window(length: usize) -> Vec<f64> {
    if length == 0 {
        return vec![];
    }
    if length == 1 {
        return vec![1.0];
    }

    let n_minus_1 = (length - 1) as f64;
    (0..length)
        .map(|n| 0.5 * (1.0 - (2.0 * PI * n as f64 / n_minus_1).cos()))
        .collect()
}
