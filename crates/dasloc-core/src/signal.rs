//! Sample Delay Unit
//!
//! Whole-sample shifting, RMS measurement and decibel conversion for
//! microphone channels.
//!
//! A delay shifts a channel to the right and inserts zeros at the start. The
//! length never changes, so samples pushed past the end are lost:
//!
//! ```text
//!   input:   a b c d e f
//!   delay 2: 0 0 a b c d
//! ```
//!
//! ## Example
//!
//! ```rust
//! use dasloc_core::signal::{delay_signal, rms, to_decibels};
//!
//! let delayed = delay_signal(&[1.0, 2.0, 3.0, 4.0], 2.0).unwrap();
//! assert_eq!(delayed, vec![0.0, 0.0, 1.0, 2.0]);
//!
//! let level = rms(&[1.0, -1.0, 1.0, -1.0]);
//! assert_eq!(to_decibels(level).unwrap(), 0.0);
//! ```

use crate::types::{DasError, DasResult, DelayVector, Sample, SignalMatrix};

/// Delay a channel by a whole number of samples.
///
/// Fails with [`DasError::InvalidDelay`] if `delay_samples` has a
/// fractional part, is negative, or exceeds the channel length.
pub fn delay_signal(channel: &[Sample], delay_samples: f64) -> DasResult<Vec<Sample>> {
    let delay = checked_delay(delay_samples, channel.len())?;
    Ok(shift(channel, delay))
}

fn checked_delay(delay_samples: f64, length: usize) -> DasResult<usize> {
    let invalid = DasError::InvalidDelay {
        delay: delay_samples,
        length,
    };
    if !delay_samples.is_finite() || delay_samples.trunc() != delay_samples {
        return Err(invalid);
    }
    if delay_samples < 0.0 || delay_samples > length as f64 {
        return Err(invalid);
    }
    Ok(delay_samples as usize)
}

fn shift(channel: &[Sample], delay: usize) -> Vec<Sample> {
    let len = channel.len();
    let mut out = vec![0.0; len];
    out[delay..].copy_from_slice(&channel[..len - delay]);
    out
}

/// Root mean square over the whole signal. Zero for an empty signal.
pub fn rms(signal: &[Sample]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let mean_sq = signal.iter().map(|s| s * s).sum::<f64>() / signal.len() as f64;
    mean_sq.sqrt()
}

/// Linear amplitude to decibels: `20 * log10(level)`.
///
/// Only defined for finite positive levels; anything else is a
/// [`DasError::Domain`] error rather than `-inf` or NaN.
pub fn to_decibels(level: f64) -> DasResult<f64> {
    if !level.is_finite() || level <= 0.0 {
        return Err(DasError::Domain(level));
    }
    Ok(20.0 * level.log10())
}

/// Per-channel delays of the linear (plane-wave) schedule.
///
/// For channel `n` (1-based) of `num_channels`, the delay is
/// `round(|f(n) * base_delay|)` with `f(n) = N - n` when `base_delay > 0`
/// and `f(n) = n - 1` when `base_delay < 0`. A zero base delay yields all
/// zeros.
pub fn linear_delay_schedule(num_channels: usize, base_delay: f64) -> DelayVector {
    (1..=num_channels)
        .map(|n| {
            let factor = if base_delay > 0.0 {
                (num_channels - n) as f64
            } else if base_delay < 0.0 {
                (n - 1) as f64
            } else {
                0.0
            };
            (factor * base_delay).abs().round() as usize
        })
        .collect()
}

/// Apply the linear delay schedule for `base_delay` to every channel.
///
/// The sign of `base_delay` selects which end of the array leads; the
/// fractional part is rounded per channel.
pub fn apply_linear_delay_schedule(
    signals: &SignalMatrix,
    base_delay: f64,
) -> DasResult<SignalMatrix> {
    if !base_delay.is_finite() {
        return Err(DasError::InvalidDelay {
            delay: base_delay,
            length: signals.len(),
        });
    }
    if base_delay == 0.0 {
        return Ok(signals.clone());
    }
    let delays = linear_delay_schedule(signals.num_channels(), base_delay);
    apply_delays(signals, &delays)
}

/// Delay each channel by its own entry of `delays`.
///
/// All delays are validated before any channel is shifted.
pub fn apply_delays(signals: &SignalMatrix, delays: &[usize]) -> DasResult<SignalMatrix> {
    signals.expect_channels(delays.len())?;
    let length = signals.len();
    if let Some(&bad) = delays.iter().find(|&&d| d > length) {
        return Err(DasError::InvalidDelay {
            delay: bad as f64,
            length,
        });
    }
    let channels = signals
        .channels()
        .iter()
        .zip(delays)
        .map(|(ch, &d)| shift(ch, d))
        .collect();
    SignalMatrix::new(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_delay_is_identity() {
        let s = vec![0.3, -1.2, 4.0, 0.0, 2.5];
        assert_eq!(delay_signal(&s, 0.0).unwrap(), s);
    }

    #[test]
    fn test_delay_inserts_zeros_and_truncates() {
        let s: Vec<f64> = (1..=5).map(|i| i as f64).collect();
        let out = delay_signal(&s, 3.0).unwrap();
        assert_eq!(out, vec![0.0, 0.0, 0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_full_length_delay_zeroes_everything() {
        let s = vec![1.0; 4];
        assert_eq!(delay_signal(&s, 4.0).unwrap(), vec![0.0; 4]);
    }

    #[test]
    fn test_invalid_delays() {
        let s = vec![1.0; 8];
        for bad in [-1.0, 9.0, 1.5, f64::NAN] {
            assert!(
                matches!(delay_signal(&s, bad), Err(DasError::InvalidDelay { .. })),
                "delay {} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_rms() {
        assert_eq!(rms(&[0.0; 16]), 0.0);
        assert_relative_eq!(rms(&[-0.7; 10]), 0.7, epsilon = 1e-12);
        assert_relative_eq!(rms(&[3.0, 4.0]), (12.5f64).sqrt(), epsilon = 1e-12);
        assert_eq!(rms(&[]), 0.0);
    }

    #[test]
    fn test_rms_of_coherent_sum() {
        let x: Vec<f64> = (0..200).map(|n| (0.1 * n as f64).sin()).collect();
        let m = SignalMatrix::replicate(&x, 6);
        assert_relative_eq!(rms(&m.sum_channels()), 6.0 * rms(&x), epsilon = 1e-9);
    }

    #[test]
    fn test_to_decibels() {
        assert_eq!(to_decibels(1.0).unwrap(), 0.0);
        assert_relative_eq!(to_decibels(10.0).unwrap(), 20.0, epsilon = 1e-12);
        assert_relative_eq!(to_decibels(0.5).unwrap(), -6.0206, epsilon = 1e-4);

        let levels = [1e-6, 0.01, 0.3, 1.0, 2.0, 1e3];
        for pair in levels.windows(2) {
            assert!(to_decibels(pair[0]).unwrap() < to_decibels(pair[1]).unwrap());
        }
    }

    #[test]
    fn test_to_decibels_domain() {
        assert_eq!(to_decibels(0.0), Err(DasError::Domain(0.0)));
        assert!(matches!(to_decibels(-2.0), Err(DasError::Domain(_))));
        assert!(to_decibels(f64::INFINITY).is_err());
    }

    #[test]
    fn test_linear_schedule_positive_base() {
        // Channel 1 carries the largest delay, channel N none
        assert_eq!(linear_delay_schedule(4, 1.4), vec![4, 3, 1, 0]);
    }

    #[test]
    fn test_linear_schedule_negative_base() {
        assert_eq!(linear_delay_schedule(4, -1.4), vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_linear_schedule_zero_base_is_noop() {
        let m = SignalMatrix::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(apply_linear_delay_schedule(&m, 0.0).unwrap(), m);
    }

    #[test]
    fn test_apply_linear_schedule() {
        let m = SignalMatrix::replicate(&[1.0, 2.0, 3.0, 4.0], 3);
        let out = apply_linear_delay_schedule(&m, 1.0).unwrap();
        assert_eq!(out.channel(0).unwrap(), &[0.0, 0.0, 1.0, 2.0]);
        assert_eq!(out.channel(1).unwrap(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(out.channel(2).unwrap(), &[1.0, 2.0, 3.0, 4.0]);
        // Input left as it was
        assert_eq!(m.channel(0).unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_schedule_longer_than_signal_fails() {
        let m = SignalMatrix::replicate(&[1.0; 3], 4);
        assert!(matches!(
            apply_linear_delay_schedule(&m, 2.0),
            Err(DasError::InvalidDelay { .. })
        ));
    }

    #[test]
    fn test_apply_delays_checks_shape() {
        let m = SignalMatrix::replicate(&[1.0; 3], 2);
        assert!(matches!(
            apply_delays(&m, &[0, 1, 2]),
            Err(DasError::Shape { expected: 3, actual: 2 })
        ));
    }
}
