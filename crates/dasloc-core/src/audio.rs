//! WAV audio adapter
//!
//! Reads array recordings from WAV files into a [`SignalMatrix`] and writes
//! synthetic recordings back out. Integer PCM is normalised to `[-1, 1)`,
//! float samples are taken as they are. Output is always 32-bit float.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dasloc_core::audio::{read_wav, write_wav};
//!
//! let (signals, sample_rate) = read_wav("array_recording.wav").unwrap();
//! println!("{} channels at {} Hz", signals.num_channels(), sample_rate);
//! write_wav("copy.wav", &signals, sample_rate, true).unwrap();
//! ```

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::{DasError, Sample, SignalMatrix};

/// Result type for audio file operations
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors raised while reading or writing audio files
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("WAV error in {path}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("Only mono files can be used, {path} has {channels} channels")]
    NotMono { path: PathBuf, channels: u16 },

    #[error("Refusing to overwrite existing file {0}")]
    AlreadyExists(PathBuf),

    #[error("Unsupported sample format: {bits} bit {format:?}")]
    UnsupportedFormat {
        bits: u16,
        format: hound::SampleFormat,
    },

    #[error("Invalid signal data: {0}")]
    Signal(#[from] DasError),
}

fn wav_error(path: &Path) -> impl FnOnce(hound::Error) -> AudioError + '_ {
    move |source| AudioError::Wav {
        path: path.to_path_buf(),
        source,
    }
}

/// Read a multichannel WAV file.
///
/// Returns the channels and the sample rate in Hz.
pub fn read_wav(path: impl AsRef<Path>) -> AudioResult<(SignalMatrix, f64)> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path).map_err(wav_error(path))?;
    let spec = reader.spec();

    let interleaved: Vec<Sample> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<_, _>>()
            .map_err(wav_error(path))?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                return Err(AudioError::UnsupportedFormat {
                    bits: spec.bits_per_sample,
                    format: spec.sample_format,
                });
            }
            let scale = 2f64.powi(i32::from(spec.bits_per_sample) - 1);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / scale))
                .collect::<Result<_, _>>()
                .map_err(wav_error(path))?
        }
    };

    let signals = SignalMatrix::from_interleaved(&interleaved, usize::from(spec.channels))?;
    debug!(
        path = %path.display(),
        channels = signals.num_channels(),
        samples = signals.len(),
        sample_rate = spec.sample_rate,
        "read wav"
    );
    Ok((signals, f64::from(spec.sample_rate)))
}

/// Read a single-channel WAV file.
///
/// Fails with [`AudioError::NotMono`] for anything with more channels.
pub fn read_mono_wav(path: impl AsRef<Path>) -> AudioResult<(Vec<Sample>, f64)> {
    let path = path.as_ref();
    let (signals, sample_rate) = read_wav(path)?;
    if signals.num_channels() != 1 {
        return Err(AudioError::NotMono {
            path: path.to_path_buf(),
            channels: u16::try_from(signals.num_channels()).unwrap_or(u16::MAX),
        });
    }
    let mono = signals.into_channels().into_iter().next().unwrap_or_default();
    Ok((mono, sample_rate))
}

/// Write `signals` as a 32-bit float WAV file.
///
/// An existing file is only replaced when `overwrite` is set.
pub fn write_wav(
    path: impl AsRef<Path>,
    signals: &SignalMatrix,
    sample_rate: f64,
    overwrite: bool,
) -> AudioResult<()> {
    let path = path.as_ref();
    if path.exists() && !overwrite {
        return Err(AudioError::AlreadyExists(path.to_path_buf()));
    }
    let channels = u16::try_from(signals.num_channels()).map_err(|_| {
        AudioError::Signal(DasError::InvalidArray(format!(
            "{} channels do not fit a WAV file",
            signals.num_channels()
        )))
    })?;
    let spec = hound::WavSpec {
        channels,
        sample_rate: sample_rate.round() as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(wav_error(path))?;
    for sample in signals.to_interleaved() {
        writer
            .write_sample(sample as f32)
            .map_err(wav_error(path))?;
    }
    writer.finalize().map_err(wav_error(path))?;

    debug!(
        path = %path.display(),
        channels,
        samples = signals.len(),
        "wrote wav"
    );
    Ok(())
}

/// Output path for a synthetic recording made from `input`:
/// `<stem>_<angle>deg_<mics>mics_<length>m.wav` next to the input file.
/// Whole lengths keep their decimal point (`1.0m`).
pub fn testsignal_path(input: &Path, angle_deg: i32, mic_count: usize, array_length: f64) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!(
        "{}_{}deg_{}mics_{:?}m.wav",
        stem, angle_deg, mic_count, array_length
    );
    input.with_file_name(name)
}
