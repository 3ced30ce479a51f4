//! `dasloc` command-line tool
//!
//! Locates a sound source in a multichannel WAV recording of a uniform
//! linear microphone array, and synthesizes such recordings from mono
//! files. Run `dasloc --help` for the command list.

mod args;
mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use dasloc_core::audio::{read_mono_wav, read_wav, testsignal_path, write_wav, AudioError};
use dasloc_core::observe::{init_logging, LogConfig};
use dasloc_core::{
    ConfigError, DasConfig, DasError, PlaneWaveBeamformer, PointSourceBeamformer,
    PropagationModel, ScanResult,
};
use tracing::info;

use crate::args::{parse_args, ArrayArgs, CliArgs, Command, USAGE};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Engine(#[from] DasError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    match run(std::env::args().skip(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if matches!(e, CliError::Usage(_)) {
                eprintln!("\n{}", USAGE);
            }
            ExitCode::FAILURE
        }
    }
}

fn run<I: IntoIterator<Item = String>>(raw: I) -> Result<(), CliError> {
    let args = parse_args(raw)?;
    match args.command {
        Command::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        Command::ExampleConfig => {
            print!("{}", DasConfig::example_yaml());
            return Ok(());
        }
        _ => {}
    }

    let config = resolve_config(&args)?;
    init_logging(&config.logging);

    match &args.command {
        Command::LocatePlane(array) | Command::LocatePoint { array, .. } => {
            let result = locate(&array.file, &config)?;
            report(&result, &args)
        }
        Command::TestsignalPlane { array, angle } => {
            synthesize(array, &config, *angle, None, args.force)
        }
        Command::TestsignalPoint {
            array,
            angle,
            distance,
        } => synthesize(array, &config, *angle, Some(*distance), args.force),
        Command::Help | Command::ExampleConfig => Ok(()),
    }
}

fn array_of(command: &Command) -> Option<&ArrayArgs> {
    match command {
        Command::LocatePlane(array)
        | Command::LocatePoint { array, .. }
        | Command::TestsignalPlane { array, .. }
        | Command::TestsignalPoint { array, .. } => Some(array),
        Command::Help | Command::ExampleConfig => None,
    }
}

/// Configuration file values overridden by the command line.
fn resolve_config(args: &CliArgs) -> Result<DasConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => DasConfig::load_from(path)?,
        None => DasConfig::load()?,
    };

    if let Some(array) = array_of(&args.command) {
        config.array.array_length = array.array_length;
        config.array.mic_count = array.num_mics;
    }
    match &args.command {
        Command::LocatePlane(_) | Command::TestsignalPlane { .. } => {
            config.scan.model = PropagationModel::Plane;
        }
        Command::LocatePoint { distance, .. } | Command::TestsignalPoint { distance, .. } => {
            config.scan.model = PropagationModel::Point;
            config.scan.distance = *distance;
        }
        Command::Help | Command::ExampleConfig => {}
    }
    if args.window {
        config.scan.window = true;
    }
    if args.sequential {
        config.scan.parallel = false;
    }
    if args.verbose {
        config.logging = LogConfig::verbose();
    } else if args.quiet {
        config.logging = LogConfig::quiet();
    }

    config.validate()?;
    Ok(config)
}

fn locate(file: &Path, config: &DasConfig) -> Result<ScanResult, CliError> {
    let (signals, file_rate) = read_wav(file)?;
    let array = config.array.to_array_config(file_rate)?;
    let scan = &config.scan;

    let result = match scan.model {
        PropagationModel::Plane => PlaneWaveBeamformer::new(array)
            .with_parallel(scan.parallel)
            .scan(
                &signals,
                scan.start_angle,
                scan.stop_angle,
                scan.step,
                scan.window,
            )?,
        PropagationModel::Point => PointSourceBeamformer::new(array)
            .with_parallel(scan.parallel)
            .scan(&signals, scan.distance, scan.window)?,
    };
    Ok(result)
}

fn report(result: &ScanResult, args: &CliArgs) -> Result<(), CliError> {
    if let Some(peak) = result.peak() {
        println!("Source found at: {}°", peak.angle_deg);
        info!(angle = peak.angle_deg, level_db = peak.level_db, "source located");
    }
    print!("{}", render::render_chart(result));

    if let Some(path) = &args.csv {
        write_output(path, result.to_csv())?;
    }
    if let Some(path) = &args.json {
        write_output(path, serde_json::to_string_pretty(result)?)?;
    }
    Ok(())
}

fn write_output(path: &Path, content: String) -> Result<(), CliError> {
    std::fs::write(path, content).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "wrote directional response");
    Ok(())
}

fn synthesize(
    array: &ArrayArgs,
    config: &DasConfig,
    angle: i32,
    distance: Option<f64>,
    force: bool,
) -> Result<(), CliError> {
    let (mono, file_rate) = read_mono_wav(&array.file)?;
    let array_config = config.array.to_array_config(file_rate)?;
    let sample_rate = array_config.sample_rate();

    let signals = match distance {
        None => PlaneWaveBeamformer::new(array_config).testsignals(&mono, f64::from(angle))?,
        Some(distance) => {
            PointSourceBeamformer::new(array_config).testsignals(&mono, f64::from(angle), distance)?
        }
    };

    let output = testsignal_path(&array.file, angle, array.num_mics, array.array_length);
    write_wav(&output, &signals, sample_rate, force)?;
    println!("Wrote {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dasloc_core::testsignal::create_sine;
    use dasloc_core::SignalMatrix;

    fn run_line(line: &str) -> Result<(), CliError> {
        run(line.split_whitespace().map(String::from))
    }

    fn write_tone(dir: &Path) -> PathBuf {
        let path = dir.join("tone.wav");
        let tone = create_sine(1_000.0, 4_800, 48_000.0).unwrap();
        write_wav(&path, &SignalMatrix::replicate(&tone, 1), 48_000.0, false).unwrap();
        path
    }

    fn empty_config(dir: &Path) -> PathBuf {
        let path = dir.join("dasloc.yaml");
        std::fs::write(&path, "{}\n").unwrap();
        path
    }

    #[test]
    fn test_plane_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let tone = write_tone(dir.path());
        let config = empty_config(dir.path());

        run_line(&format!(
            "testsignal-plane {} 8 0.35 30 --config {}",
            tone.display(),
            config.display()
        ))
        .unwrap();
        let recording = dir.path().join("tone_30deg_8mics_0.35m.wav");
        assert!(recording.exists());

        let csv = dir.path().join("response.csv");
        let json = dir.path().join("response.json");
        run_line(&format!(
            "locate-plane {} 8 0.35 --config {} --csv {} --json {} -q",
            recording.display(),
            config.display(),
            csv.display(),
            json.display()
        ))
        .unwrap();

        let table = std::fs::read_to_string(&csv).unwrap();
        assert!(table.starts_with("angle_deg,level_db\n"));
        assert_eq!(table.lines().count(), 182);

        let result: ScanResult =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        let peak = result.peak().unwrap().angle_deg;
        assert!((peak - 30).abs() <= 1, "peak at {}", peak);
    }

    #[test]
    fn test_point_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let tone = write_tone(dir.path());
        let config = empty_config(dir.path());

        run_line(&format!(
            "testsignal-point {} 8 0.35 -15 1 --config {}",
            tone.display(),
            config.display()
        ))
        .unwrap();
        let recording = dir.path().join("tone_-15deg_8mics_0.35m.wav");

        let json = dir.path().join("response.json");
        run_line(&format!(
            "locate-point {} 8 0.35 1 --sequential --config {} --json {}",
            recording.display(),
            config.display(),
            json.display()
        ))
        .unwrap();

        let result: ScanResult =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(result.model, PropagationModel::Point);
        let peak = result.peak().unwrap().angle_deg;
        assert!((peak + 15).abs() <= 1, "peak at {}", peak);
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let tone = write_tone(dir.path());
        let config = empty_config(dir.path());
        let line = format!(
            "testsignal-plane {} 8 0.35 10 --config {}",
            tone.display(),
            config.display()
        );

        run_line(&line).unwrap();
        assert!(matches!(
            run_line(&line),
            Err(CliError::Audio(AudioError::AlreadyExists(_)))
        ));
        run_line(&format!("{} --force", line)).unwrap();
    }

    #[test]
    fn test_channel_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let tone = write_tone(dir.path());
        let config = empty_config(dir.path());
        let err = run_line(&format!(
            "locate-plane {} 8 0.35 --config {}",
            tone.display(),
            config.display()
        ))
        .unwrap_err();
        assert!(matches!(err, CliError::Engine(ref e) if e.is_shape_error()));
    }

    #[test]
    fn test_invalid_array_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tone = write_tone(dir.path());
        let config = empty_config(dir.path());
        let err = run_line(&format!(
            "locate-point {} 8 0.35 0 --config {}",
            tone.display(),
            config.display()
        ))
        .unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::ValidationError(_))));
    }
}
