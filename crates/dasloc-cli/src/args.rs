//! Command-line parsing.

use std::path::PathBuf;

use crate::CliError;

pub const USAGE: &str = "\
Usage: dasloc <command> [options]

Commands:
  locate-plane <file> <num_mics> <array_length>             Locate a far-field source
  locate-point <file> <num_mics> <array_length> <distance>  Locate a source on a plane at <distance> m
  testsignal-plane <mono.wav> <num_mics> <array_length> <angle>
                                                            Synthesize a plane wave recording
  testsignal-point <mono.wav> <num_mics> <array_length> <angle> <distance>
                                                            Synthesize a point source recording
  example-config                                            Print an example configuration

Options:
  -w, --window        Apply a Hann window across the microphones
      --config <path> Read configuration from <path>
      --csv <path>    Write the directional response as CSV
      --json <path>   Write the directional response as JSON
      --force         Overwrite existing output files
      --sequential    Scan angles on one thread
  -v, --verbose       Log scan progress
  -q, --quiet         Only log errors
  -h, --help          Show this help";

/// Array parameters shared by all subcommands.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayArgs {
    pub file: PathBuf,
    pub num_mics: usize,
    pub array_length: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LocatePlane(ArrayArgs),
    LocatePoint { array: ArrayArgs, distance: f64 },
    TestsignalPlane { array: ArrayArgs, angle: i32 },
    TestsignalPoint { array: ArrayArgs, angle: i32, distance: f64 },
    ExampleConfig,
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub command: Command,
    pub config: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub window: bool,
    pub force: bool,
    pub sequential: bool,
    pub verbose: bool,
    pub quiet: bool,
}

fn usage(msg: impl Into<String>) -> CliError {
    CliError::Usage(msg.into())
}

fn parse_value<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, CliError> {
    raw.parse()
        .map_err(|_| usage(format!("invalid value for <{}>: '{}'", name, raw)))
}

fn expect_positionals(command: &str, positionals: &[String], names: &[&str]) -> Result<(), CliError> {
    if positionals.len() != names.len() {
        let expected: Vec<String> = names.iter().map(|n| format!("<{}>", n)).collect();
        return Err(usage(format!(
            "{} expects {}, got {} argument(s)",
            command,
            expected.join(" "),
            positionals.len()
        )));
    }
    Ok(())
}

fn array_args(positionals: &[String]) -> Result<ArrayArgs, CliError> {
    Ok(ArrayArgs {
        file: PathBuf::from(&positionals[0]),
        num_mics: parse_value("num_mics", &positionals[1])?,
        array_length: parse_value("array_length", &positionals[2])?,
    })
}

/// Parse the arguments following the program name.
pub fn parse_args<I>(args: I) -> Result<CliArgs, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut positionals = Vec::new();
    let mut parsed = CliArgs {
        command: Command::Help,
        config: None,
        csv: None,
        json: None,
        window: false,
        force: false,
        sequential: false,
        verbose: false,
        quiet: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let mut path_for = |flag: &str| {
            iter.next()
                .map(PathBuf::from)
                .ok_or_else(|| usage(format!("{} requires a path", flag)))
        };
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliArgs { command: Command::Help, ..parsed }),
            "-w" | "--window" => parsed.window = true,
            "--force" => parsed.force = true,
            "--sequential" => parsed.sequential = true,
            "-v" | "--verbose" => parsed.verbose = true,
            "-q" | "--quiet" => parsed.quiet = true,
            "--config" => parsed.config = Some(path_for("--config")?),
            "--csv" => parsed.csv = Some(path_for("--csv")?),
            "--json" => parsed.json = Some(path_for("--json")?),
            flag if flag.starts_with("--") => {
                return Err(usage(format!("unknown option '{}'", flag)));
            }
            _ => positionals.push(arg),
        }
    }

    let Some((command, rest)) = positionals.split_first() else {
        return Ok(parsed);
    };

    parsed.command = match command.as_str() {
        "locate-plane" => {
            expect_positionals(command, rest, &["file", "num_mics", "array_length"])?;
            Command::LocatePlane(array_args(rest)?)
        }
        "locate-point" => {
            expect_positionals(command, rest, &["file", "num_mics", "array_length", "distance"])?;
            Command::LocatePoint {
                array: array_args(rest)?,
                distance: parse_value("distance", &rest[3])?,
            }
        }
        "testsignal-plane" => {
            expect_positionals(command, rest, &["file", "num_mics", "array_length", "angle"])?;
            Command::TestsignalPlane {
                array: array_args(rest)?,
                angle: parse_value("angle", &rest[3])?,
            }
        }
        "testsignal-point" => {
            expect_positionals(
                command,
                rest,
                &["file", "num_mics", "array_length", "angle", "distance"],
            )?;
            Command::TestsignalPoint {
                array: array_args(rest)?,
                angle: parse_value("angle", &rest[3])?,
                distance: parse_value("distance", &rest[4])?,
            }
        }
        "example-config" => {
            expect_positionals(command, rest, &[])?;
            Command::ExampleConfig
        }
        other => return Err(usage(format!("unknown command '{}'", other))),
    };

    Ok(parsed)
}
