//! autoplaylist - order a directory of audio files into a smooth-flowing playlist.
//!
//! Every recognised audio file under the directory is analysed (tempo, tuning,
//! energy, timbre) and the files are printed to stdout in playback order, one
//! path per line. Diagnostics go to stderr.

use autoplaylist::{Config, ConfigError, PlaylistDriver};
use clap::{ArgAction, Parser};
use std::error::Error;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "autoplaylist")]
#[command(about = "Order audio files so consecutive tracks sound alike")]
#[command(version)]
struct Args {
    /// Directory to scan for audio files
    #[arg(default_value = "songs")]
    directory: PathBuf,

    /// Audio file extension to include; repeat to give several (replaces mp3, wav, flac)
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Leave out files that cannot be analysed instead of failing the run
    #[arg(long)]
    skip_errors: bool,

    /// Which track wins when both transitions score the same (left or right)
    #[arg(long, value_name = "SIDE")]
    tie_break: Option<String>,

    /// Number of files analysed in parallel
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Number of MFCC coefficients in each timbral fingerprint
    #[arg(long, value_name = "N")]
    fingerprint_size: Option<usize>,

    /// Read defaults from FILE instead of ~/.state/autoplaylist/defaults.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Save the given options as defaults and exit
    #[arg(long)]
    save_defaults: bool,

    /// Show the effective configuration and exit
    #[arg(long)]
    show_config: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Only the options actually given on the command line.
    fn to_config(&self) -> Config {
        Config {
            extensions: (!self.extensions.is_empty()).then(|| self.extensions.clone()),
            on_error: self.skip_errors.then(|| "skip".to_string()),
            tie_break: self.tie_break.clone(),
            jobs: self.jobs,
            fingerprint_size: self.fingerprint_size,
        }
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report_error(context: &str, err: &dyn Error) {
    eprintln!("{}: {}", context, err);
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

fn load_saved_config(explicit: Option<&PathBuf>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => Config::load_from(path),
        None => match Config::load() {
            Err(ConfigError::NoHome) => Ok(Config::new()),
            other => other,
        },
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    let saved_config = match load_saved_config(args.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            report_error("Error loading defaults", &e);
            process::exit(1);
        }
    };

    let mut config = saved_config.clone();
    config.merge(&args.to_config());

    if args.save_defaults {
        // Refuse to persist anything that would not resolve
        if let Err(e) = config.resolve() {
            report_error("Invalid configuration", &e);
            process::exit(1);
        }

        let saved = match &args.config {
            Some(path) => config.save_to(path).map(|_| path.clone()),
            None => config.save(),
        };
        match saved {
            Ok(path) => {
                eprintln!("Defaults saved to {}", path.display());
                config.print("Saved configuration");
                process::exit(0);
            }
            Err(e) => {
                report_error("Error saving defaults", &e);
                process::exit(1);
            }
        }
    }

    if args.show_config {
        config.print("Effective configuration");
        process::exit(0);
    }

    let options = match config.resolve() {
        Ok(options) => options,
        Err(e) => {
            report_error("Invalid configuration", &e);
            process::exit(1);
        }
    };

    let driver = PlaylistDriver::from_options(options);
    let playlist = match driver.build(&args.directory) {
        Ok(playlist) => playlist,
        Err(e) => {
            report_error("Error", &e);
            process::exit(1);
        }
    };

    for path in &playlist.entries {
        println!("{}", path.display());
    }

    if !playlist.skipped.is_empty() {
        eprintln!();
        eprintln!("Skipped {} file(s):", playlist.skipped.len());
        for err in &playlist.skipped {
            eprintln!("  {}", err);
        }
    }
}
