//! Command-line argument parsing.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Arg, Command, value_parser};

/// The four positional arguments of the mirror binary.
#[derive(Clone, Debug)]
pub struct MirrorArgs {
    /// Directory tree to watch.
    pub source: PathBuf,
    /// Directory tree to mirror into.
    pub replica: PathBuf,
    /// Time between polls.
    pub interval: Duration,
    /// Path of the log file.
    pub log_file: PathBuf,
}

fn command() -> Command {
    Command::new("dirsync")
        .about("One-way directory mirror: replays source changes onto a replica")
        .arg(
            Arg::new("source")
                .value_name("SOURCE_DIR")
                .help("Directory tree to watch")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("replica")
                .value_name("REPLICA_DIR")
                .help("Directory tree the changes are replayed onto")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("interval")
                .value_name("INTERVAL_SECONDS")
                .help("Whole seconds between polls, at least 1")
                .required(true)
                .value_parser(value_parser!(u64).range(1..)),
        )
        .arg(
            Arg::new("log-file")
                .value_name("LOG_FILE")
                .help("Path of the log file")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
}

/// Parses the process arguments into [`MirrorArgs`].
///
/// # Errors
///
/// Returns the [`clap::Error`] describing the malformed invocation; rendering
/// it yields the usage message shown to the user.
pub fn parse_args<I, T>(args: I) -> Result<MirrorArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;
    let seconds = *matches
        .get_one::<u64>("interval")
        .expect("required argument");
    Ok(MirrorArgs {
        source: matches
            .get_one::<PathBuf>("source")
            .expect("required argument")
            .clone(),
        replica: matches
            .get_one::<PathBuf>("replica")
            .expect("required argument")
            .clone(),
        interval: Duration::from_secs(seconds),
        log_file: matches
            .get_one::<PathBuf>("log-file")
            .expect("required argument")
            .clone(),
    })
}
