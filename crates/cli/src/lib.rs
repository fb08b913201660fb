#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` is the command-line entry point of the directory mirror. It parses
//! the four positional arguments, constructs the process-wide logger and
//! watcher, wires the interrupt signals to an orderly shutdown, and maps
//! every startup failure to a stable process exit code.
//!
//! # Design
//!
//! - [`run_with`] is the testable entry: it takes the raw argument iterator
//!   and an error stream, and returns the [`std::process::ExitCode`] the
//!   binary hands back to the operating system. `main` is a thin wrapper.
//! - Configuration errors exit before any watcher is constructed. Everything
//!   after construction is reported through the logger.
//! - Signal handlers only store an atomic flag; the controlling thread polls
//!   it, stops the worker, and waits for it before exiting with success.
//!
//! # Errors
//!
//! Startup failures map onto [`ExitCode`]: bad invocations to
//! [`ExitCode::Syntax`], an unusable source directory to
//! [`ExitCode::FileSelect`], an uncreatable log file to
//! [`ExitCode::LogFile`], and remaining I/O failures to [`ExitCode::FileIo`].

mod args;
mod exit_code;
mod signal;

pub use args::{MirrorArgs, parse_args};
pub use exit_code::ExitCode;
pub use signal::{interrupted, request_interrupt};

use std::ffi::OsString;
use std::io::Write;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use engine::{EngineError, ReplicaReconciler, Watcher};
use logging::{Logger, LoggerError, log_fatal, log_info};

/// How often the controlling thread re-checks the interrupt flag.
const INTERRUPT_POLL: Duration = Duration::from_millis(200);

/// Parses `args` and runs the mirror until interrupted.
///
/// Returns the process exit code; all user-facing failure text goes either to
/// `stderr` (before the logger exists) or to the logger.
pub fn run_with<I, T>(args: I, stderr: &mut dyn Write) -> process::ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let parsed = match args::parse_args(args) {
        Ok(parsed) => parsed,
        Err(error) => {
            let _ = write!(stderr, "{}", error.render());
            return ExitCode::Syntax.process();
        }
    };
    run(&parsed, stderr)
}

fn run(args: &MirrorArgs, stderr: &mut dyn Write) -> process::ExitCode {
    let logger = match Logger::builder(&args.log_file).build() {
        Ok(logger) => Arc::new(logger),
        Err(error) => {
            let _ = writeln!(stderr, "dirsync: {error}");
            let code = match error {
                LoggerError::AlreadyCreated => ExitCode::Syntax,
                LoggerError::OpenLogFile { .. } => ExitCode::LogFile,
            };
            return code.process();
        }
    };

    let watcher = match Watcher::new(args.source.clone(), args.interval, Arc::clone(&logger)) {
        Ok(watcher) => watcher,
        Err(error) => {
            log_fatal!(logger, "{error}");
            let code = match error {
                EngineError::AlreadyRunning => ExitCode::Syntax,
                EngineError::SourceUnavailable { .. } | EngineError::SourceNotADirectory { .. } => {
                    ExitCode::FileSelect
                }
                EngineError::Spawn { .. } => ExitCode::FileIo,
            };
            return code.process();
        }
    };

    let reconciler = match ReplicaReconciler::new(args.replica.clone(), Arc::clone(&logger)) {
        Ok(reconciler) => reconciler,
        Err(error) => {
            log_fatal!(logger, "{error}");
            return ExitCode::FileIo.process();
        }
    };

    if let Err(error) = signal::install() {
        log_fatal!(logger, "failed to install signal handlers: {error}");
        return ExitCode::FileIo.process();
    }

    let mut handle = match watcher.spawn(reconciler) {
        Ok(handle) => handle,
        Err(error) => {
            log_fatal!(logger, "{error}");
            return ExitCode::FileIo.process();
        }
    };

    log_info!(
        logger,
        "Mirroring '{}' to '{}' every {}s",
        args.source.display(),
        args.replica.display(),
        args.interval.as_secs()
    );

    while !signal::interrupted() {
        thread::park_timeout(INTERRUPT_POLL);
    }

    log_info!(logger, "Interrupt received; stopping the mirror");
    handle.stop();
    ExitCode::Ok.process()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_invocation_prints_usage_to_the_error_stream() {
        let mut stderr = Vec::new();
        run_with(["dirsync", "/only/source"], &mut stderr);
        let rendered = String::from_utf8(stderr).expect("utf8");
        assert!(rendered.contains("Usage"));
        assert!(rendered.contains("SOURCE_DIR"));
    }
}
