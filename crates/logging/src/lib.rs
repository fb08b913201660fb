#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` provides the process-wide logging sink used by the directory
//! mirror. Every record is a single timestamped, severity-tagged line that is
//! written to two independent destinations: an interactive console stream and
//! a log file. The watcher treats the logger purely as a side-effecting sink;
//! nothing it does influences scheduling or classification outcomes.
//!
//! # Design
//!
//! - [`Severity`] enumerates the five record levels. [`Severity::Debug`]
//!   records are dropped entirely unless the logger was built with the debug
//!   flag enabled.
//! - [`Logger`] owns both sinks behind a mutex so worker threads can log
//!   concurrently with the controlling thread. It is constructed once per
//!   process through [`Logger::builder`]; a second live instance is a
//!   programming error and construction fails with
//!   [`LoggerError::AlreadyCreated`].
//! - The [`log_info!`], [`log_warning!`], [`log_error!`], [`log_fatal!`], and
//!   [`log_debug!`] macros capture the caller's source location via `file!()`
//!   and `line!()`. Malformed format strings are rejected at compile time by
//!   `format_args!`, so a format failure can never surface at runtime.
//!
//! # Invariants
//!
//! - The console line carries ANSI severity colors only when coloring is
//!   enabled; the file line is never colored.
//! - The file sink always records the source location; the console shows it
//!   only when the logger was built with `show_source`.
//! - Sink I/O failures are swallowed: the logger must never take down the
//!   watcher it observes.
//!
//! # Examples
//!
//! ```
//! use logging::{Logger, log_info};
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! let logger = Logger::builder(temp.path().join("mirror.log"))
//!     .console(Box::new(Vec::new()))
//!     .build()?;
//! log_info!(logger, "mirroring {} entries", 3);
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

mod logger;
mod severity;

pub use logger::{Logger, LoggerBuilder, LoggerError, SourceLocation};
pub use severity::Severity;

/// Logs at [`Severity::Info`], capturing the call site automatically.
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log(
            $crate::Severity::Info,
            $crate::SourceLocation::new(file!(), line!()),
            format_args!($($arg)*),
        )
    };
}

/// Logs at [`Severity::Warning`], capturing the call site automatically.
#[macro_export]
macro_rules! log_warning {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log(
            $crate::Severity::Warning,
            $crate::SourceLocation::new(file!(), line!()),
            format_args!($($arg)*),
        )
    };
}

/// Logs at [`Severity::Error`], capturing the call site automatically.
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log(
            $crate::Severity::Error,
            $crate::SourceLocation::new(file!(), line!()),
            format_args!($($arg)*),
        )
    };
}

/// Logs at [`Severity::Fatal`], capturing the call site automatically.
#[macro_export]
macro_rules! log_fatal {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log(
            $crate::Severity::Fatal,
            $crate::SourceLocation::new(file!(), line!()),
            format_args!($($arg)*),
        )
    };
}

/// Logs at [`Severity::Debug`], capturing the call site automatically.
///
/// The record is discarded unless the logger was built with
/// [`LoggerBuilder::debug`] enabled.
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.log(
            $crate::Severity::Debug,
            $crate::SourceLocation::new(file!(), line!()),
            format_args!($($arg)*),
        )
    };
}
