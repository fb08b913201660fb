//! The dual-sink logger and its single-instance lifecycle.

use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use is_terminal::IsTerminal;
use time::OffsetDateTime;
use time::format_description::FormatItem;
use time::macros::format_description;

use crate::Severity;

/// Guards the process-wide single-instance invariant.
static LOGGER_LIVE: AtomicBool = AtomicBool::new(false);

const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]/[month]/[day] [hour]:[minute]:[second]");

const COLOR_RESET: &str = "\x1b[0m";

/// Source location of a log call, captured by the logging macros.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceLocation {
    file: &'static str,
    line: u32,
}

impl SourceLocation {
    /// Creates a location from `file!()` and `line!()` values.
    #[must_use]
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Configures and constructs the process-wide [`Logger`].
pub struct LoggerBuilder {
    log_path: PathBuf,
    debug_enabled: bool,
    show_source: bool,
    colored: Option<bool>,
    console: Option<Box<dyn Write + Send>>,
}

impl LoggerBuilder {
    fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            debug_enabled: false,
            show_source: false,
            colored: None,
            console: None,
        }
    }

    /// Enables [`Severity::Debug`] records; they are dropped otherwise.
    #[must_use]
    pub const fn debug(mut self, enabled: bool) -> Self {
        self.debug_enabled = enabled;
        self
    }

    /// Appends the call site to console records as well as file records.
    #[must_use]
    pub const fn show_source(mut self, enabled: bool) -> Self {
        self.show_source = enabled;
        self
    }

    /// Forces console coloring on or off.
    ///
    /// When unset, coloring is enabled only when standard output is an
    /// interactive terminal and no custom console writer was installed.
    #[must_use]
    pub const fn colored(mut self, enabled: bool) -> Self {
        self.colored = Some(enabled);
        self
    }

    /// Replaces the console sink, e.g. with an in-memory buffer in tests.
    #[must_use]
    pub fn console(mut self, writer: Box<dyn Write + Send>) -> Self {
        self.console = Some(writer);
        self
    }

    /// Builds the logger, claiming the process-wide instance slot.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::AlreadyCreated`] when another logger is alive in
    /// this process, or [`LoggerError::OpenLogFile`] when the log file cannot
    /// be created.
    pub fn build(self) -> Result<Logger, LoggerError> {
        if LOGGER_LIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(LoggerError::AlreadyCreated);
        }

        let file = match File::create(&self.log_path) {
            Ok(file) => file,
            Err(source) => {
                LOGGER_LIVE.store(false, Ordering::SeqCst);
                return Err(LoggerError::OpenLogFile {
                    path: self.log_path,
                    source,
                });
            }
        };

        let colored = self
            .colored
            .unwrap_or_else(|| self.console.is_none() && io::stdout().is_terminal());
        let console = self
            .console
            .unwrap_or_else(|| Box::new(io::stdout()) as Box<dyn Write + Send>);

        Ok(Logger {
            sinks: Mutex::new(Sinks {
                console,
                file: LineWriter::new(file),
            }),
            debug_enabled: self.debug_enabled,
            show_source: self.show_source,
            colored,
        })
    }
}

struct Sinks {
    console: Box<dyn Write + Send>,
    file: LineWriter<File>,
}

/// Process-wide logging sink writing each record to a console stream and a
/// log file.
///
/// Exactly one logger may be alive per process; ownership is explicit, so the
/// instance is passed (usually behind an `Arc`) to every component that needs
/// to report.
pub struct Logger {
    sinks: Mutex<Sinks>,
    debug_enabled: bool,
    show_source: bool,
    colored: bool,
}

impl Logger {
    /// Starts configuring a logger that writes its file sink to `log_path`.
    #[must_use]
    pub fn builder<P: Into<PathBuf>>(log_path: P) -> LoggerBuilder {
        LoggerBuilder::new(log_path.into())
    }

    /// Reports whether [`Severity::Debug`] records are emitted.
    #[must_use]
    pub const fn debug_enabled(&self) -> bool {
        self.debug_enabled
    }

    /// Writes one record to both sinks.
    ///
    /// Prefer the [`log_info!`](crate::log_info) family of macros, which
    /// capture the source location automatically. Sink failures are ignored.
    pub fn log(&self, severity: Severity, location: SourceLocation, args: fmt::Arguments<'_>) {
        if severity == Severity::Debug && !self.debug_enabled {
            return;
        }

        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let timestamp = now.format(TIMESTAMP_FORMAT).unwrap_or_default();
        let message = args.to_string();

        let mut sinks = match self.sinks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if self.colored {
            let _ = write!(
                sinks.console,
                "{}{timestamp} | {severity}: {message}",
                severity.color_code()
            );
            if self.show_source {
                let _ = write!(sinks.console, " (FROM: {location})");
            }
            let _ = writeln!(sinks.console, "{COLOR_RESET}");
        } else {
            let _ = write!(sinks.console, "{timestamp} | {severity}: {message}");
            if self.show_source {
                let _ = write!(sinks.console, " (FROM: {location})");
            }
            let _ = writeln!(sinks.console);
        }
        let _ = sinks.console.flush();

        let _ = writeln!(
            sinks.file,
            "{timestamp} | {severity}: {message} (FROM: {location})"
        );
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Ok(mut sinks) = self.sinks.lock() {
            let _ = sinks.console.flush();
            let _ = sinks.file.flush();
        }
        LOGGER_LIVE.store(false, Ordering::SeqCst);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("debug_enabled", &self.debug_enabled)
            .field("show_source", &self.show_source)
            .field("colored", &self.colored)
            .finish_non_exhaustive()
    }
}

/// Error raised while constructing the [`Logger`].
#[derive(Debug)]
pub enum LoggerError {
    /// A logger instance is already alive in this process.
    AlreadyCreated,
    /// The log file could not be created.
    OpenLogFile {
        /// Path of the log file that failed to open.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyCreated => {
                f.write_str("only one logger instance may be created per process")
            }
            Self::OpenLogFile { path, source } => {
                write!(
                    f,
                    "failed to create log file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl Error for LoggerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::AlreadyCreated => None,
            Self::OpenLogFile { source, .. } => Some(source),
        }
    }
}
