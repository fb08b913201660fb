//! Record severities and their console presentation.

use std::fmt;

/// Severity of a single log record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Routine progress reporting, e.g. a successful replica update.
    Info,
    /// Recoverable anomaly, e.g. an unexpected file type that was skipped.
    Warning,
    /// A failed operation that the watcher survives, e.g. a copy failure.
    Error,
    /// A condition that terminates the process, e.g. a missing source tree.
    Fatal,
    /// Diagnostic detail, dropped unless the debug flag is enabled.
    Debug,
}

impl Severity {
    /// Returns the uppercase label written into every record.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
            Self::Debug => "DEBUG",
        }
    }

    /// Returns the ANSI escape sequence used on colored consoles.
    #[must_use]
    pub(crate) const fn color_code(self) -> &'static str {
        match self {
            Self::Info => "\x1b[39m",
            Self::Warning => "\x1b[33m",
            Self::Error | Self::Fatal => "\x1b[31m",
            Self::Debug => "\x1b[34m",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_uppercase() {
        assert_eq!(Severity::Info.as_str(), "INFO");
        assert_eq!(Severity::Warning.as_str(), "WARNING");
        assert_eq!(Severity::Error.as_str(), "ERROR");
        assert_eq!(Severity::Fatal.as_str(), "FATAL");
        assert_eq!(Severity::Debug.as_str(), "DEBUG");
    }

    #[test]
    fn display_matches_label() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
    }
}
