//! Process exit codes of the mirror binary.

use std::fmt;
use std::process;

/// Exit codes returned by the mirror process.
///
/// A trimmed set in the tradition of long-running file-transfer tools: the
/// interesting distinction for callers is "bad invocation" versus "bad
/// filesystem", and an interrupt-driven shutdown is a success.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful completion, including an interrupt-driven shutdown.
    Ok = 0,

    /// Syntax or usage error.
    ///
    /// Returned when command-line arguments are invalid, or on a
    /// single-instance violation (a programming error in the embedding).
    Syntax = 1,

    /// Errors selecting the source directory.
    ///
    /// Returned when the configured source does not exist or is not a
    /// directory.
    FileSelect = 3,

    /// The log file could not be created.
    LogFile = 6,

    /// Error in local file I/O while starting the mirror.
    FileIo = 11,
}

impl ExitCode {
    /// Returns the numeric exit code.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Returns a human-readable description of the exit code.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Ok => "success",
            Self::Syntax => "syntax or usage error",
            Self::FileSelect => "error selecting source directory",
            Self::LogFile => "unable to create log file",
            Self::FileIo => "error in file I/O",
        }
    }

    /// Converts into the code handed back to the operating system.
    #[must_use]
    pub fn process(self) -> process::ExitCode {
        process::ExitCode::from(self.as_i32() as u8)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
