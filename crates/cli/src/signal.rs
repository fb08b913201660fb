//! Interrupt handling for orderly shutdown.
//!
//! # Safety
//!
//! The Unix implementation installs raw `libc` signal handlers. Handlers must
//! be async-signal-safe, so the installed handler only stores an atomic flag;
//! the controlling thread observes the flag and performs the actual stop and
//! join outside handler context.
#![allow(unsafe_code)]

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// Set by the signal handler, polled by the controlling thread.
static INTERRUPT_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Reports whether an interrupt has been delivered to the process.
#[inline]
#[must_use]
pub fn interrupted() -> bool {
    INTERRUPT_REQUESTED.load(Ordering::SeqCst)
}

/// Requests shutdown programmatically, as if an interrupt had been delivered.
pub fn request_interrupt() {
    INTERRUPT_REQUESTED.store(true, Ordering::SeqCst);
}

#[cfg(test)]
pub(crate) fn reset() {
    INTERRUPT_REQUESTED.store(false, Ordering::SeqCst);
}

/// Installs handlers for `SIGINT` and `SIGTERM`.
#[cfg(unix)]
pub fn install() -> io::Result<()> {
    // SAFETY: the handler is async-signal-safe; it only stores to an atomic.
    unsafe {
        if libc::signal(libc::SIGINT, handle_signal as libc::sighandler_t) == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
        if libc::signal(libc::SIGTERM, handle_signal as libc::sighandler_t) == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(unix)]
extern "C" fn handle_signal(_signal: libc::c_int) {
    INTERRUPT_REQUESTED.store(true, Ordering::SeqCst);
}

/// Installs nothing; only programmatic interrupts are observed.
#[cfg(not(unix))]
pub fn install() -> io::Result<()> {
    Ok(())
}
