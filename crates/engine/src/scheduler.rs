//! The single-worker poll loop driving classify-and-reconcile cycles.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use logging::{Logger, log_debug, log_error};

use crate::classify::ChangeDetector;
use crate::error::EngineError;
use crate::event::ChangeAction;
use crate::reconcile::{ApplyOutcome, Reconcile};

/// Guards the process-wide single-instance invariant.
static WATCHER_LIVE: AtomicBool = AtomicBool::new(false);

/// Observable state of the poll worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WatcherState {
    /// Sleeping between polls.
    Idle = 0,
    /// Walking the source tree and classifying changes.
    Scanning = 1,
    /// Applying change events to the replica.
    Reconciling = 2,
    /// The worker has exited.
    Stopped = 3,
}

impl WatcherState {
    /// Converts a stored code back to a state.
    #[must_use]
    const fn from_u8(code: u8) -> Self {
        match code {
            0 => Self::Idle,
            1 => Self::Scanning,
            2 => Self::Reconciling,
            _ => Self::Stopped,
        }
    }
}

/// Counters for one completed poll cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Events applied as creations.
    pub created: usize,
    /// Events applied as modifications.
    pub modified: usize,
    /// Events applied as deletions.
    pub deleted: usize,
    /// Events whose application failed.
    pub failed: usize,
    /// Events deliberately skipped as unclassifiable.
    pub skipped: usize,
}

/// The poll scheduler: owns the change detector and drives one
/// classify-and-reconcile cycle per wakeup.
///
/// At most one watcher may be alive per process. The watcher itself is
/// single-threaded; [`Watcher::spawn`] moves it onto the one background
/// worker thread, and the returned [`WatcherHandle`] is the controller's only
/// way to interact with it.
pub struct Watcher {
    detector: ChangeDetector,
    interval: Duration,
    logger: Arc<Logger>,
    state: Arc<AtomicU8>,
}

impl Watcher {
    /// Creates the process's watcher for `source`, polling every `interval`.
    ///
    /// # Errors
    ///
    /// Fails when another watcher is alive in this process, or when `source`
    /// cannot be inspected or is not a directory.
    pub fn new(
        source: PathBuf,
        interval: Duration,
        logger: Arc<Logger>,
    ) -> Result<Self, EngineError> {
        if WATCHER_LIVE
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::AlreadyRunning);
        }

        match fs::symlink_metadata(&source) {
            Err(source_error) => {
                WATCHER_LIVE.store(false, Ordering::SeqCst);
                return Err(EngineError::SourceUnavailable {
                    path: source,
                    source: source_error,
                });
            }
            Ok(metadata) if !metadata.file_type().is_dir() => {
                WATCHER_LIVE.store(false, Ordering::SeqCst);
                return Err(EngineError::SourceNotADirectory { path: source });
            }
            Ok(_) => {}
        }

        Ok(Self {
            detector: ChangeDetector::new(source, logger.clone()),
            interval,
            logger,
            state: Arc::new(AtomicU8::new(WatcherState::Idle as u8)),
        })
    }

    /// Returns the source root being watched.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        self.detector.source_root()
    }

    /// Returns the current worker state.
    #[must_use]
    pub fn state(&self) -> WatcherState {
        WatcherState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Runs exactly one classify-and-reconcile cycle.
    ///
    /// A scan failure on the source root abandons the cycle (error log, empty
    /// stats); per-event failures are logged and counted but never abort the
    /// cycle.
    pub fn sync_once(&mut self, reconciler: &mut dyn Reconcile) -> CycleStats {
        self.state
            .store(WatcherState::Scanning as u8, Ordering::SeqCst);
        let events = match self.detector.scan() {
            Ok(events) => events,
            Err(error) => {
                log_error!(
                    self.logger,
                    "Scan of '{}' failed: {error}",
                    self.detector.source_root().display()
                );
                self.state.store(WatcherState::Idle as u8, Ordering::SeqCst);
                return CycleStats::default();
            }
        };

        self.state
            .store(WatcherState::Reconciling as u8, Ordering::SeqCst);
        let mut stats = CycleStats::default();
        for event in &events {
            match reconciler.apply(event) {
                Ok(ApplyOutcome::Applied) => match event.action() {
                    ChangeAction::Create => stats.created += 1,
                    ChangeAction::Modify => stats.modified += 1,
                    ChangeAction::Delete => stats.deleted += 1,
                },
                Ok(ApplyOutcome::Skipped) => stats.skipped += 1,
                Err(error) => {
                    stats.failed += 1;
                    log_error!(self.logger, "{error}");
                    // Roll the bookkeeping back so the next poll re-detects
                    // the difference this event failed to resolve.
                    match event.action() {
                        ChangeAction::Create | ChangeAction::Modify => {
                            self.detector.forget(event.relative_path());
                        }
                        ChangeAction::Delete => {
                            self.detector.cancel_removal(event.relative_path());
                        }
                    }
                }
            }
        }
        self.detector.finish_cycle();

        log_debug!(
            self.logger,
            "cycle complete: {} created, {} modified, {} deleted, {} failed, {} skipped",
            stats.created,
            stats.modified,
            stats.deleted,
            stats.failed,
            stats.skipped
        );
        self.state.store(WatcherState::Idle as u8, Ordering::SeqCst);
        stats
    }

    /// Moves the watcher onto its background worker thread.
    ///
    /// The worker sleeps for the configured interval, runs one cycle, and
    /// repeats until stopped. The sleep is an interruptible wait: a stop
    /// request wakes it immediately. A cycle already in progress always
    /// finishes before the worker exits.
    ///
    /// # Errors
    ///
    /// Fails only when the operating system refuses to spawn the thread.
    pub fn spawn<R>(mut self, mut reconciler: R) -> Result<WatcherHandle, EngineError>
    where
        R: Reconcile + Send + 'static,
    {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let state = Arc::clone(&self.state);
        let flag = Arc::clone(&stop_flag);

        let thread = thread::Builder::new()
            .name("dirsync-worker".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(self.interval) {
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                        Err(RecvTimeoutError::Timeout) => {}
                    }
                    if flag.load(Ordering::SeqCst) {
                        break;
                    }
                    self.sync_once(&mut reconciler);
                }
                self.state
                    .store(WatcherState::Stopped as u8, Ordering::SeqCst);
            })
            .map_err(|source| EngineError::Spawn { source })?;

        Ok(WatcherHandle {
            stop_flag,
            stop_tx: Some(stop_tx),
            state,
            thread: Some(thread),
        })
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        WATCHER_LIVE.store(false, Ordering::SeqCst);
    }
}

/// Controller-side handle to the running poll worker.
pub struct WatcherHandle {
    stop_flag: Arc<AtomicBool>,
    stop_tx: Option<Sender<()>>,
    state: Arc<AtomicU8>,
    thread: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    /// Requests a stop and waits for the worker to exit.
    ///
    /// Does not return until the worker has fully exited; a cycle already in
    /// progress finishes first. Idempotent.
    pub fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        // Dropping the sender disconnects the channel and wakes the sleep.
        self.stop_tx.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    /// Returns the last state published by the worker.
    #[must_use]
    pub fn state(&self) -> WatcherState {
        WatcherState::from_u8(self.state.load(Ordering::SeqCst))
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
