#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `engine` implements the core of the directory mirror: the in-memory
//! snapshot of the source tree, the poll-based change classifier, the replica
//! reconciler, and the single-worker poll scheduler that drives them.
//!
//! # Design
//!
//! - [`Snapshot`] and [`ShadowSet`] remember, between polls, which objects
//!   exist in the source tree and which of them are believed to also exist in
//!   the replica. Both are owned exclusively by the worker; nothing in this
//!   crate shares them across threads.
//! - [`ChangeDetector`] compares a fresh deterministic walk of the source
//!   tree against the snapshot and produces [`ChangeEvent`] values: creates
//!   and modifies in walk order, deletes in snapshot order. Snapshot pruning
//!   for deletes is deferred to the end of the cycle.
//! - [`Reconcile`] is the seam between classification and replica mutation.
//!   [`ReplicaReconciler`] is the concrete implementation used in production;
//!   tests substitute recording doubles through the same trait.
//! - [`Watcher`] owns one classify-and-reconcile cycle ([`Watcher::sync_once`])
//!   and, via [`Watcher::spawn`], the background worker that repeats it on a
//!   fixed interval until stopped. The sleep is interruptible: a stop request
//!   wakes the worker immediately instead of letting a full interval elapse.
//!
//! # Invariants
//!
//! - Every path in the shadow set was, at some prior poll, also a snapshot
//!   key.
//! - A snapshot entry is removed only after its delete event has been handed
//!   to the reconciler.
//! - Per-event failures never abort a cycle, and a cycle already in progress
//!   always finishes even when a stop is requested mid-cycle.
//!
//! # Errors
//!
//! Construction-time problems surface as [`EngineError`]; reconciliation
//! failures as [`ApplyError`]. Both are contained by the scheduler: the loop
//! logs them and continues with the next event or cycle.

mod classify;
mod error;
mod event;
mod reconcile;
mod scheduler;
mod snapshot;

pub use classify::ChangeDetector;
pub use error::EngineError;
pub use event::{ChangeAction, ChangeEvent};
pub use reconcile::{ApplyError, ApplyOutcome, Reconcile, ReplicaReconciler};
pub use scheduler::{CycleStats, Watcher, WatcherHandle, WatcherState};
pub use snapshot::{Entry, ShadowSet, Snapshot};
pub use walk::EntryKind;
