//! Application of change events to the replica tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use logging::{Logger, log_info, log_warning};
use thiserror::Error;
use walk::EntryKind;

use crate::event::{ChangeAction, ChangeEvent};

/// Result of applying one event that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The replica was brought in line with the event.
    Applied,
    /// The event was unclassifiable and deliberately left the replica alone.
    Skipped,
}

/// Capability of replaying one [`ChangeEvent`] onto a replica.
///
/// The production implementation is [`ReplicaReconciler`]; the seam exists so
/// tests can substitute a recording or dry-run double.
pub trait Reconcile {
    /// Applies a single event, reporting the outcome.
    fn apply(&mut self, event: &ChangeEvent) -> Result<ApplyOutcome, ApplyError>;
}

/// I/O failure while applying an event.
///
/// Never retried within the cycle that produced it; the next poll re-evaluates
/// the remaining difference.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// A directory could not be created in the replica.
    #[error("failed to create replica directory '{}': {source}", .path.display())]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },

    /// A file could not be copied into the replica.
    #[error("failed to copy '{}' to '{}': {source}", .from.display(), .to.display())]
    Copy {
        /// The source file.
        from: PathBuf,
        /// The replica target.
        to: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },

    /// A replica object could not be removed.
    #[error("failed to remove '{}': {source}", .path.display())]
    Remove {
        /// The replica object that could not be removed.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },

    /// A source directory could not be read during a recursive copy.
    #[error("failed to read directory '{}': {source}", .path.display())]
    ReadDir {
        /// The directory that could not be read.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
}

/// Applies change events to the replica tree with copy/overwrite/remove
/// operations, logging every successful action.
pub struct ReplicaReconciler {
    replica_root: PathBuf,
    logger: Arc<Logger>,
}

impl ReplicaReconciler {
    /// Creates a reconciler rooted at `replica_root`, creating the root
    /// directory when it does not exist yet.
    pub fn new(replica_root: PathBuf, logger: Arc<Logger>) -> Result<Self, ApplyError> {
        fs::create_dir_all(&replica_root).map_err(|source| ApplyError::CreateDir {
            path: replica_root.clone(),
            source,
        })?;
        Ok(Self {
            replica_root,
            logger,
        })
    }

    /// Returns the replica root all events are applied below.
    #[must_use]
    pub fn replica_root(&self) -> &Path {
        &self.replica_root
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), ApplyError> {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|source| ApplyError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::copy(from, to)
            .map(|_| ())
            .map_err(|source| ApplyError::Copy {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source,
            })
    }

    fn copy_tree(&self, from: &Path, to: &Path) -> Result<(), ApplyError> {
        fs::create_dir_all(to).map_err(|source| ApplyError::CreateDir {
            path: to.to_path_buf(),
            source,
        })?;

        let read_dir = fs::read_dir(from).map_err(|source| ApplyError::ReadDir {
            path: from.to_path_buf(),
            source,
        })?;
        let mut names = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| ApplyError::ReadDir {
                path: from.to_path_buf(),
                source,
            })?;
            names.push(entry.file_name());
        }
        names.sort();

        for name in names {
            let child_from = from.join(&name);
            let child_to = to.join(&name);
            let metadata =
                fs::symlink_metadata(&child_from).map_err(|source| ApplyError::ReadDir {
                    path: child_from.clone(),
                    source,
                })?;
            match EntryKind::from_file_type(metadata.file_type()) {
                EntryKind::Directory => self.copy_tree(&child_from, &child_to)?,
                EntryKind::Regular => self.copy_file(&child_from, &child_to)?,
                EntryKind::Unexpected => {
                    log_warning!(
                        self.logger,
                        "Unexpected file {} has been skipped",
                        child_from.display()
                    );
                }
            }
        }
        Ok(())
    }

    fn remove_file_entry(&self, path: &Path) -> Result<(), ApplyError> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            // Already gone: the goal state holds.
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ApplyError::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn remove_dir_entry(&self, path: &Path) -> Result<(), ApplyError> {
        match fs::remove_dir_all(path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ApplyError::Remove {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl Reconcile for ReplicaReconciler {
    fn apply(&mut self, event: &ChangeEvent) -> Result<ApplyOutcome, ApplyError> {
        let target = self.replica_root.join(event.relative_path());
        match (event.action(), event.kind()) {
            (ChangeAction::Create | ChangeAction::Modify, EntryKind::Regular) => {
                self.copy_file(event.source_path(), &target)?;
                log_info!(
                    self.logger,
                    "{} {} has been {} in Replica | {}",
                    event.kind(),
                    event.name(),
                    event.action(),
                    event.source_path().display()
                );
                Ok(ApplyOutcome::Applied)
            }
            (ChangeAction::Create | ChangeAction::Modify, EntryKind::Directory) => {
                self.copy_tree(event.source_path(), &target)?;
                log_info!(
                    self.logger,
                    "{} {} has been {} in Replica | {}",
                    event.kind(),
                    event.name(),
                    event.action(),
                    event.source_path().display()
                );
                Ok(ApplyOutcome::Applied)
            }
            (ChangeAction::Delete, EntryKind::Regular) => {
                self.remove_file_entry(&target)?;
                log_info!(
                    self.logger,
                    "{} {} has been deleted from Replica | {}",
                    event.kind(),
                    event.name(),
                    event.source_path().display()
                );
                Ok(ApplyOutcome::Applied)
            }
            (ChangeAction::Delete, EntryKind::Directory) => {
                self.remove_dir_entry(&target)?;
                log_info!(
                    self.logger,
                    "{} {} has been deleted from Replica | {}",
                    event.kind(),
                    event.name(),
                    event.source_path().display()
                );
                Ok(ApplyOutcome::Applied)
            }
            (action, EntryKind::Unexpected) => {
                log_warning!(
                    self.logger,
                    "Unexpected file {} has been {}; replica left untouched",
                    event.name(),
                    action
                );
                Ok(ApplyOutcome::Skipped)
            }
        }
    }
}
