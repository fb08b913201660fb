//! Change events produced by one poll cycle.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use walk::EntryKind;

/// What happened to a source object since the last poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeAction {
    /// The object appeared in the source tree.
    Create,
    /// The object's modification timestamp moved forward.
    Modify,
    /// The object disappeared from the source tree.
    Delete,
}

impl ChangeAction {
    /// Returns the past-tense verb used in log output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "created",
            Self::Modify => "modified",
            Self::Delete => "deleted",
        }
    }
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected difference between the source tree and the snapshot.
///
/// Produced by the classifier and consumed by the reconciler within a single
/// poll cycle; never persisted.
#[derive(Clone, Debug)]
pub struct ChangeEvent {
    action: ChangeAction,
    kind: EntryKind,
    source_path: PathBuf,
    relative_path: PathBuf,
}

impl ChangeEvent {
    /// Creates an event for the object at `source_path`, addressed inside the
    /// replica by `relative_path`.
    #[must_use]
    pub fn new(
        action: ChangeAction,
        kind: EntryKind,
        source_path: PathBuf,
        relative_path: PathBuf,
    ) -> Self {
        Self {
            action,
            kind,
            source_path,
            relative_path,
        }
    }

    /// Returns the detected action.
    #[must_use]
    pub const fn action(&self) -> ChangeAction {
        self.action
    }

    /// Returns the object kind at detection time.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns the absolute path of the object in the source tree.
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Returns the path relative to the source root, which is also the
    /// object's address below the replica root.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Returns the object's file name for log output.
    #[must_use]
    pub fn name(&self) -> Cow<'_, str> {
        self.relative_path
            .file_name()
            .map_or_else(|| self.relative_path.to_string_lossy(), |n| n.to_string_lossy())
    }
}
