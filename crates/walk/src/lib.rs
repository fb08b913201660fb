#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `walk` provides the deterministic filesystem traversal used by the
//! directory mirror when scanning the source tree. The walker enumerates
//! regular files and directories below a configured root, classifies every
//! object it encounters, and captures the on-disk modification timestamp at
//! walk time so the change classifier can compare it against the remembered
//! snapshot. Ordering is kept stable across platforms by sorting directory
//! entries lexicographically before yielding them, which also guarantees that
//! a parent directory is always yielded before its children.
//!
//! # Design
//!
//! - [`WalkBuilder`] configures a traversal rooted at a source directory.
//! - [`Walker`] implements [`Iterator`] and yields [`WalkedEntry`] values in
//!   depth-first order. The root itself is not yielded; traversal starts with
//!   its children.
//! - [`EntryKind`] classifies each object as a directory, a regular file, or
//!   an unexpected object (symlink, fifo, socket, device). Symlinks are never
//!   followed.
//! - [`WalkError`] describes I/O failures encountered while reading
//!   directories or querying metadata. Errors capture the offending path so
//!   higher layers can surface actionable diagnostics.
//!
//! # Invariants
//!
//! - Yielded relative paths never contain `..` segments and always reside
//!   within the configured root.
//! - A failure on a single entry does not terminate the traversal: the error
//!   is yielded in place of the entry and iteration continues with the
//!   remaining siblings. Only a failure to read the root directory itself
//!   aborts the walk, at build time.
//! - Traversal never panics.
//!
//! # Errors
//!
//! [`WalkBuilder::build`] fails when the root cannot be inspected, is not a
//! directory, or cannot be read. Iteration yields [`WalkError`] values for
//! per-entry metadata or directory-read failures. Callers can reach the
//! original [`io::Error`] through [`WalkError::source`].
//!
//! # Examples
//!
//! Traverse a directory tree and collect the relative paths discovered by the
//! walker:
//!
//! ```
//! use walk::WalkBuilder;
//! use std::fs;
//!
//! # fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let temp = tempfile::tempdir()?;
//! let root = temp.path().join("src");
//! fs::create_dir_all(root.join("nested"))?;
//! fs::write(root.join("file.txt"), b"data")?;
//!
//! let walker = WalkBuilder::new(&root).build()?;
//! let mut seen = Vec::new();
//! for entry in walker {
//!     seen.push(entry?.relative_path().to_path_buf());
//! }
//!
//! assert_eq!(seen.len(), 2);
//! # Ok(())
//! # }
//! # demo().unwrap();
//! ```

use std::error::Error;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Classification of a filesystem object encountered during a walk.
///
/// The mirror only propagates directories and regular files; everything else
/// is tagged [`EntryKind::Unexpected`] so callers can warn and skip it rather
/// than treating it as an ordinary creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A plain directory.
    Directory,
    /// A regular file.
    Regular,
    /// Anything else: symlink, fifo, socket, or device node.
    Unexpected,
}

impl EntryKind {
    /// Classifies a [`fs::FileType`] without following symlinks.
    #[must_use]
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::Regular
        } else {
            Self::Unexpected
        }
    }

    /// Returns the human-readable label used in log output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "Directory",
            Self::Regular => "Regular file",
            Self::Unexpected => "Unexpected file",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configures a filesystem traversal rooted at a source directory.
#[derive(Clone, Debug)]
pub struct WalkBuilder {
    root: PathBuf,
}

impl WalkBuilder {
    /// Creates a new builder that will traverse the provided root path.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Builds a [`Walker`], reading the root directory eagerly.
    pub fn build(self) -> Result<Walker, WalkError> {
        let root = absolutize(self.root)?;
        let metadata = fs::symlink_metadata(&root)
            .map_err(|error| WalkError::root_metadata(root.clone(), error))?;
        if !metadata.file_type().is_dir() {
            return Err(WalkError::not_a_directory(root));
        }

        let state = DirectoryState::new(root.clone(), PathBuf::new())?;
        Ok(Walker {
            root,
            stack: vec![state],
        })
    }
}

/// Depth-first iterator over the objects below a source root.
pub struct Walker {
    root: PathBuf,
    stack: Vec<DirectoryState>,
}

impl Walker {
    /// Returns the absolute root this walker traverses.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn prepare_entry(
        &mut self,
        full_path: PathBuf,
        relative_path: PathBuf,
    ) -> Result<WalkedEntry, WalkError> {
        let metadata = fs::symlink_metadata(&full_path)
            .map_err(|error| WalkError::metadata(full_path.clone(), error))?;
        let kind = EntryKind::from_file_type(metadata.file_type());
        let modified = metadata
            .modified()
            .map_err(|error| WalkError::modified(full_path.clone(), error))?;

        if kind == EntryKind::Directory {
            let state = DirectoryState::new(full_path.clone(), relative_path.clone())?;
            self.stack.push(state);
        }

        Ok(WalkedEntry {
            full_path,
            relative_path,
            kind,
            modified,
        })
    }
}

impl Iterator for Walker {
    type Item = Result<WalkedEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (full_path, relative_path) = {
                let state = self.stack.last_mut()?;
                if let Some(name) = state.next_name() {
                    let full_path = state.fs_path.join(&name);
                    let relative_path = if state.relative_prefix.as_os_str().is_empty() {
                        PathBuf::from(&name)
                    } else {
                        let mut rel = state.relative_prefix.clone();
                        rel.push(&name);
                        rel
                    };
                    (full_path, relative_path)
                } else {
                    self.stack.pop();
                    continue;
                }
            };

            // Per-entry failures are yielded in place; siblings still walk.
            return Some(self.prepare_entry(full_path, relative_path));
        }
    }
}

#[derive(Clone, Debug)]
struct DirectoryState {
    fs_path: PathBuf,
    relative_prefix: PathBuf,
    entries: Vec<OsString>,
    index: usize,
}

impl DirectoryState {
    fn new(fs_path: PathBuf, relative_prefix: PathBuf) -> Result<Self, WalkError> {
        let mut entries = Vec::new();
        let read_dir =
            fs::read_dir(&fs_path).map_err(|error| WalkError::read_dir(fs_path.clone(), error))?;
        for entry in read_dir {
            let entry = entry.map_err(|error| WalkError::read_dir_entry(fs_path.clone(), error))?;
            entries.push(entry.file_name());
        }
        entries.sort();

        Ok(Self {
            fs_path,
            relative_prefix,
            entries,
            index: 0,
        })
    }

    fn next_name(&mut self) -> Option<OsString> {
        let name = self.entries.get(self.index)?.clone();
        self.index += 1;
        Some(name)
    }
}

/// One filesystem object discovered during a walk.
#[derive(Clone, Debug)]
pub struct WalkedEntry {
    full_path: PathBuf,
    relative_path: PathBuf,
    kind: EntryKind,
    modified: SystemTime,
}

impl WalkedEntry {
    /// Returns the absolute path to the filesystem object.
    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Returns the path relative to the traversal root.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Returns the classification captured at walk time.
    #[must_use]
    pub const fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Returns the last-modified timestamp captured at walk time.
    #[must_use]
    pub const fn modified(&self) -> SystemTime {
        self.modified
    }
}

/// Error returned when a traversal step fails.
#[derive(Debug)]
pub struct WalkError {
    kind: WalkErrorKind,
}

impl WalkError {
    fn new(kind: WalkErrorKind) -> Self {
        Self { kind }
    }

    fn root_metadata(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::RootMetadata { path, source })
    }

    fn not_a_directory(path: PathBuf) -> Self {
        Self::new(WalkErrorKind::NotADirectory { path })
    }

    fn read_dir(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::ReadDir { path, source })
    }

    fn read_dir_entry(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::ReadDirEntry { path, source })
    }

    fn metadata(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::Metadata { path, source })
    }

    fn modified(path: PathBuf, source: io::Error) -> Self {
        Self::new(WalkErrorKind::Modified { path, source })
    }

    /// Returns the specific failure behind this error.
    #[must_use]
    pub fn kind(&self) -> &WalkErrorKind {
        &self.kind
    }

    /// Returns the path the failing operation was applied to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match &self.kind {
            WalkErrorKind::RootMetadata { path, .. }
            | WalkErrorKind::NotADirectory { path }
            | WalkErrorKind::ReadDir { path, .. }
            | WalkErrorKind::ReadDirEntry { path, .. }
            | WalkErrorKind::Metadata { path, .. }
            | WalkErrorKind::Modified { path, .. } => path,
        }
    }
}

impl fmt::Display for WalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WalkErrorKind::RootMetadata { path, source } => {
                write!(
                    f,
                    "failed to inspect traversal root '{}': {}",
                    path.display(),
                    source
                )
            }
            WalkErrorKind::NotADirectory { path } => {
                write!(f, "traversal root '{}' is not a directory", path.display())
            }
            WalkErrorKind::ReadDir { path, source } => {
                write!(
                    f,
                    "failed to read directory '{}': {}",
                    path.display(),
                    source
                )
            }
            WalkErrorKind::ReadDirEntry { path, source } => {
                write!(
                    f,
                    "failed to read entry in '{}': {}",
                    path.display(),
                    source
                )
            }
            WalkErrorKind::Metadata { path, source } => {
                write!(
                    f,
                    "failed to inspect metadata for '{}': {}",
                    path.display(),
                    source
                )
            }
            WalkErrorKind::Modified { path, source } => {
                write!(
                    f,
                    "failed to read modification time for '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl Error for WalkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            WalkErrorKind::RootMetadata { source, .. }
            | WalkErrorKind::ReadDir { source, .. }
            | WalkErrorKind::ReadDirEntry { source, .. }
            | WalkErrorKind::Metadata { source, .. }
            | WalkErrorKind::Modified { source, .. } => Some(source),
            WalkErrorKind::NotADirectory { .. } => None,
        }
    }
}

/// Classification of traversal failures.
#[derive(Debug)]
pub enum WalkErrorKind {
    /// Failed to query metadata for the traversal root.
    RootMetadata {
        /// Path that failed to provide metadata.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// The traversal root exists but is not a directory.
    NotADirectory {
        /// The offending root path.
        path: PathBuf,
    },
    /// Failed to read the contents of a directory.
    ReadDir {
        /// Directory whose contents could not be read.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// Failed to obtain a directory entry during iteration.
    ReadDirEntry {
        /// Directory containing the problematic entry.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// Failed to retrieve metadata for an entry.
    Metadata {
        /// Path whose metadata could not be retrieved.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
    /// Failed to read the modification timestamp for an entry.
    Modified {
        /// Path whose timestamp could not be read.
        path: PathBuf,
        /// Underlying error emitted by the operating system.
        source: io::Error,
    },
}

fn absolutize(path: PathBuf) -> Result<PathBuf, WalkError> {
    if path.is_absolute() {
        Ok(path)
    } else {
        let cwd = std::env::current_dir()
            .map_err(|error| WalkError::root_metadata(PathBuf::from("."), error))?;
        Ok(cwd.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn collect_relative_paths(walker: Walker) -> Vec<PathBuf> {
        walker
            .map(|entry| entry.expect("walker entry").relative_path().to_path_buf())
            .collect()
    }

    #[test]
    fn build_fails_when_root_missing() {
        let builder = WalkBuilder::new("/nonexistent/path/for/walker");
        let error = match builder.build() {
            Ok(_) => panic!("missing root should fail"),
            Err(error) => error,
        };
        assert!(matches!(error.kind(), WalkErrorKind::RootMetadata { .. }));
    }

    #[test]
    fn build_fails_when_root_is_a_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("file.txt");
        fs::write(&file, b"contents").expect("write");

        let error = match WalkBuilder::new(&file).build() {
            Ok(_) => panic!("file root should fail"),
            Err(error) => error,
        };
        assert!(matches!(error.kind(), WalkErrorKind::NotADirectory { .. }));
        assert_eq!(error.path(), file);
    }

    #[test]
    fn walk_yields_deterministic_order_with_parents_first() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join("root");
        fs::create_dir(&root).expect("create root");
        fs::create_dir(root.join("a")).expect("dir a");
        fs::create_dir(root.join("b")).expect("dir b");
        fs::write(root.join("a").join("inner.txt"), b"data").expect("write inner");
        fs::write(root.join("c.txt"), b"data").expect("write file");

        let walker = WalkBuilder::new(&root).build().expect("build walker");
        let paths = collect_relative_paths(walker);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a"),
                PathBuf::from("a/inner.txt"),
                PathBuf::from("b"),
                PathBuf::from("c.txt"),
            ]
        );
    }

    #[test]
    fn walk_classifies_directories_and_files() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join("root");
        fs::create_dir(&root).expect("create root");
        fs::create_dir(root.join("sub")).expect("create sub");
        fs::write(root.join("file.txt"), b"data").expect("write");

        let walker = WalkBuilder::new(&root).build().expect("build walker");
        let mut kinds = Vec::new();
        for entry in walker {
            let entry = entry.expect("entry");
            kinds.push((entry.relative_path().to_path_buf(), entry.kind()));
        }
        assert_eq!(
            kinds,
            vec![
                (PathBuf::from("file.txt"), EntryKind::Regular),
                (PathBuf::from("sub"), EntryKind::Directory),
            ]
        );
    }

    #[test]
    fn walk_captures_modification_time() {
        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join("root");
        fs::create_dir(&root).expect("create root");
        let file = root.join("file.txt");
        fs::write(&file, b"data").expect("write");
        let on_disk = fs::metadata(&file)
            .and_then(|m| m.modified())
            .expect("metadata");

        let mut walker = WalkBuilder::new(&root).build().expect("build walker");
        let entry = walker.next().expect("entry").expect("entry ok");
        assert_eq!(entry.modified(), on_disk);
        assert_eq!(entry.full_path(), file);
    }

    #[cfg(unix)]
    #[test]
    fn walk_tags_symlinks_as_unexpected_without_following() {
        use std::os::unix::fs::symlink;

        let temp = tempfile::tempdir().expect("tempdir");
        let root = temp.path().join("root");
        let target = temp.path().join("target");
        fs::create_dir(&root).expect("create root");
        fs::create_dir(&target).expect("create target");
        fs::write(target.join("inner.txt"), b"data").expect("write inner");
        symlink(&target, root.join("link")).expect("create symlink");

        let walker = WalkBuilder::new(&root).build().expect("build walker");
        let entries: Vec<_> = walker.map(|e| e.expect("entry")).collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].relative_path(), Path::new("link"));
        assert_eq!(entries[0].kind(), EntryKind::Unexpected);
    }
}
