//! Classification of a fresh source walk against the remembered snapshot.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use logging::{Logger, log_warning};
use walk::{EntryKind, WalkBuilder, WalkError};

use crate::event::{ChangeAction, ChangeEvent};
use crate::snapshot::{Entry, ShadowSet, Snapshot};

/// Compares poll-time walks of the source tree against the [`Snapshot`] and
/// emits the resulting [`ChangeEvent`] sequence.
///
/// The detector owns the snapshot and the shadow set; both start empty, so
/// after a restart the entire source tree is re-detected as created (the
/// accepted cold-start cost).
pub struct ChangeDetector {
    source_root: PathBuf,
    snapshot: Snapshot,
    shadow: ShadowSet,
    pending_removals: Vec<PathBuf>,
    logger: Arc<Logger>,
}

impl ChangeDetector {
    /// Creates a detector with an empty snapshot for `source_root`.
    #[must_use]
    pub fn new(source_root: PathBuf, logger: Arc<Logger>) -> Self {
        Self {
            source_root,
            snapshot: Snapshot::new(),
            shadow: ShadowSet::new(),
            pending_removals: Vec::new(),
            logger,
        }
    }

    /// Returns the source root this detector scans.
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Walks the source tree once and emits the detected changes.
    ///
    /// Creates and modifies are emitted in walk order; deletes afterwards in
    /// snapshot order. Entries scheduled for deletion stay in the snapshot
    /// until [`finish_cycle`](Self::finish_cycle) runs, after the events have
    /// been handed to the reconciler.
    ///
    /// Objects of [`EntryKind::Unexpected`] and entries whose metadata cannot
    /// be read are logged as warnings and skipped for this cycle.
    ///
    /// # Errors
    ///
    /// Fails only when the source root itself cannot be walked; per-entry
    /// failures are contained.
    pub fn scan(&mut self) -> Result<Vec<ChangeEvent>, WalkError> {
        // A cycle interrupted before finish_cycle must not leak stale paths.
        self.finish_cycle();

        let walker = WalkBuilder::new(&self.source_root).build()?;
        let mut events = Vec::new();

        for result in walker {
            let walked = match result {
                Ok(walked) => walked,
                Err(error) => {
                    log_warning!(
                        self.logger,
                        "Skipping '{}' for this cycle: {error}",
                        error.path().display()
                    );
                    continue;
                }
            };

            if walked.kind() == EntryKind::Unexpected {
                log_warning!(
                    self.logger,
                    "Unexpected file {} has been skipped",
                    walked.relative_path().display()
                );
                continue;
            }

            let relative = walked.relative_path();
            match self.snapshot.lookup(relative) {
                None => {
                    events.push(ChangeEvent::new(
                        ChangeAction::Create,
                        walked.kind(),
                        walked.full_path().to_path_buf(),
                        relative.to_path_buf(),
                    ));
                    self.snapshot.insert(Entry::new(
                        relative.to_path_buf(),
                        walked.kind(),
                        walked.modified(),
                    ));
                    self.shadow.insert(relative.to_path_buf());
                }
                Some(previous) if previous.kind() != walked.kind() => {
                    // A path that changed species is replayed as a remove of
                    // the old object followed by a create of the new one.
                    let previous_kind = previous.kind();
                    events.push(ChangeEvent::new(
                        ChangeAction::Delete,
                        previous_kind,
                        walked.full_path().to_path_buf(),
                        relative.to_path_buf(),
                    ));
                    events.push(ChangeEvent::new(
                        ChangeAction::Create,
                        walked.kind(),
                        walked.full_path().to_path_buf(),
                        relative.to_path_buf(),
                    ));
                    self.snapshot.insert(Entry::new(
                        relative.to_path_buf(),
                        walked.kind(),
                        walked.modified(),
                    ));
                    self.shadow.insert(relative.to_path_buf());
                }
                Some(previous) if walked.modified() > previous.modified() => {
                    events.push(ChangeEvent::new(
                        ChangeAction::Modify,
                        walked.kind(),
                        walked.full_path().to_path_buf(),
                        relative.to_path_buf(),
                    ));
                    self.snapshot.insert(Entry::new(
                        relative.to_path_buf(),
                        walked.kind(),
                        walked.modified(),
                    ));
                }
                // Equal-or-older timestamps are "no change" by contract.
                Some(_) => {}
            }
        }

        for entry in self.snapshot.iter() {
            let relative = entry.relative_path();
            if !self.shadow.contains(relative) {
                continue;
            }
            let source_path = self.source_root.join(relative);
            if fs::symlink_metadata(&source_path).is_ok() {
                continue;
            }
            events.push(ChangeEvent::new(
                ChangeAction::Delete,
                entry.kind(),
                source_path,
                relative.to_path_buf(),
            ));
            self.pending_removals.push(relative.to_path_buf());
        }

        Ok(events)
    }

    /// Drops all memory of `relative`, so the next scan re-detects the object
    /// from scratch.
    ///
    /// Called by the scheduler when a create or modify failed to apply; the
    /// next poll then re-emits the event instead of considering the object
    /// up to date.
    pub fn forget(&mut self, relative: &Path) {
        self.snapshot.remove(relative);
        self.shadow.remove(relative);
    }

    /// Keeps `relative` in the snapshot despite its pending delete event.
    ///
    /// Called by the scheduler when a delete failed to apply; the next poll
    /// then re-emits the delete.
    pub fn cancel_removal(&mut self, relative: &Path) {
        self.pending_removals.retain(|path| path != relative);
    }

    /// Prunes the entries whose delete events were emitted by the last
    /// [`scan`](Self::scan).
    ///
    /// Deferred so the snapshot is never mutated while the delete sequence is
    /// still being produced or applied.
    pub fn finish_cycle(&mut self) {
        let doomed = std::mem::take(&mut self.pending_removals);
        for relative in doomed {
            self.snapshot.remove(&relative);
            self.shadow.remove(&relative);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use serial_test::serial;
    use std::fs;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn logger(temp: &TempDir) -> Arc<Logger> {
        Arc::new(
            Logger::builder(temp.path().join("mirror.log"))
                .console(Box::new(Vec::new()))
                .build()
                .expect("build logger"),
        )
    }

    fn describe(events: &[ChangeEvent]) -> Vec<(ChangeAction, EntryKind, PathBuf)> {
        events
            .iter()
            .map(|e| (e.action(), e.kind(), e.relative_path().to_path_buf()))
            .collect()
    }

    #[test]
    #[serial]
    fn first_scan_reports_every_object_as_created() {
        let temp = TempDir::new().expect("tempdir");
        let source = temp.path().join("source");
        fs::create_dir(&source).expect("create source");
        fs::create_dir(source.join("sub")).expect("create sub");
        fs::write(source.join("sub").join("inner.txt"), b"x").expect("write");
        fs::write(source.join("a.txt"), b"x").expect("write");

        let mut detector = ChangeDetector::new(source, logger(&temp));
        let events = detector.scan().expect("scan");

        assert_eq!(
            describe(&events),
            vec![
                (
                    ChangeAction::Create,
                    EntryKind::Regular,
                    PathBuf::from("a.txt")
                ),
                (
                    ChangeAction::Create,
                    EntryKind::Directory,
                    PathBuf::from("sub")
                ),
                (
                    ChangeAction::Create,
                    EntryKind::Regular,
                    PathBuf::from("sub/inner.txt")
                ),
            ]
        );
        assert_eq!(detector.snapshot().len(), 3);

        // A second scan with no mutations is silent.
        assert!(detector.scan().expect("rescan").is_empty());
    }

    #[test]
    #[serial]
    fn newer_timestamp_is_reported_once_as_modified() {
        let temp = TempDir::new().expect("tempdir");
        let source = temp.path().join("source");
        fs::create_dir(&source).expect("create source");
        let file = source.join("a.txt");
        fs::write(&file, b"one").expect("write");

        let mut detector = ChangeDetector::new(source, logger(&temp));
        detector.scan().expect("initial scan");

        let newer = FileTime::from_system_time(UNIX_EPOCH + Duration::from_secs(4_102_444_800));
        filetime::set_file_mtime(&file, newer).expect("set mtime");

        let events = detector.scan().expect("scan");
        assert_eq!(
            describe(&events),
            vec![(
                ChangeAction::Modify,
                EntryKind::Regular,
                PathBuf::from("a.txt")
            )]
        );

        // The recorded timestamp was updated, so the modify does not repeat.
        assert!(detector.scan().expect("rescan").is_empty());
    }

    #[test]
    #[serial]
    fn unchanged_timestamp_hides_a_content_edit() {
        let temp = TempDir::new().expect("tempdir");
        let source = temp.path().join("source");
        fs::create_dir(&source).expect("create source");
        let file = source.join("a.txt");
        fs::write(&file, b"one").expect("write");

        let mut detector = ChangeDetector::new(source, logger(&temp));
        detector.scan().expect("initial scan");

        let recorded = fs::metadata(&file).and_then(|m| m.modified()).expect("mtime");
        fs::write(&file, b"two").expect("rewrite");
        filetime::set_file_mtime(&file, FileTime::from_system_time(recorded)).expect("set mtime");

        // Timestamp-only detection: the edit is invisible by design.
        assert!(detector.scan().expect("scan").is_empty());
    }

    #[test]
    #[serial]
    fn mirrored_object_disappearance_emits_delete_and_prunes_after_finish() {
        let temp = TempDir::new().expect("tempdir");
        let source = temp.path().join("source");
        fs::create_dir(&source).expect("create source");
        fs::write(source.join("a.txt"), b"x").expect("write");

        let mut detector = ChangeDetector::new(source.clone(), logger(&temp));
        detector.scan().expect("initial scan");
        detector.finish_cycle();

        fs::remove_file(source.join("a.txt")).expect("remove");
        let events = detector.scan().expect("scan");
        assert_eq!(
            describe(&events),
            vec![(
                ChangeAction::Delete,
                EntryKind::Regular,
                PathBuf::from("a.txt")
            )]
        );

        // Removal is deferred until the cycle is finished.
        assert!(detector.snapshot().contains(Path::new("a.txt")));
        detector.finish_cycle();
        assert!(!detector.snapshot().contains(Path::new("a.txt")));

        assert!(detector.scan().expect("rescan").is_empty());
    }

    #[test]
    #[serial]
    fn never_mirrored_object_produces_no_delete_event() {
        let temp = TempDir::new().expect("tempdir");
        let source = temp.path().join("source");
        fs::create_dir(&source).expect("create source");

        let mut detector = ChangeDetector::new(source, logger(&temp));
        // Recorded in the snapshot but never marked as mirrored.
        detector.snapshot.insert(Entry::new(
            PathBuf::from("ghost.txt"),
            EntryKind::Regular,
            UNIX_EPOCH,
        ));

        assert!(detector.scan().expect("scan").is_empty());
        assert!(detector.snapshot().contains(Path::new("ghost.txt")));
    }

    #[cfg(unix)]
    #[test]
    #[serial]
    fn unexpected_objects_are_skipped_not_created() {
        use std::os::unix::fs::symlink;

        let temp = TempDir::new().expect("tempdir");
        let source = temp.path().join("source");
        fs::create_dir(&source).expect("create source");
        fs::write(source.join("a.txt"), b"x").expect("write");
        symlink(source.join("a.txt"), source.join("link")).expect("symlink");

        let mut detector = ChangeDetector::new(source, logger(&temp));
        let events = detector.scan().expect("scan");

        assert_eq!(
            describe(&events),
            vec![(
                ChangeAction::Create,
                EntryKind::Regular,
                PathBuf::from("a.txt")
            )]
        );
        assert!(!detector.snapshot().contains(Path::new("link")));
    }

    #[test]
    #[serial]
    fn kind_change_is_replayed_as_delete_then_create() {
        let temp = TempDir::new().expect("tempdir");
        let source = temp.path().join("source");
        fs::create_dir(&source).expect("create source");
        fs::write(source.join("thing"), b"x").expect("write");

        let mut detector = ChangeDetector::new(source.clone(), logger(&temp));
        detector.scan().expect("initial scan");
        detector.finish_cycle();

        fs::remove_file(source.join("thing")).expect("remove");
        fs::create_dir(source.join("thing")).expect("mkdir");

        let events = detector.scan().expect("scan");
        assert_eq!(
            describe(&events),
            vec![
                (
                    ChangeAction::Delete,
                    EntryKind::Regular,
                    PathBuf::from("thing")
                ),
                (
                    ChangeAction::Create,
                    EntryKind::Directory,
                    PathBuf::from("thing")
                ),
            ]
        );
    }
}
