//! End-to-end session test: spawn the binary, watch it mirror live changes,
//! interrupt it, and verify the orderly shutdown.

#![cfg(unix)]

use std::fs;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

const SESSION_DEADLINE: Duration = Duration::from_secs(60);

/// Polls `predicate` until it holds or the deadline passes.
fn wait_until<F: FnMut() -> bool>(mut predicate: F) -> bool {
    let deadline = Instant::now() + SESSION_DEADLINE;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        thread::sleep(Duration::from_millis(100));
    }
    false
}

fn kill_hard(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[test]
fn mirror_session_end_to_end() {
    let temp = TempDir::new().expect("tempdir");
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    let log_file = temp.path().join("mirror.log");
    fs::create_dir(&source).expect("create source");
    fs::write(source.join("a.txt"), b"alpha").expect("write a.txt");

    let mut child = Command::new(env!("CARGO_BIN_EXE_dirsync"))
        .arg(&source)
        .arg(&replica)
        .arg("1")
        .arg(&log_file)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn dirsync");

    // Cold start: the pre-existing file is treated as newly created.
    if !wait_until(|| replica.join("a.txt").is_file()) {
        kill_hard(&mut child);
        panic!("a.txt never appeared in the replica");
    }
    assert_eq!(fs::read(replica.join("a.txt")).expect("read"), b"alpha");

    // A file created while the mirror runs is picked up by a later poll.
    fs::write(source.join("b.txt"), b"beta").expect("write b.txt");
    if !wait_until(|| replica.join("b.txt").is_file()) {
        kill_hard(&mut child);
        panic!("b.txt never appeared in the replica");
    }

    // A deletion is replayed as well.
    fs::remove_file(source.join("a.txt")).expect("remove a.txt");
    if !wait_until(|| !replica.join("a.txt").exists()) {
        kill_hard(&mut child);
        panic!("a.txt was never deleted from the replica");
    }

    // SAFETY: delivers SIGINT to the child we spawned above.
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGINT);
    }

    let deadline = Instant::now() + SESSION_DEADLINE;
    let status = loop {
        match child.try_wait().expect("try_wait") {
            Some(status) => break status,
            None if Instant::now() >= deadline => {
                kill_hard(&mut child);
                panic!("dirsync did not exit after SIGINT");
            }
            None => thread::sleep(Duration::from_millis(50)),
        }
    };
    assert!(status.success(), "interrupted shutdown must exit 0");

    let log = fs::read_to_string(&log_file).expect("read log");
    assert!(log.contains("Regular file a.txt has been created in Replica | "));
    assert!(log.contains("Regular file b.txt has been created in Replica | "));
    assert!(log.contains("Regular file a.txt has been deleted from Replica | "));
    assert!(log.contains("Interrupt received"));
    // The file sink is never colored.
    assert!(!log.contains('\x1b'));
}

#[test]
fn populated_subtree_is_mirrored_recursively() {
    let temp = TempDir::new().expect("tempdir");
    let source = temp.path().join("source");
    let replica = temp.path().join("replica");
    let log_file = temp.path().join("mirror.log");
    fs::create_dir(&source).expect("create source");

    let mut child = Command::new(env!("CARGO_BIN_EXE_dirsync"))
        .arg(&source)
        .arg(&replica)
        .arg("1")
        .arg(&log_file)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn dirsync");

    // Drop a whole populated subtree in at once; a single poll must carry
    // all of it over.
    fs::create_dir_all(source.join("sub").join("deep")).expect("create tree");
    fs::write(source.join("sub").join("one.txt"), b"1").expect("write");
    fs::write(source.join("sub").join("deep").join("two.txt"), b"2").expect("write");

    let copied = wait_until(|| {
        replica.join("sub/one.txt").is_file() && replica.join("sub/deep/two.txt").is_file()
    });
    if !copied {
        kill_hard(&mut child);
        panic!("subtree was not mirrored");
    }
    assert_eq!(fs::read(replica.join("sub/deep/two.txt")).expect("read"), b"2");

    // SAFETY: delivers SIGTERM to the child we spawned above.
    unsafe {
        libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
    }
    let _ = wait_until(|| matches!(child.try_wait(), Ok(Some(_))));
    kill_hard(&mut child);
}
