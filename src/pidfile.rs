//! Single-instance enforcement via a PID file, checked for liveness rather
//! than just existence so a crash doesn't permanently lock out relaunches.
//!
//! Grounded on `src/sys/process.c` in the original source, which writes
//! `kew_<uid>.pid` under the system temp directory and checks `/proc/<pid>`
//! (or the platform equivalent) before refusing to start.

use std::fs;
use std::path::PathBuf;

/// Path the PID file would live at for the current user, matching the
/// original's `kew_<uid>.pid` naming (kept under this crate's own name
/// rather than the teacher's, since this is the running binary's lock).
pub fn pid_file_path() -> PathBuf {
    let uid = current_uid();
    std::env::temp_dir().join(format!("amuseing_{uid}.pid"))
}

#[cfg(target_os = "linux")]
fn current_uid() -> u32 {
    use std::os::unix::fs::MetadataExt;
    // /proc/self is always owned by the calling process's real uid.
    fs::metadata("/proc/self").map(|m| m.uid()).unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
fn current_uid() -> u32 {
    0
}

/// Whether a process with the given pid is currently alive AND is actually
/// this binary, not just any process that happens to have reused the pid.
/// Checks `/proc/<pid>/comm` against our own binary name rather than trusting
/// `/proc/<pid>`'s existence alone, since pids are recycled by the kernel and
/// an unrelated process could otherwise permanently block a relaunch after a
/// crash. Best-effort: on an error reading `/proc` (permissions, platform
/// without `/proc`) this conservatively reports `false` so a stale lock never
/// blocks a restart forever.
#[cfg(target_os = "linux")]
fn process_is_alive(pid: u32) -> bool {
    let Ok(comm) = fs::read_to_string(format!("/proc/{pid}/comm")) else {
        return false;
    };
    let comm = comm.trim_end_matches('\n');
    comm.contains("amuseing") || comm.contains("kew")
}

#[cfg(not(target_os = "linux"))]
fn process_is_alive(_pid: u32) -> bool {
    false
}

/// Tries to acquire the single-instance lock. Returns `Ok(())` if this
/// process now owns it (the PID file was written with our pid), or an
/// error containing the pid of the process already holding it.
pub fn acquire(path: &PathBuf) -> Result<(), u32> {
    if let Ok(existing) = fs::read_to_string(path) {
        if let Ok(pid) = existing.trim().parse::<u32>() {
            if process_is_alive(pid) {
                return Err(pid);
            }
        }
    }

    let our_pid = std::process::id();
    let _ = fs::write(path, our_pid.to_string());
    Ok(())
}

/// Removes the PID file, but only if it still names this process — a
/// stale read shouldn't let an old invocation delete a newer one's lock.
pub fn release(path: &PathBuf) {
    if let Ok(existing) = fs::read_to_string(path) {
        if existing.trim().parse::<u32>() == Ok(std::process::id()) {
            let _ = fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("amuseing-pidfile-test-{name}-{:?}", std::thread::current().id()))
    }

    #[test]
    fn acquire_writes_our_pid_when_absent() {
        let path = scratch_path("absent");
        let _ = fs::remove_file(&path);
        assert!(acquire(&path).is_ok());
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim(), std::process::id().to_string());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn acquire_overwrites_a_stale_entry() {
        let path = scratch_path("stale");
        fs::write(&path, "999999999").unwrap();
        assert!(acquire(&path).is_ok());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn acquire_overwrites_an_entry_whose_pid_was_recycled_by_another_process() {
        // pid 1 is alive on any Linux system but is never this binary, so a
        // reused pid must not block a relaunch the way a live `amuseing`
        // process would.
        let path = scratch_path("recycled");
        fs::write(&path, "1").unwrap();
        assert!(acquire(&path).is_ok());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn release_only_removes_our_own_entry() {
        let path = scratch_path("foreign");
        fs::write(&path, "123").unwrap();
        release(&path);
        assert!(path.exists(), "release must not remove another process's lock");
        let _ = fs::remove_file(&path);
    }
}
