//! Singleton enforcement: one active watcher per project root, via a PID
//! file under the per-project state dir (spec.md §4.5, §6).

use super::{WatcherError, WatcherResult};
use std::path::{Path, PathBuf};

/// Held for the watcher process's lifetime; removes the PID file on drop.
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Acquires the PID file for `project_root` under `state_dir`, failing
    /// if another live process already holds it.
    pub fn acquire(state_dir: &Path, project_root: &Path) -> WatcherResult<Self> {
        std::fs::create_dir_all(state_dir)?;
        let path = state_dir.join(pid_file_name(project_root));

        if let Ok(existing) = std::fs::read_to_string(&path) {
            if let Ok(pid) = existing.trim().parse::<u32>() {
                if process_is_alive(pid) {
                    return Err(WatcherError::AlreadyRunning(pid));
                }
            }
        }

        std::fs::write(&path, std::process::id().to_string())?;
        Ok(Self { path })
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn pid_file_name(project_root: &Path) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(project_root.to_string_lossy().as_bytes());
    format!("{:x}.pid", hasher.finalize())
}

fn process_is_alive(pid: u32) -> bool {
    let mut sys = sysinfo::System::new();
    sys.refresh_processes_specifics(
        sysinfo::ProcessesToUpdate::Some(&[sysinfo::Pid::from_u32(pid)]),
        true,
        sysinfo::ProcessRefreshKind::nothing(),
    );
    sys.process(sysinfo::Pid::from_u32(pid)).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_for_same_root_fails_while_held() {
        let dir = tempfile::tempdir().unwrap();
        let project = PathBuf::from("/tmp/some-project");
        let _first = PidFile::acquire(dir.path(), &project).unwrap();
        let second = PidFile::acquire(dir.path(), &project);
        assert!(second.is_err());
    }

    #[test]
    fn drop_releases_the_pid_file() {
        let dir = tempfile::tempdir().unwrap();
        let project = PathBuf::from("/tmp/some-other-project");
        {
            let _pf = PidFile::acquire(dir.path(), &project).unwrap();
        }
        let _reacquired = PidFile::acquire(dir.path(), &project).unwrap();
    }
}
