//! C6 — the long-lived filesystem watcher daemon: singleton per project
//! root, debounced event intake, and self-health monitoring
//! (spec.md §4.5).

mod debounce;
mod health;
mod pidfile;

pub use debounce::Debouncer;
pub use health::{HealthReport, HealthThresholds};
pub use pidfile::PidFile;

use crate::config::Settings;
use crossbeam_channel::{select, Receiver, Sender};
use notify::{RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("another watcher is already running for this project (pid {0})")]
    AlreadyRunning(u32),

    #[error("filesystem watch error: {0}")]
    Notify(#[from] notify::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watcher stopped: {0}")]
    SelfStopped(String),
}

pub type WatcherResult<T> = Result<T, WatcherError>;

/// Commands accepted over the control channel (spec.md §4.5).
#[derive(Debug, Clone)]
pub enum Command {
    Stop,
    Status,
    Health,
}

#[derive(Debug, Clone)]
pub enum Event {
    StatusReply { uptime: Duration, events_processed: u64, updates_triggered: u64 },
    HealthReply(HealthReport),
    Stopped { reason: Option<String> },
}

/// Runs the watcher loop for `root` until stopped, a critical threshold
/// trips, or the control channel closes. `on_batch` is invoked with the
/// debounced path set once the quiet window elapses; it should run C5 and
/// invalidate any in-memory caches on success.
pub fn run(
    root: &Path,
    settings: &Settings,
    control_rx: Receiver<Command>,
    events_tx: Sender<Event>,
    mut on_batch: impl FnMut(&[PathBuf]) -> bool,
) -> WatcherResult<()> {
    let _pid_file = PidFile::acquire(&settings.state_dir(), root)?;

    let (fs_tx, fs_rx) = crossbeam_channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = fs_tx.send(event);
        }
    })?;
    watcher.watch(root, RecursiveMode::Recursive)?;

    let mut debouncer = Debouncer::new(Duration::from_millis(settings.watcher.debounce_ms));
    let thresholds = HealthThresholds {
        max_log_bytes: settings.watcher.max_log_bytes,
        max_cpu_percent: settings.watcher.max_cpu_percent,
    };
    let start = Instant::now();
    let mut events_processed: u64 = 0;
    let mut updates_triggered: u64 = 0;
    let extensions: std::collections::HashSet<_> = settings.indexing.extensions.iter().map(String::as_str).collect();
    let state_dir = settings.state_dir();

    loop {
        let timeout = debouncer.next_timeout();
        select! {
            recv(control_rx) -> cmd => {
                match cmd {
                    Ok(Command::Stop) | Err(_) => {
                        let _ = events_tx.send(Event::Stopped { reason: None });
                        return Ok(());
                    }
                    Ok(Command::Status) => {
                        let _ = events_tx.send(Event::StatusReply {
                            uptime: start.elapsed(),
                            events_processed,
                            updates_triggered,
                        });
                    }
                    Ok(Command::Health) => {
                        let report = health::sample(start.elapsed(), events_processed, updates_triggered, &state_dir);
                        let _ = events_tx.send(Event::HealthReply(report.clone()));
                        if let Some(reason) = report.breach_reason(&thresholds) {
                            let _ = events_tx.send(Event::Stopped { reason: Some(reason.clone()) });
                            return Err(WatcherError::SelfStopped(reason));
                        }
                    }
                }
            }
            recv(fs_rx) -> event => {
                if let Ok(event) = event {
                    events_processed += 1;
                    for path in event.paths {
                        if is_watched(&path, &extensions, &state_dir) {
                            debouncer.push(path);
                        }
                    }
                }
            }
            default(timeout) => {}
        }

        if let Some(batch) = debouncer.take_ready() {
            if !batch.is_empty() {
                updates_triggered += 1;
                if !on_batch(&batch) {
                    tracing::warn!("incremental update failed for batch of {} files", batch.len());
                }
            }
        }

        let report = health::sample(start.elapsed(), events_processed, updates_triggered, &state_dir);
        if let Some(reason) = report.breach_reason(&thresholds) {
            let _ = events_tx.send(Event::Stopped { reason: Some(reason.clone()) });
            return Err(WatcherError::SelfStopped(reason));
        }
    }
}

fn is_watched(path: &Path, extensions: &std::collections::HashSet<&str>, state_dir: &Path) -> bool {
    if path.starts_with(state_dir) {
        return false;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions.contains(ext),
        None => false,
    }
}

pub struct WatcherHandle {
    pub control_tx: Sender<Command>,
    pub events_rx: Receiver<Event>,
    pub join: std::thread::JoinHandle<WatcherResult<()>>,
}

/// Spawns the watcher loop on its own thread and returns a handle for
/// sending control commands and reading status/health replies.
pub fn spawn(
    root: PathBuf,
    settings: Arc<Settings>,
    on_batch: impl FnMut(&[PathBuf]) -> bool + Send + 'static,
) -> WatcherHandle {
    let (control_tx, control_rx) = crossbeam_channel::unbounded();
    let (events_tx, events_rx) = crossbeam_channel::unbounded();
    let join = std::thread::spawn(move || run(&root, &settings, control_rx, events_tx, on_batch));
    WatcherHandle { control_tx, events_rx, join }
}
