//! Collects paths over a quiet window and fires once with the accumulated
//! set (spec.md §4.5). Same-file events coalesce; the last-seen batch wins.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub struct Debouncer {
    quiet_window: Duration,
    pending: BTreeSet<PathBuf>,
    last_event_at: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            quiet_window,
            pending: BTreeSet::new(),
            last_event_at: None,
        }
    }

    pub fn push(&mut self, path: PathBuf) {
        self.pending.insert(path);
        self.last_event_at = Some(Instant::now());
    }

    /// How long the caller's select loop should wait before polling again.
    pub fn next_timeout(&self) -> Duration {
        match self.last_event_at {
            None => Duration::from_secs(3600),
            Some(at) => self.quiet_window.saturating_sub(at.elapsed()).max(Duration::from_millis(1)),
        }
    }

    /// Returns the accumulated batch once the quiet window has elapsed
    /// since the last push, clearing pending state. Returns `None` if the
    /// window hasn't elapsed yet or nothing is pending.
    pub fn take_ready(&mut self) -> Option<Vec<PathBuf>> {
        let at = self.last_event_at?;
        if at.elapsed() < self.quiet_window {
            return None;
        }
        self.last_event_at = None;
        Some(std::mem::take(&mut self.pending).into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn does_not_fire_before_quiet_window() {
        let mut d = Debouncer::new(Duration::from_millis(50));
        d.push(PathBuf::from("a.rs"));
        assert!(d.take_ready().is_none());
    }

    #[test]
    fn fires_after_quiet_window_with_coalesced_set() {
        let mut d = Debouncer::new(Duration::from_millis(10));
        d.push(PathBuf::from("a.rs"));
        d.push(PathBuf::from("a.rs"));
        d.push(PathBuf::from("b.rs"));
        std::thread::sleep(Duration::from_millis(20));
        let batch = d.take_ready().unwrap();
        assert_eq!(batch, vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")]);
        assert!(d.take_ready().is_none());
    }
}
