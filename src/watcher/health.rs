//! Watcher self-health: uptime, events processed, log size, CPU% — and the
//! two self-stop thresholds (spec.md §4.5).

use std::path::Path;
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, System};

#[derive(Debug, Clone)]
pub struct HealthThresholds {
    pub max_log_bytes: u64,
    pub max_cpu_percent: f32,
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    pub uptime: Duration,
    pub events_processed: u64,
    pub updates_triggered: u64,
    pub log_bytes: u64,
    pub cpu_percent: f32,
}

impl HealthReport {
    /// `Some(reason)` if either critical threshold is breached — the
    /// caller self-stops and reports it verbatim.
    pub fn breach_reason(&self, thresholds: &HealthThresholds) -> Option<String> {
        if self.log_bytes > thresholds.max_log_bytes {
            return Some(format!(
                "log file exceeded {} bytes (at {})",
                thresholds.max_log_bytes, self.log_bytes
            ));
        }
        if self.cpu_percent > thresholds.max_cpu_percent {
            return Some(format!(
                "sustained CPU usage {:.1}% exceeded threshold {:.1}%",
                self.cpu_percent, thresholds.max_cpu_percent
            ));
        }
        None
    }
}

pub fn sample(uptime: Duration, events_processed: u64, updates_triggered: u64, state_dir: &Path) -> HealthReport {
    let log_bytes = std::fs::metadata(state_dir.join("watcher.log")).map(|m| m.len()).unwrap_or(0);

    let mut sys = System::new();
    let pid = Pid::from_u32(std::process::id());
    sys.refresh_processes_specifics(
        sysinfo::ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing().with_cpu(),
    );
    let cpu_percent = sys.process(pid).map(|p| p.cpu_usage()).unwrap_or(0.0);

    HealthReport {
        uptime,
        events_processed,
        updates_triggered,
        log_bytes,
        cpu_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breach_reports_log_size_first() {
        let report = HealthReport {
            uptime: Duration::ZERO,
            events_processed: 0,
            updates_triggered: 0,
            log_bytes: 100,
            cpu_percent: 5.0,
        };
        let thresholds = HealthThresholds { max_log_bytes: 10, max_cpu_percent: 90.0 };
        assert!(report.breach_reason(&thresholds).unwrap().contains("log file"));
    }

    #[test]
    fn no_breach_under_thresholds() {
        let report = HealthReport {
            uptime: Duration::ZERO,
            events_processed: 0,
            updates_triggered: 0,
            log_bytes: 5,
            cpu_percent: 5.0,
        };
        let thresholds = HealthThresholds { max_log_bytes: 10, max_cpu_percent: 90.0 };
        assert!(report.breach_reason(&thresholds).is_none());
    }
}
