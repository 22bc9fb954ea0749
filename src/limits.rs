//! C1/C3 — process-wide limits, preflight checks, and the running-total
//! enforcer that wraps the scanner's sequence (spec.md §4.1).

use crate::config::LimitsConfig;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CheckStatus {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreflightCheck {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreflightReport {
    pub status: CheckStatus,
    pub checks: Vec<PreflightCheck>,
    pub can_proceed: bool,
}

/// Disk-space probe, abstracted so tests can stub it (mirrors `GitProbe` in
/// the incremental engine — a capability the real filesystem provides and a
/// test fakes).
pub trait DiskProbe {
    fn free_bytes(&self, path: &std::path::Path) -> std::io::Result<u64>;
}

pub struct SystemDiskProbe;

impl DiskProbe for SystemDiskProbe {
    fn free_bytes(&self, path: &std::path::Path) -> std::io::Result<u64> {
        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let disks = sysinfo::Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .filter(|d| canonical.starts_with(d.mount_point()))
            .max_by_key(|d| d.mount_point().as_os_str().len())
            .map(|d| d.available_space())
            .ok_or_else(|| std::io::Error::other("no mounted disk found for path"))
    }
}

/// Runs the preflight checks in spec.md §4.1 against the project root and
/// any existing index file, using `probe` for the free-disk check.
pub fn preflight(limits: &LimitsConfig, root: &std::path::Path, index_size_bytes: u64, probe: &dyn DiskProbe) -> PreflightReport {
    let mut checks = Vec::new();

    match probe.free_bytes(root) {
        Ok(free) => {
            let min = limits.min_free_disk_mb * 1_000_000;
            let status = if free < min { CheckStatus::Fail } else { CheckStatus::Ok };
            checks.push(PreflightCheck {
                name: "free_disk".into(),
                status,
                detail: format!("{free} bytes free, floor {min}"),
            });
        }
        Err(e) => checks.push(PreflightCheck {
            name: "free_disk".into(),
            status: CheckStatus::Warn,
            detail: format!("could not probe free disk: {e}"),
        }),
    }

    let max_index_bytes = limits.max_index_size_mb * 1_000_000;
    let fraction = index_size_bytes as f64 / max_index_bytes as f64;
    let index_status = if index_size_bytes > max_index_bytes {
        CheckStatus::Fail
    } else if fraction >= limits.warn_threshold {
        CheckStatus::Warn
    } else {
        CheckStatus::Ok
    };
    checks.push(PreflightCheck {
        name: "index_size".into(),
        status: index_status,
        detail: format!("{index_size_bytes} of {max_index_bytes} bytes ({:.0}%)", fraction * 100.0),
    });

    let aggregate = aggregate_status(&checks);
    let can_proceed = match aggregate {
        CheckStatus::Fail => false,
        CheckStatus::Warn => !limits.strict_mode,
        CheckStatus::Ok => true,
    };

    PreflightReport {
        status: aggregate,
        checks,
        can_proceed,
    }
}

fn aggregate_status(checks: &[PreflightCheck]) -> CheckStatus {
    if checks.iter().any(|c| c.status == CheckStatus::Fail) {
        CheckStatus::Fail
    } else if checks.iter().any(|c| c.status == CheckStatus::Warn) {
        CheckStatus::Warn
    } else {
        CheckStatus::Ok
    }
}

/// What the enforcer decided about a single scanned file, in the running
/// fold over the scanner's sequence (spec.md §4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnforcementDecision {
    Allowed,
    /// File-level skip (size cap); the running total is unaffected.
    Skipped { reason: String },
    /// Global ceiling crossed; indexing stops after this point.
    Stopped { reason: String },
}

/// Running-total gate between the parallel scanner and the serialized
/// writer lane. Call `admit` once per file's symbol count, in scan order;
/// once it returns `Stopped`, the caller must stop feeding it further files.
pub struct SymbolBudget {
    max_total: usize,
    running_total: usize,
    stopped: bool,
}

impl SymbolBudget {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            max_total: limits.max_total_symbols,
            running_total: 0,
            stopped: false,
        }
    }

    pub fn admit(&mut self, symbol_count: usize) -> EnforcementDecision {
        if self.stopped {
            return EnforcementDecision::Stopped {
                reason: "global symbol ceiling already reached".into(),
            };
        }
        let projected = self.running_total + symbol_count;
        if projected > self.max_total {
            self.stopped = true;
            return EnforcementDecision::Stopped {
                reason: format!("total symbols would reach {projected}, ceiling is {}", self.max_total),
            };
        }
        self.running_total = projected;
        EnforcementDecision::Allowed
    }

    pub fn running_total(&self) -> usize {
        self.running_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeDisk(u64);
    impl DiskProbe for FakeDisk {
        fn free_bytes(&self, _path: &std::path::Path) -> std::io::Result<u64> {
            Ok(self.0)
        }
    }

    #[test]
    fn preflight_fails_below_disk_floor() {
        let limits = LimitsConfig {
            min_free_disk_mb: 1_000,
            ..LimitsConfig::default()
        };
        let report = preflight(&limits, std::path::Path::new("."), 0, &FakeDisk(1));
        assert_eq!(report.status, CheckStatus::Fail);
        assert!(!report.can_proceed);
    }

    #[test]
    fn strict_mode_turns_warn_into_refusal() {
        let limits = LimitsConfig {
            max_index_size_mb: 10,
            warn_threshold: 0.1,
            strict_mode: true,
            ..LimitsConfig::default()
        };
        let report = preflight(&limits, std::path::Path::new("."), 5_000_000, &FakeDisk(u64::MAX));
        assert_eq!(report.status, CheckStatus::Warn);
        assert!(!report.can_proceed);
    }

    #[test]
    fn budget_stops_cleanly_at_ceiling() {
        let limits = LimitsConfig {
            max_total_symbols: 100,
            ..LimitsConfig::default()
        };
        let mut budget = SymbolBudget::new(&limits);
        assert_eq!(budget.admit(60), EnforcementDecision::Allowed);
        assert!(matches!(budget.admit(50), EnforcementDecision::Stopped { .. }));
        assert!(matches!(budget.admit(1), EnforcementDecision::Stopped { .. }));
    }
}
