//! Symbol Guard: a cheap risk score gating mutations on central/widely
//! called symbols (spec.md §4.8 step 4, §7 "Policy" failures).

use crate::graph::{self, DEFAULT_MAX_DEPTH};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

const HIGH_CALLER_THRESHOLD: usize = 10;
const MEDIUM_CALLER_THRESHOLD: usize = 3;

/// How central `symbol_name` is, approximated by its reverse call-graph
/// size at a shallow depth: many distinct callers means an edit ripples
/// further than a single call site.
pub fn assess_risk(store: &Store, symbol_name: &str) -> crate::error::CoreResult<RiskLevel> {
    let callers = graph::reverse_graph(store, symbol_name, DEFAULT_MAX_DEPTH.min(1))?;
    let caller_count = callers.nodes.len().saturating_sub(1);

    Ok(if caller_count >= HIGH_CALLER_THRESHOLD {
        RiskLevel::High
    } else if caller_count >= MEDIUM_CALLER_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    })
}
