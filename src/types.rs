//! Small value types shared across every subsystem.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

/// Opaque row id for a `symbols` row. Never zero so it doubles as an
/// `Option<SymbolId>` niche.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(NonZeroU32);

impl SymbolId {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn value(&self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.get())
    }
}

/// A line/column span, 1-indexed lines, 0-indexed columns (tree-sitter's
/// convention, carried through unchanged).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u16,
    pub end_line: u32,
    pub end_column: u16,
}

impl Range {
    pub fn new(start_line: u32, start_column: u16, end_line: u32, end_column: u16) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// `true` if `other` overlaps this range by line (column-insensitive —
    /// used for the changed-range / symbol-span overlap tests in the
    /// incremental engine, where we only ever have line granularity from a
    /// diff).
    pub fn overlaps_lines(&self, other_start: u32, other_end: u32) -> bool {
        self.start_line <= other_end && other_start <= self.end_line
    }
}

/// `type ∈ {function, class, method, variable, interface}` — spec.md §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Class,
    Method,
    Variable,
    Interface,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Variable => "variable",
            SymbolKind::Interface => "interface",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "function" => Some(SymbolKind::Function),
            "class" => Some(SymbolKind::Class),
            "method" => Some(SymbolKind::Method),
            "variable" => Some(SymbolKind::Variable),
            "interface" => Some(SymbolKind::Interface),
            _ => None,
        }
    }
}

impl std::fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `reference_type ∈ {method_call, instance_of, inherits, type_annotation,
/// return_type}` — spec.md §3 `SymbolReference`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    MethodCall,
    InstanceOf,
    Inherits,
    TypeAnnotation,
    ReturnType,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::MethodCall => "method_call",
            ReferenceKind::InstanceOf => "instance_of",
            ReferenceKind::Inherits => "inherits",
            ReferenceKind::TypeAnnotation => "type_annotation",
            ReferenceKind::ReturnType => "return_type",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "method_call" => Some(ReferenceKind::MethodCall),
            "instance_of" => Some(ReferenceKind::InstanceOf),
            "inherits" => Some(ReferenceKind::Inherits),
            "type_annotation" => Some(ReferenceKind::TypeAnnotation),
            "return_type" => Some(ReferenceKind::ReturnType),
            _ => None,
        }
    }
}

/// Repo-relative, forward-slash-normalized file path. Every table keys off
/// this rather than an absolute path so an index is portable across clones.
pub fn repo_relative(root: &Path, path: &Path) -> PathBuf {
    let rel = path.strip_prefix(root).unwrap_or(path);
    PathBuf::from(rel.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_id_rejects_zero() {
        assert!(SymbolId::new(0).is_none());
        assert_eq!(SymbolId::new(7).unwrap().value(), 7);
    }

    #[test]
    fn symbol_kind_round_trips_through_str() {
        for kind in [
            SymbolKind::Function,
            SymbolKind::Class,
            SymbolKind::Method,
            SymbolKind::Variable,
            SymbolKind::Interface,
        ] {
            assert_eq!(SymbolKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn range_overlap_is_inclusive() {
        let r = Range::new(10, 0, 20, 0);
        assert!(r.overlaps_lines(20, 25));
        assert!(r.overlaps_lines(5, 10));
        assert!(!r.overlaps_lines(21, 30));
        assert!(!r.overlaps_lines(1, 9));
    }
}
