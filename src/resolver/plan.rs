// src/resolver/plan.rs

//! Resolution result data structures
//!
//! Every mutating solver operation returns a [`SolveOutcome`] holding the
//! four result collections plus diagnostics about ignored input.

use std::collections::BTreeMap;
use std::fmt;

use super::package::PackageKey;

/// Result of one solver operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveOutcome {
    /// Packages pulled in by saturation, neither selected nor installed
    pub additional_packages: Vec<PackageKey>,
    /// Unresolved tag -> packages that required it
    pub unsolved_requirements: BTreeMap<String, Vec<PackageKey>>,
    /// Declaring package -> present packages it conflicts with
    pub conflicts: BTreeMap<PackageKey, Vec<PackageKey>>,
    /// Obsolescence relations among present packages
    pub obsoletes: Vec<ObsoleteEntry>,
    /// Input the operation could not act on
    pub diagnostics: Vec<Diagnostic>,
}

impl SolveOutcome {
    /// No unsolved requirements and no conflicts
    pub fn is_consistent(&self) -> bool {
        self.unsolved_requirements.is_empty() && self.conflicts.is_empty()
    }

    /// True if `a` declares a conflict with `b`
    pub fn has_conflict(&self, a: &PackageKey, b: &PackageKey) -> bool {
        self.conflicts.get(a).is_some_and(|others| others.contains(b))
    }
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Additional packages: {}", self.additional_packages.len())?;
        for key in &self.additional_packages {
            writeln!(f, "  + {}", key)?;
        }
        for (tag, requirers) in &self.unsolved_requirements {
            let names: Vec<String> = requirers.iter().map(ToString::to_string).collect();
            writeln!(f, "Unsolved {} required by {}", tag, names.join(", "))?;
        }
        for (package, others) in &self.conflicts {
            let names: Vec<String> = others.iter().map(ToString::to_string).collect();
            writeln!(f, "Conflict {} with {}", package, names.join(", "))?;
        }
        for entry in &self.obsoletes {
            writeln!(f, "{}", entry)?;
        }
        for diagnostic in &self.diagnostics {
            writeln!(f, "Note: {}", diagnostic)?;
        }
        Ok(())
    }
}

/// One package obsoleting another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObsoleteEntry {
    pub obsoletes: String,
    pub obsoletes_version: String,
    /// Present packages requiring something the obsoleting package provides
    pub obsoletes_dep_packages: Vec<PackageKey>,
    pub is_obsoleted: String,
    pub is_obsoleted_version: String,
    /// Present packages requiring something the obsoleted package provides
    pub is_obsoleted_dep_packages: Vec<PackageKey>,
}

impl ObsoleteEntry {
    pub fn obsoleting_key(&self) -> PackageKey {
        PackageKey::new(self.obsoletes.clone(), self.obsoletes_version.clone())
    }

    pub fn obsoleted_key(&self) -> PackageKey {
        PackageKey::new(self.is_obsoleted.clone(), self.is_obsoleted_version.clone())
    }
}

impl fmt::Display for ObsoleteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} obsoletes {}",
            self.obsoleting_key(),
            self.obsoleted_key()
        )
    }
}

/// Why part of an operation was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Key is not known to the index
    UnknownPackage(PackageKey),
    /// Key is only referenced by the dependency maps and cannot be selected
    NotCandidate(PackageKey),
    /// Deleted package is neither selected nor installed
    NotSelected(PackageKey),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownPackage(key) => write!(f, "unknown package {}", key),
            Diagnostic::NotCandidate(key) => write!(f, "package {} is not a candidate", key),
            Diagnostic::NotSelected(key) => {
                write!(f, "package {} is neither selected nor installed", key)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        let a = PackageKey::new("a", "1.0");
        let b = PackageKey::new("b", "1.0");
        let outcome = SolveOutcome {
            additional_packages: vec![b.clone()],
            unsolved_requirements: BTreeMap::from([("c".to_string(), vec![a.clone()])]),
            conflicts: BTreeMap::from([(a.clone(), vec![b.clone()])]),
            obsoletes: Vec::new(),
            diagnostics: vec![Diagnostic::UnknownPackage(PackageKey::new("z", "9"))],
        };

        let text = outcome.to_string();
        assert!(text.contains("  + b-1.0"));
        assert!(text.contains("Unsolved c required by a-1.0"));
        assert!(text.contains("Conflict a-1.0 with b-1.0"));
        assert!(text.contains("unknown package z-9"));
        assert!(!outcome.is_consistent());
        assert!(outcome.has_conflict(&a, &b));
        assert!(!outcome.has_conflict(&b, &a));
    }

    #[test]
    fn test_obsolete_entry_keys() {
        let entry = ObsoleteEntry {
            obsoletes: "new".to_string(),
            obsoletes_version: "2.0".to_string(),
            obsoletes_dep_packages: Vec::new(),
            is_obsoleted: "old".to_string(),
            is_obsoleted_version: "1.0".to_string(),
            is_obsoleted_dep_packages: Vec::new(),
        };

        assert_eq!(entry.obsoleted_key(), PackageKey::new("old", "1.0"));
        assert_eq!(entry.to_string(), "new-2.0 obsoletes old-1.0");
    }
}
