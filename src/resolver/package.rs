// src/resolver/package.rs

//! Package identity, dependency atoms and per-package solver state

use crate::version::{CompareOp, Version};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named capability a package can provide or obsolete
pub type Tag = String;

/// Canonical identity of a package: name plus version string
///
/// Ordering is by name, then by the raw version string. This is an identity
/// order for maps and output, not a version comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PackageKey {
    pub name: String,
    pub version: String,
}

impl PackageKey {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for PackageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}-{}", self.name, self.version)
        }
    }
}

/// One AND-dependency atom: a target tag with an optional version constraint
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependence {
    pub name: String,
    #[serde(default)]
    pub compare: CompareOp,
    #[serde(default)]
    pub version: String,
}

impl Dependence {
    /// Presence-only dependency on a tag
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            compare: CompareOp::None,
            version: String::new(),
        }
    }

    /// Dependency on a tag with a version constraint
    pub fn versioned(name: impl Into<String>, compare: CompareOp, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            compare,
            version: version.into(),
        }
    }

    /// Build a dependency from its three textual parts
    ///
    /// An unparsable operator degrades to a presence-only dependency.
    pub fn from_parts(name: &str, compare: &str, version: &str) -> Self {
        let compare = CompareOp::parse_lenient(compare);
        if compare.is_versioned() {
            Self::versioned(name, compare, version)
        } else {
            Self::new(name)
        }
    }

    /// Parse "name", "name op version" or "name op" style dependency strings
    ///
    /// Examples: `"libc"`, `"libc >= 2.31"`, `"grep LT 5.0"`
    pub fn parse(spec: &str) -> Self {
        let mut parts = spec.split_whitespace();
        let name = parts.next().unwrap_or_default();
        match (parts.next(), parts.next()) {
            (Some(op), Some(version)) => Self::from_parts(name, op, version),
            _ => Self::new(name),
        }
    }

    /// Parsed form of the required version
    pub fn required_version(&self) -> Version {
        Version::parse(&self.version)
    }
}

impl fmt::Display for Dependence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.compare.is_versioned() {
            write!(f, "{} {} {}", self.name, self.compare, self.version)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// Mutable solver state of one package
///
/// After a solve `used_by` is greater than zero for every selected and every
/// pulled-in package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackStat {
    name: String,
    version: String,
    used_by: u32,
    in_selection: bool,
    is_installed: bool,
    is_broken: bool,
    has_or: bool,
    has_excl: bool,
}

impl PackStat {
    pub fn new(key: &PackageKey) -> Self {
        Self {
            name: key.name.clone(),
            version: key.version.clone(),
            used_by: 0,
            in_selection: false,
            is_installed: false,
            is_broken: false,
            has_or: false,
            has_excl: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn key(&self) -> PackageKey {
        PackageKey::new(self.name.clone(), self.version.clone())
    }

    pub fn used_by(&self) -> u32 {
        self.used_by
    }

    pub fn in_selection(&self) -> bool {
        self.in_selection
    }

    pub fn is_installed(&self) -> bool {
        self.is_installed
    }

    pub fn is_broken(&self) -> bool {
        self.is_broken
    }

    /// Package has OR-requirements that were evaluated in the current pass
    pub fn has_or(&self) -> bool {
        self.has_or
    }

    /// Package takes part in at least one detected conflict
    pub fn has_excl(&self) -> bool {
        self.has_excl
    }

    /// Part of the computed solution: selected or pulled in
    pub fn in_solution(&self) -> bool {
        self.used_by > 0 || self.in_selection
    }

    /// On the system after the plan runs, for conflict and obsolete checks
    pub fn is_present(&self, installed_present: bool) -> bool {
        self.in_solution() || (installed_present && self.is_installed)
    }

    pub fn inc_used_by(&mut self) {
        self.used_by = self.used_by.saturating_add(1);
    }

    pub fn dec_used_by(&mut self) {
        if self.used_by > 0 {
            self.used_by -= 1;
        } else {
            tracing::warn!("Decrement of used-by counter below zero for {}", self.key());
        }
    }

    pub fn set_in_selection(&mut self, in_selection: bool) {
        self.in_selection = in_selection;
    }

    pub fn set_installed(&mut self, installed: bool) {
        self.is_installed = installed;
    }

    pub fn set_broken(&mut self, broken: bool) {
        self.is_broken = broken;
    }

    pub fn set_has_or(&mut self, has_or: bool) {
        self.has_or = has_or;
    }

    pub fn set_has_excl(&mut self, has_excl: bool) {
        self.has_excl = has_excl;
    }

    /// Reset everything a solve recomputes, keeping identity and install state
    pub fn reset(&mut self) {
        self.used_by = 0;
        self.in_selection = false;
        self.is_broken = false;
        self.has_or = false;
        self.has_excl = false;
    }
}
