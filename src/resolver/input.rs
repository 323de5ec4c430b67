// src/resolver/input.rs

//! Raw, name-keyed dependency input consumed by the solver
//!
//! These maps are produced by whatever reads repository metadata. The solver
//! only reads them once while building its index.

use std::collections::{BTreeMap, BTreeSet};

use super::package::{Dependence, PackageKey, Tag};

/// Package → ordered AND-list of dependency atoms (requires, conflicts)
pub type PackDepMap = BTreeMap<PackageKey, Vec<Dependence>>;

/// Package → set of capability tags (provides, obsoletes)
pub type PackTagMap = BTreeMap<PackageKey, BTreeSet<Tag>>;

/// Package → OR-groups; each group is satisfied by any one alternative
pub type PackOrDepMap = BTreeMap<PackageKey, Vec<Vec<Dependence>>>;

/// The four dependency maps plus OR-requirements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMaps {
    pub requires: PackDepMap,
    pub conflicts: PackDepMap,
    pub provides: PackTagMap,
    pub obsoletes: PackTagMap,
    pub or_requires: PackOrDepMap,
}

impl DependencyMaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_requires(mut self, package: PackageKey, deps: Vec<Dependence>) -> Self {
        self.requires.entry(package).or_default().extend(deps);
        self
    }

    pub fn with_conflicts(mut self, package: PackageKey, deps: Vec<Dependence>) -> Self {
        self.conflicts.entry(package).or_default().extend(deps);
        self
    }

    pub fn with_provides<I, T>(mut self, package: PackageKey, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.provides
            .entry(package)
            .or_default()
            .extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_obsoletes<I, T>(mut self, package: PackageKey, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Tag>,
    {
        self.obsoletes
            .entry(package)
            .or_default()
            .extend(tags.into_iter().map(Into::into));
        self
    }

    /// Add one OR-group: the requirement holds if any alternative is met
    pub fn with_or_requires(mut self, package: PackageKey, alternatives: Vec<Dependence>) -> Self {
        self.or_requires.entry(package).or_default().push(alternatives);
        self
    }

    /// Merge another set of maps into this one
    ///
    /// Dependency lists are appended, tag sets are unioned.
    pub fn merge(&mut self, other: DependencyMaps) {
        for (key, deps) in other.requires {
            self.requires.entry(key).or_default().extend(deps);
        }
        for (key, deps) in other.conflicts {
            self.conflicts.entry(key).or_default().extend(deps);
        }
        for (key, tags) in other.provides {
            self.provides.entry(key).or_default().extend(tags);
        }
        for (key, tags) in other.obsoletes {
            self.obsoletes.entry(key).or_default().extend(tags);
        }
        for (key, groups) in other.or_requires {
            self.or_requires.entry(key).or_default().extend(groups);
        }
    }

    /// Every package key mentioned as a map key, in key order
    pub fn keys(&self) -> BTreeSet<&PackageKey> {
        self.requires
            .keys()
            .chain(self.conflicts.keys())
            .chain(self.provides.keys())
            .chain(self.obsoletes.keys())
            .chain(self.or_requires.keys())
            .collect()
    }
}

/// Secondary dependency overlay for working-selection scenarios
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdditionalDependencies {
    pub maps: DependencyMaps,
    pub valid_packages: Vec<PackageKey>,
}

/// Everything needed to build a solver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverInput {
    pub maps: DependencyMaps,
    /// Candidate packages that may be selected or pulled in
    pub valid_packages: Vec<PackageKey>,
    /// Packages already present on the system
    pub installed_packages: Vec<PackageKey>,
    /// Optional overlay merged over `maps` and `valid_packages`
    pub additional: Option<AdditionalDependencies>,
}

impl SolverInput {
    pub fn new(
        maps: DependencyMaps,
        valid_packages: Vec<PackageKey>,
        installed_packages: Vec<PackageKey>,
    ) -> Self {
        Self {
            maps,
            valid_packages,
            installed_packages,
            additional: None,
        }
    }

    pub fn with_additional(mut self, additional: AdditionalDependencies) -> Self {
        self.additional = Some(additional);
        self
    }
}
