// src/resolver/conflict.rs

//! Conflict and obsolete detection
//!
//! Runs over the packages present after saturation. Conflicts are reported
//! per declaring package; obsoletes are asymmetric and reported as
//! (obsoleting, obsoleted) pairs so the caller can decide whether to drop
//! the obsoleted package from the plan.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::ignore::IgnoreRegistry;
use super::index::{DependencyIndex, PackIndex};
use super::package::PackStat;
use crate::config::SolverConfig;

/// Raw detection result in index space
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictReport {
    /// Declaring package -> present packages it conflicts with
    pub conflicts: BTreeMap<PackIndex, BTreeSet<PackIndex>>,
    /// (obsoleting, obsoleted) pairs
    pub obsoletes: BTreeSet<(PackIndex, PackIndex)>,
}

impl ConflictReport {
    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty() && self.obsoletes.is_empty()
    }
}

pub struct ConflictDetector<'a> {
    index: &'a DependencyIndex,
    ignore: &'a IgnoreRegistry,
    config: &'a SolverConfig,
}

impl<'a> ConflictDetector<'a> {
    pub fn new(index: &'a DependencyIndex, ignore: &'a IgnoreRegistry, config: &'a SolverConfig) -> Self {
        Self {
            index,
            ignore,
            config,
        }
    }

    /// Detect conflicts and obsoletes, updating the `has_excl` markers
    pub fn detect(&self, stats: &mut [PackStat]) -> ConflictReport {
        let mut report = ConflictReport::default();
        let present = |stat: &PackStat| stat.is_present(self.config.installed_present);

        for stat in stats.iter_mut() {
            stat.set_has_excl(false);
        }

        for package in 0..stats.len() {
            if !present(&stats[package]) {
                continue;
            }

            for &other in self.index.conflicts(package) {
                if !present(&stats[other]) {
                    continue;
                }
                if self.ignore.is_conflict_ignored(package, other) {
                    debug!(
                        "Conflict {} -> {} is ignored",
                        self.index.key(package),
                        self.index.key(other)
                    );
                    continue;
                }
                report.conflicts.entry(package).or_default().insert(other);
            }

            // Only packages in the plan can obsolete anything
            if !stats[package].in_solution() {
                continue;
            }
            let obsoleted = self
                .index
                .obsoletes(package)
                .iter()
                .chain(self.index.inst_obsoletes(package));
            for &other in obsoleted {
                if present(&stats[other]) {
                    report.obsoletes.insert((package, other));
                }
            }
        }

        for (&package, others) in &report.conflicts {
            stats[package].set_has_excl(true);
            for &other in others {
                stats[other].set_has_excl(true);
            }
        }

        debug!(
            "Detected {} conflicting packages and {} obsoletes",
            report.conflicts.len(),
            report.obsoletes.len()
        );
        report
    }

    /// Present packages that directly require a tag `package` provides
    pub fn dependants(&self, stats: &[PackStat], package: PackIndex) -> BTreeSet<PackIndex> {
        self.index
            .provided_tags(package)
            .iter()
            .filter(|&&tag| !self.ignore.is_provide_ignored(package, tag))
            .flat_map(|&tag| self.index.required_by(tag).iter().copied())
            .filter(|&other| other != package)
            .filter(|&other| stats[other].is_present(self.config.installed_present))
            .collect()
    }
}
