// src/resolver/engine.rs

//! Solver façade
//!
//! Owns the dependency index, the per-package state and the ignore registry
//! for one resolution session, and exposes the solve/add/delete/simulate
//! operations on top of them.
//!
//! A solver starts idle with an empty selection. Every mutating operation
//! leaves it solved and returns a fresh [`SolveOutcome`]. Invalid package
//! keys never fail an operation; they are skipped, logged, and reported as
//! [`Diagnostic`]s.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use super::conflict::{ConflictDetector, ConflictReport};
use super::ignore::IgnoreRegistry;
use super::index::{DependencyIndex, IndexStats, PackIndex, Requirement};
use super::input::SolverInput;
use super::package::{PackStat, PackageKey};
use super::plan::{Diagnostic, ObsoleteEntry, SolveOutcome};
use super::saturate::{SaturationEngine, UnsolvedMap};
use super::simulate::RemovalSimulation;
use crate::config::{RemovalPolicy, SolverConfig, TraceLevel};

/// Greedy dependency solver for one session
pub struct Solver {
    index: DependencyIndex,
    stats: Vec<PackStat>,
    config: SolverConfig,
    ignore: IgnoreRegistry,
    /// Explicitly chosen packages, in the order they were chosen
    selection: Vec<PackIndex>,
    /// Packages whose requirements were already walked since the last reset
    walked: Vec<bool>,
    unsolved: UnsolvedMap,
}

impl Solver {
    /// Create a solver with the default configuration
    pub fn new(input: SolverInput) -> Self {
        Self::with_config(input, SolverConfig::default())
    }

    /// Create a solver with a custom configuration
    pub fn with_config(input: SolverInput, config: SolverConfig) -> Self {
        let index = DependencyIndex::build(input, &config);
        let stats = index.initial_stats();
        let walked = vec![false; index.package_count()];

        Self {
            index,
            stats,
            config,
            ignore: IgnoreRegistry::new(),
            selection: Vec::new(),
            walked,
            unsolved: UnsolvedMap::new(),
        }
    }

    /// Replace the selection and solve it from scratch
    pub fn solve_dependencies(&mut self, selection: &[PackageKey]) -> SolveOutcome {
        let mut diagnostics = Vec::new();
        self.selection.clear();
        for key in selection {
            if let Some(idx) = self.selectable(key, &mut diagnostics)
                && !self.selection.contains(&idx)
            {
                self.selection.push(idx);
            }
        }

        info!("Solving dependencies for {} selected packages", self.selection.len());
        self.solve_selection();
        self.outcome(diagnostics)
    }

    /// Solve the stored selection again, e.g. after an ignore call
    pub fn resolve(&mut self) -> SolveOutcome {
        debug!("Re-solving {} selected packages", self.selection.len());
        self.solve_selection();
        self.outcome(Vec::new())
    }

    /// Add one package to the selection
    pub fn add_package(&mut self, key: &PackageKey) -> SolveOutcome {
        self.add_package_list(std::slice::from_ref(key))
    }

    /// Add packages to the selection
    ///
    /// The result is the same as solving the extended selection from
    /// scratch, so a provider chosen earlier is dropped once an added
    /// package satisfies the same tag.
    pub fn add_package_list(&mut self, keys: &[PackageKey]) -> SolveOutcome {
        let mut diagnostics = Vec::new();
        let mut added = Vec::new();
        for key in keys {
            let Some(idx) = self.selectable(key, &mut diagnostics) else {
                continue;
            };
            if self.selection.contains(&idx) || added.contains(&idx) {
                debug!("{} is already selected", key);
                continue;
            }
            added.push(idx);
        }

        if !added.is_empty() {
            debug!("Added {} packages to the selection", added.len());
            self.selection.extend(added);
            self.solve_selection();
        }

        self.outcome(diagnostics)
    }

    /// Remove a package from the selection
    ///
    /// With [`RemovalPolicy::Collect`] the remaining selection is solved
    /// again, so dependencies nothing else needs drop out. With
    /// [`RemovalPolicy::Unuse`] only the package's own used-by counter is
    /// decremented, and if that takes it out of the solution so are those
    /// of its direct requirement providers.
    ///
    /// Deleting an installed package that is not selected marks it for
    /// removal from the system.
    pub fn delete_package(&mut self, key: &PackageKey) -> SolveOutcome {
        let mut diagnostics = Vec::new();
        let Some(idx) = self.index.package_index(key) else {
            warn!("Cannot delete unknown package {}", key);
            diagnostics.push(Diagnostic::UnknownPackage(key.clone()));
            return self.outcome(diagnostics);
        };

        if let Some(pos) = self.selection.iter().position(|&p| p == idx) {
            self.selection.remove(pos);
            debug!("Removed {} from the selection", key);
            match self.config.removal {
                RemovalPolicy::Collect => self.solve_selection(),
                RemovalPolicy::Unuse => self.unuse(idx),
            }
        } else if self.stats[idx].is_installed() {
            info!("Marking installed package {} for removal", key);
            self.stats[idx].set_installed(false);
        } else {
            warn!("Cannot delete {}: not selected", key);
            diagnostics.push(Diagnostic::NotSelected(key.clone()));
        }

        self.outcome(diagnostics)
    }

    /// Selected or installed packages that would break if `key` went away
    ///
    /// Never changes solver state; an unknown key yields an empty list.
    pub fn get_breaking_package_list(&self, key: &PackageKey) -> Vec<PackageKey> {
        let Some(idx) = self.index.package_index(key) else {
            warn!("Cannot simulate removal of unknown package {}", key);
            return Vec::new();
        };

        let breaking: Vec<PackageKey> = RemovalSimulation::new(&self.index, &self.ignore, &self.stats)
            .breaking_packages(idx)
            .into_iter()
            .map(|p| self.index.key(p).clone())
            .collect();
        debug!("Removing {} breaks {} packages", key, breaking.len());
        breaking
    }

    /// Suppress the conflict between two exact packages
    ///
    /// Takes effect on the next solve. Returns false if there was no such
    /// conflict or it was already ignored.
    pub fn ignore_conflict_by_key(&mut self, a: &PackageKey, b: &PackageKey) -> bool {
        let (Some(ia), Some(ib)) = (self.index.package_index(a), self.index.package_index(b)) else {
            warn!("Cannot ignore conflict {} / {}: unknown package", a, b);
            return false;
        };
        let changed = self.ignore.ignore_conflict_pair(&self.index, ia, ib);
        if changed {
            info!("Ignoring conflict between {} and {}", a, b);
        }
        changed
    }

    /// Suppress conflicts between every version of two package names
    ///
    /// Returns the number of newly suppressed conflict edges.
    pub fn ignore_conflict(&mut self, name_a: &str, name_b: &str) -> usize {
        self.ignore.ignore_conflict_names(&self.index, name_a, name_b)
    }

    /// Treat a tag as satisfied outside the repository
    ///
    /// Requirements on it are neither pulled in nor reported as unsolved.
    pub fn ignore_unsolved_requirements(&mut self, tag: &str) -> bool {
        let Some(idx) = self.index.tag_index(tag) else {
            warn!("Cannot ignore unknown tag {}", tag);
            return false;
        };
        let changed = self.ignore.ignore_tag(idx);
        if changed {
            info!("Ignoring unsolved requirements on {}", tag);
        }
        changed
    }

    /// Stop pulling in `name` for tags nothing else provides
    ///
    /// Returns the number of newly ignored tags.
    pub fn ignore_additional_packages(&mut self, name: &str) -> usize {
        let count = self.ignore.ignore_unique_provides(&self.index, name);
        if count > 0 {
            info!("Ignoring {} tags only provided by {}", count, name);
        }
        count
    }

    /// The current selection, in selection order
    pub fn selection(&self) -> Vec<PackageKey> {
        self.selection
            .iter()
            .map(|&p| self.index.key(p).clone())
            .collect()
    }

    /// True if the package is selected or pulled in
    pub fn is_in_solution(&self, key: &PackageKey) -> bool {
        self.index
            .package_index(key)
            .is_some_and(|p| self.stats[p].in_solution())
    }

    /// Solver state of one package
    pub fn package_state(&self, key: &PackageKey) -> Option<&PackStat> {
        self.index.package_index(key).map(|p| &self.stats[p])
    }

    pub fn package_count(&self) -> usize {
        self.index.package_count()
    }

    pub fn tag_count(&self) -> usize {
        self.index.tag_count()
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn set_trace_level(&mut self, trace: TraceLevel) {
        self.config.trace = trace;
    }

    /// Look up a package the caller wants selected
    fn selectable(&self, key: &PackageKey, diagnostics: &mut Vec<Diagnostic>) -> Option<PackIndex> {
        let Some(idx) = self.index.package_index(key) else {
            warn!("Ignoring unknown package {}", key);
            diagnostics.push(Diagnostic::UnknownPackage(key.clone()));
            return None;
        };
        if !self.index.entry(idx).candidate {
            warn!("Ignoring {}: not a valid or installed package", key);
            diagnostics.push(Diagnostic::NotCandidate(key.clone()));
            return None;
        }
        Some(idx)
    }

    fn engine(&mut self) -> SaturationEngine<'_> {
        SaturationEngine::new(
            &self.index,
            &self.ignore,
            &self.config,
            &mut self.stats,
            &mut self.walked,
            &mut self.unsolved,
        )
    }

    /// Reset all transient state and saturate the stored selection
    fn solve_selection(&mut self) {
        for stat in &mut self.stats {
            stat.reset();
        }
        self.walked.fill(false);
        self.unsolved.clear();

        for &idx in &self.selection {
            self.stats[idx].set_in_selection(true);
        }
        let selection = self.selection.clone();
        let mut engine = self.engine();
        for idx in selection {
            engine.saturate(idx);
        }
    }

    /// Non-transitive removal of a deselected package
    ///
    /// A package other packages still require stays in the solution and
    /// keeps its providers. Otherwise the provider each requirement and
    /// each OR group counted is released once.
    fn unuse(&mut self, idx: PackIndex) {
        self.stats[idx].set_in_selection(false);
        self.stats[idx].dec_used_by();
        if self.stats[idx].in_solution() {
            debug!("{} is still required, keeping its providers", self.index.key(idx));
            return;
        }

        let mut released = vec![idx];
        for req in self.index.requires(idx) {
            if self.ignore.is_tag_ignored(req.tag) {
                continue;
            }
            if let Some(provider) = self.held_provider(req) {
                self.stats[provider].dec_used_by();
                released.push(provider);
            }
        }
        for group in self.index.or_requires(idx) {
            if group.iter().any(|req| self.ignore.is_tag_ignored(req.tag)) {
                continue;
            }
            if let Some(provider) = group.iter().find_map(|req| self.held_provider(req)) {
                self.stats[provider].dec_used_by();
                released.push(provider);
            }
        }

        // Unused packages must be walked again if something pulls them back in
        for p in released {
            if !self.stats[p].in_solution() {
                self.walked[p] = false;
                self.unsolved.remove(&p);
                self.stats[p].set_broken(false);
            }
        }
    }

    /// First provider of `req` holding a used-by count
    fn held_provider(&self, req: &Requirement) -> Option<PackIndex> {
        self.index
            .providers(req.tag)
            .iter()
            .copied()
            .filter(|&p| !self.ignore.is_provide_ignored(p, req.tag))
            .find(|&p| self.stats[p].used_by() > 0 && self.index.satisfies(p, req))
    }

    /// Run detection and assemble the four result collections
    fn outcome(&mut self, diagnostics: Vec<Diagnostic>) -> SolveOutcome {
        let report = ConflictDetector::new(&self.index, &self.ignore, &self.config).detect(&mut self.stats);

        let additional_packages: Vec<PackageKey> = self
            .stats
            .iter()
            .filter(|s| s.used_by() > 0 && !s.in_selection() && !s.is_installed())
            .map(PackStat::key)
            .collect();

        let mut outcome = SolveOutcome {
            additional_packages,
            unsolved_requirements: Default::default(),
            conflicts: Default::default(),
            obsoletes: self.obsolete_entries(&report),
            diagnostics,
        };

        for (&package, tags) in &self.unsolved {
            if !self.stats[package].in_solution() {
                continue;
            }
            for &tag in tags {
                if self.ignore.is_tag_ignored(tag) {
                    continue;
                }
                outcome
                    .unsolved_requirements
                    .entry(self.index.tag_name(tag).to_string())
                    .or_default()
                    .push(self.index.key(package).clone());
            }
        }
        for requirers in outcome.unsolved_requirements.values_mut() {
            requirers.sort();
        }

        for (&package, others) in &report.conflicts {
            outcome.conflicts.insert(
                self.index.key(package).clone(),
                others.iter().map(|&q| self.index.key(q).clone()).collect(),
            );
        }

        if self.config.trace.index_enabled() {
            self.index.dump(&self.stats);
        }

        debug!(
            "Solution: {} additional, {} unsolved, {} conflicting, {} obsoleted",
            outcome.additional_packages.len(),
            outcome.unsolved_requirements.len(),
            outcome.conflicts.len(),
            outcome.obsoletes.len()
        );
        outcome
    }

    fn obsolete_entries(&self, report: &ConflictReport) -> Vec<ObsoleteEntry> {
        let detector = ConflictDetector::new(&self.index, &self.ignore, &self.config);
        let keys = |set: BTreeSet<PackIndex>| -> Vec<PackageKey> {
            set.into_iter().map(|p| self.index.key(p).clone()).collect()
        };

        report
            .obsoletes
            .iter()
            .map(|&(by, old)| {
                let by_key = self.index.key(by);
                let old_key = self.index.key(old);
                ObsoleteEntry {
                    obsoletes: by_key.name.clone(),
                    obsoletes_version: by_key.version.clone(),
                    obsoletes_dep_packages: keys(detector.dependants(&self.stats, by)),
                    is_obsoleted: old_key.name.clone(),
                    is_obsoleted_version: old_key.version.clone(),
                    is_obsoleted_dep_packages: keys(detector.dependants(&self.stats, old)),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::input::DependencyMaps;
    use crate::resolver::package::Dependence;

    fn key(name: &str, version: &str) -> PackageKey {
        PackageKey::new(name, version)
    }

    fn chain_solver(config: SolverConfig) -> Solver {
        let maps = DependencyMaps::new()
            .with_requires(key("a", "1"), vec![Dependence::new("b")])
            .with_requires(key("b", "1"), vec![Dependence::new("c")]);
        let valid = vec![key("a", "1"), key("b", "1"), key("c", "1"), key("d", "1")];
        Solver::with_config(SolverInput::new(maps, valid, vec![]), config)
    }

    #[test]
    fn test_solve_reports_pulled_packages() {
        let mut solver = chain_solver(SolverConfig::default());

        let outcome = solver.solve_dependencies(&[key("a", "1")]);

        assert_eq!(outcome.additional_packages, vec![key("b", "1"), key("c", "1")]);
        assert!(outcome.is_consistent());
        assert_eq!(solver.selection(), vec![key("a", "1")]);
    }

    #[test]
    fn test_unknown_key_is_diagnosed() {
        let mut solver = chain_solver(SolverConfig::default());

        let outcome = solver.add_package(&key("zzz", "1"));
        assert_eq!(outcome.diagnostics, vec![Diagnostic::UnknownPackage(key("zzz", "1"))]);
        assert!(solver.selection().is_empty());

        let outcome = solver.delete_package(&key("zzz", "1"));
        assert_eq!(outcome.diagnostics, vec![Diagnostic::UnknownPackage(key("zzz", "1"))]);
    }

    #[test]
    fn test_add_existing_selection_is_noop() {
        let mut solver = chain_solver(SolverConfig::default());
        solver.solve_dependencies(&[key("a", "1")]);
        let used = solver.package_state(&key("a", "1")).unwrap().used_by();

        solver.add_package(&key("a", "1"));

        assert_eq!(solver.package_state(&key("a", "1")).unwrap().used_by(), used);
        assert_eq!(solver.selection().len(), 1);
    }

    #[test]
    fn test_collect_removal_drops_orphans() {
        let mut solver = chain_solver(SolverConfig::default());
        solver.solve_dependencies(&[key("a", "1"), key("d", "1")]);

        let outcome = solver.delete_package(&key("a", "1"));

        assert!(outcome.additional_packages.is_empty());
        assert!(!solver.is_in_solution(&key("c", "1")));
        assert!(solver.is_in_solution(&key("d", "1")));
    }

    #[test]
    fn test_unuse_removal_keeps_deep_dependencies() {
        let mut solver = chain_solver(SolverConfig::default().with_removal(RemovalPolicy::Unuse));
        solver.solve_dependencies(&[key("a", "1")]);

        let outcome = solver.delete_package(&key("a", "1"));

        assert!(!solver.is_in_solution(&key("a", "1")));
        assert!(!solver.is_in_solution(&key("b", "1")));
        assert!(solver.is_in_solution(&key("c", "1")));
        assert_eq!(outcome.additional_packages, vec![key("c", "1")]);
    }

    #[test]
    fn test_unuse_keeps_providers_of_still_required_package() {
        let maps = DependencyMaps::new()
            .with_requires(key("x", "1"), vec![Dependence::new("a")])
            .with_requires(key("a", "1"), vec![Dependence::new("b")]);
        let valid = vec![key("a", "1"), key("b", "1"), key("x", "1")];
        let config = SolverConfig::default().with_removal(RemovalPolicy::Unuse);
        let mut solver = Solver::with_config(SolverInput::new(maps, valid, vec![]), config);
        solver.solve_dependencies(&[key("a", "1"), key("x", "1")]);

        let outcome = solver.delete_package(&key("a", "1"));

        assert!(solver.is_in_solution(&key("a", "1")));
        assert!(solver.is_in_solution(&key("b", "1")));
        assert_eq!(solver.package_state(&key("a", "1")).unwrap().used_by(), 1);
        assert_eq!(solver.package_state(&key("b", "1")).unwrap().used_by(), 1);
        assert!(outcome.is_consistent());
        assert_eq!(outcome.additional_packages, vec![key("a", "1"), key("b", "1")]);
    }

    #[test]
    fn test_unuse_releases_or_group_provider() {
        let maps = DependencyMaps::new().with_or_requires(
            key("a", "1"),
            vec![Dependence::new("x"), Dependence::new("y")],
        );
        let valid = vec![key("a", "1"), key("x", "1"), key("y", "1")];
        let config = SolverConfig::default().with_removal(RemovalPolicy::Unuse);
        let mut solver = Solver::with_config(SolverInput::new(maps, valid, vec![]), config);

        let outcome = solver.solve_dependencies(&[key("a", "1")]);
        assert_eq!(outcome.additional_packages, vec![key("x", "1")]);

        let outcome = solver.delete_package(&key("a", "1"));
        assert!(!solver.is_in_solution(&key("x", "1")));
        assert!(outcome.additional_packages.is_empty());

        // The present alternative is the one released
        solver.solve_dependencies(&[key("y", "1"), key("a", "1")]);
        assert_eq!(solver.package_state(&key("y", "1")).unwrap().used_by(), 2);
        solver.delete_package(&key("a", "1"));
        assert_eq!(solver.package_state(&key("y", "1")).unwrap().used_by(), 1);
        assert_eq!(solver.package_state(&key("x", "1")).unwrap().used_by(), 0);
    }

    #[test]
    fn test_delete_unselected_package_is_diagnosed() {
        let mut solver = chain_solver(SolverConfig::default());
        solver.solve_dependencies(&[key("a", "1")]);

        let outcome = solver.delete_package(&key("d", "1"));

        assert_eq!(outcome.diagnostics, vec![Diagnostic::NotSelected(key("d", "1"))]);
        assert_eq!(outcome.additional_packages, vec![key("b", "1"), key("c", "1")]);
    }

    #[test]
    fn test_trace_level_is_runtime_switchable() {
        let mut solver = chain_solver(SolverConfig::default());
        solver.set_trace_level(TraceLevel::from_debug_str("all-sat"));

        let outcome = solver.solve_dependencies(&[key("a", "1")]);

        assert_eq!(solver.config().trace, TraceLevel::Saturation);
        assert_eq!(outcome.additional_packages.len(), 2);
    }
}
