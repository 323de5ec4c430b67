// src/resolver/simulate.rs

//! Removal simulation
//!
//! Answers "which packages break if this one goes away" without touching the
//! solver state: the simulation works on its own broken markers and only
//! reads the package states.

use tracing::trace;

use super::ignore::IgnoreRegistry;
use super::index::{DependencyIndex, PackIndex, Requirement, TagIndex};
use super::package::PackStat;

pub struct RemovalSimulation<'a> {
    index: &'a DependencyIndex,
    ignore: &'a IgnoreRegistry,
    stats: &'a [PackStat],
    broken: Vec<bool>,
}

impl<'a> RemovalSimulation<'a> {
    pub fn new(
        index: &'a DependencyIndex,
        ignore: &'a IgnoreRegistry,
        stats: &'a [PackStat],
    ) -> Self {
        Self {
            index,
            ignore,
            stats,
            broken: vec![false; stats.len()],
        }
    }

    /// Selected or installed packages that lose a requirement when `removed`
    /// disappears, directly or through other packages that break in turn
    pub fn breaking_packages(mut self, removed: PackIndex) -> Vec<PackIndex> {
        self.broken[removed] = true;
        let mut worklist = vec![removed];

        while let Some(gone) = worklist.pop() {
            for &tag in self.index.provided_tags(gone) {
                if self.ignore.is_tag_ignored(tag) || self.ignore.is_provide_ignored(gone, tag) {
                    continue;
                }
                for &requirer in self.index.required_by(tag) {
                    if self.broken[requirer] || !self.is_present(requirer) {
                        continue;
                    }
                    if self.loses_requirement(requirer, gone, tag) {
                        trace!(
                            "{} breaks without {}",
                            self.index.key(requirer),
                            self.index.key(gone)
                        );
                        self.broken[requirer] = true;
                        worklist.push(requirer);
                    }
                }
            }
        }

        (0..self.stats.len())
            .filter(|&p| p != removed && self.broken[p])
            .filter(|&p| self.stats[p].in_selection() || self.stats[p].is_installed())
            .collect()
    }

    /// Installed packages stay on the system whatever the plan says
    fn is_present(&self, package: PackIndex) -> bool {
        self.stats[package].in_solution() || self.stats[package].is_installed()
    }

    /// A present provider other than the broken ones still satisfies `req`
    fn still_satisfied(&self, req: &Requirement) -> bool {
        self.index.providers(req.tag).iter().any(|&p| {
            !self.broken[p]
                && self.is_present(p)
                && !self.ignore.is_provide_ignored(p, req.tag)
                && self.index.satisfies(p, req)
        })
    }

    fn loses_requirement(&self, requirer: PackIndex, gone: PackIndex, tag: TagIndex) -> bool {
        let lost_and = self
            .index
            .requires(requirer)
            .iter()
            .filter(|req| req.tag == tag && self.index.satisfies(gone, req))
            .any(|req| !self.still_satisfied(req));
        if lost_and {
            return true;
        }

        self.index
            .or_requires(requirer)
            .iter()
            .filter(|group| {
                group
                    .iter()
                    .any(|req| req.tag == tag && self.index.satisfies(gone, req))
            })
            .filter(|group| !group.iter().any(|req| self.ignore.is_tag_ignored(req.tag)))
            .any(|group| !group.iter().any(|req| self.still_satisfied(req)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::resolver::input::{DependencyMaps, SolverInput};
    use crate::resolver::package::{Dependence, PackageKey};
    use crate::resolver::saturate::{SaturationEngine, UnsolvedMap};

    fn key(name: &str, version: &str) -> PackageKey {
        PackageKey::new(name, version)
    }

    /// Build an index and saturate the given selection
    fn solved(
        maps: DependencyMaps,
        valid: Vec<PackageKey>,
        installed: Vec<PackageKey>,
        selection: &[PackageKey],
    ) -> (DependencyIndex, Vec<PackStat>) {
        let config = SolverConfig::default();
        let index = DependencyIndex::build(SolverInput::new(maps, valid, installed), &config);
        let mut stats = index.initial_stats();
        let mut walked = vec![false; index.package_count()];
        let mut unsolved = UnsolvedMap::new();
        let ignore = IgnoreRegistry::new();
        let selected: Vec<PackIndex> = selection
            .iter()
            .filter_map(|k| index.package_index(k))
            .collect();
        for &p in &selected {
            stats[p].set_in_selection(true);
        }
        let mut engine =
            SaturationEngine::new(&index, &ignore, &config, &mut stats, &mut walked, &mut unsolved);
        for &p in &selected {
            engine.saturate(p);
        }
        (index, stats)
    }

    fn breaking(index: &DependencyIndex, stats: &[PackStat], removed: &PackageKey) -> Vec<PackageKey> {
        let ignore = IgnoreRegistry::new();
        let removed = index.package_index(removed).unwrap();
        RemovalSimulation::new(index, &ignore, stats)
            .breaking_packages(removed)
            .into_iter()
            .map(|p| index.key(p).clone())
            .collect()
    }

    #[test]
    fn test_direct_requirer_breaks() {
        let maps = DependencyMaps::new().with_requires(key("a", "1"), vec![Dependence::new("b")]);
        let (index, stats) = solved(maps, vec![key("a", "1"), key("b", "1")], vec![], &[key("a", "1")]);

        assert_eq!(breaking(&index, &stats, &key("b", "1")), vec![key("a", "1")]);
        assert!(breaking(&index, &stats, &key("a", "1")).is_empty());
    }

    #[test]
    fn test_breakage_propagates_through_pulled_packages() {
        let maps = DependencyMaps::new()
            .with_requires(key("a", "1"), vec![Dependence::new("b")])
            .with_requires(key("b", "1"), vec![Dependence::new("c")]);
        let (index, stats) = solved(
            maps,
            vec![key("a", "1"), key("b", "1"), key("c", "1")],
            vec![],
            &[key("a", "1")],
        );

        // b breaks too, but it is neither selected nor installed
        assert_eq!(breaking(&index, &stats, &key("c", "1")), vec![key("a", "1")]);
    }

    #[test]
    fn test_alternative_provider_prevents_breakage() {
        let maps = DependencyMaps::new()
            .with_requires(key("a", "1"), vec![Dependence::new("mta")])
            .with_provides(key("postfix", "3"), ["mta"])
            .with_provides(key("sendmail", "8"), ["mta"]);
        let (index, stats) = solved(
            maps,
            vec![key("a", "1"), key("postfix", "3")],
            vec![key("sendmail", "8")],
            &[key("a", "1"), key("postfix", "3")],
        );

        assert!(breaking(&index, &stats, &key("sendmail", "8")).is_empty());
    }

    #[test]
    fn test_installed_requirer_breaks() {
        let maps = DependencyMaps::new().with_requires(key("app", "1"), vec![Dependence::new("lib")]);
        let (index, stats) = solved(maps, vec![], vec![key("app", "1"), key("lib", "1")], &[]);

        assert_eq!(breaking(&index, &stats, &key("lib", "1")), vec![key("app", "1")]);
    }

    #[test]
    fn test_or_group_survives_with_other_alternative() {
        let maps = DependencyMaps::new().with_or_requires(
            key("a", "1"),
            vec![Dependence::new("x"), Dependence::new("y")],
        );
        let (index, stats) = solved(
            maps,
            vec![key("a", "1"), key("x", "1"), key("y", "1")],
            vec![],
            &[key("a", "1"), key("x", "1"), key("y", "1")],
        );

        assert!(breaking(&index, &stats, &key("y", "1")).is_empty());
        assert!(breaking(&index, &stats, &key("x", "1")).is_empty());
    }

    #[test]
    fn test_or_group_breaks_without_any_alternative() {
        let maps = DependencyMaps::new().with_or_requires(
            key("a", "1"),
            vec![Dependence::new("x"), Dependence::new("y")],
        );
        let (index, stats) = solved(
            maps,
            vec![key("a", "1"), key("x", "1"), key("y", "1")],
            vec![],
            &[key("a", "1")],
        );

        assert_eq!(breaking(&index, &stats, &key("x", "1")), vec![key("a", "1")]);
        assert!(breaking(&index, &stats, &key("y", "1")).is_empty());
    }

    #[test]
    fn test_simulation_leaves_states_untouched() {
        let maps = DependencyMaps::new().with_requires(key("a", "1"), vec![Dependence::new("b")]);
        let (index, stats) = solved(maps, vec![key("a", "1"), key("b", "1")], vec![], &[key("a", "1")]);
        let before = stats.clone();

        breaking(&index, &stats, &key("b", "1"));

        assert_eq!(stats, before);
    }
}
