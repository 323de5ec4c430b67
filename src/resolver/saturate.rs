// src/resolver/saturate.rs

//! Transitive requirement propagation
//!
//! Saturating a package walks its requirement rows and pulls in one provider
//! for every requirement that nothing in the solution satisfies yet. The
//! choice is greedy and never revisited:
//!
//! 1. A provider already in the solution wins; its used-by counter is bumped.
//! 2. Otherwise the first installed matching candidate is taken, or with
//!    `prefer_installed` off the first one that is not installed; failing
//!    that, the first matching candidate in index order.
//! 3. Otherwise the requirement is recorded as unsolved and the requiring
//!    package is marked broken.
//!
//! OR groups try rule 1 across every alternative before falling back to
//! rule 2 in group order. The walk uses an explicit stack and a walked marker
//! per package, so dependency cycles terminate.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use super::ignore::IgnoreRegistry;
use super::index::{DependencyIndex, PackIndex, Requirement, TagIndex};
use super::package::PackStat;
use crate::config::SolverConfig;

/// Unresolved requirement tags per requiring package
pub type UnsolvedMap = BTreeMap<PackIndex, BTreeSet<TagIndex>>;

/// Mutable view over solver state for one or more saturation calls
pub struct SaturationEngine<'a> {
    index: &'a DependencyIndex,
    ignore: &'a IgnoreRegistry,
    config: &'a SolverConfig,
    stats: &'a mut [PackStat],
    walked: &'a mut [bool],
    unsolved: &'a mut UnsolvedMap,
}

impl<'a> SaturationEngine<'a> {
    pub fn new(
        index: &'a DependencyIndex,
        ignore: &'a IgnoreRegistry,
        config: &'a SolverConfig,
        stats: &'a mut [PackStat],
        walked: &'a mut [bool],
        unsolved: &'a mut UnsolvedMap,
    ) -> Self {
        Self {
            index,
            ignore,
            config,
            stats,
            walked,
            unsolved,
        }
    }

    /// Count one more use of `root` and pull in everything it requires
    ///
    /// Calling this again for a package whose requirements were already
    /// walked only bumps its used-by counter.
    pub fn saturate(&mut self, root: PackIndex) {
        let index = self.index;
        self.stats[root].inc_used_by();

        let mut stack = vec![root];
        while let Some(package) = stack.pop() {
            if self.walked[package] {
                continue;
            }
            self.walked[package] = true;

            if self.config.trace.saturation_enabled() {
                trace!("Saturating {}", index.key(package));
            }

            for req in index.requires(package) {
                self.resolve_requirement(package, req, &mut stack);
            }
            for group in index.or_requires(package) {
                self.resolve_or_group(package, group, &mut stack);
            }
        }
    }

    fn resolve_requirement(&mut self, package: PackIndex, req: &Requirement, stack: &mut Vec<PackIndex>) {
        if self.ignore.is_tag_ignored(req.tag) {
            return;
        }

        if let Some(provider) = self.present_provider(req) {
            self.stats[provider].inc_used_by();
            self.trace_choice(package, req, provider, "present");
            return;
        }

        if let Some(provider) = self.choose_candidate(req) {
            self.stats[provider].inc_used_by();
            self.trace_choice(package, req, provider, "pulled in");
            stack.push(provider);
            return;
        }

        self.mark_unsolved(package, req.tag);
    }

    fn resolve_or_group(&mut self, package: PackIndex, group: &[Requirement], stack: &mut Vec<PackIndex>) {
        self.stats[package].set_has_or(true);

        if group.iter().any(|req| self.ignore.is_tag_ignored(req.tag)) {
            return;
        }

        for req in group {
            if let Some(provider) = self.present_provider(req) {
                self.stats[provider].inc_used_by();
                self.trace_choice(package, req, provider, "present alternative");
                return;
            }
        }

        for req in group {
            if let Some(provider) = self.choose_candidate(req) {
                self.stats[provider].inc_used_by();
                self.trace_choice(package, req, provider, "pulled in alternative");
                stack.push(provider);
                return;
            }
        }

        for req in group {
            self.mark_unsolved(package, req.tag);
        }
    }

    /// A provider that is already part of the solution
    fn present_provider(&self, req: &Requirement) -> Option<PackIndex> {
        self.index
            .providers(req.tag)
            .iter()
            .copied()
            .filter(|&p| !self.ignore.is_provide_ignored(p, req.tag))
            .find(|&p| self.stats[p].in_solution() && self.index.satisfies(p, req))
    }

    /// The candidate saturation would pull in for `req`
    ///
    /// Installed packages sit at the front of the index, so plain index
    /// order already prefers them. Without `prefer_installed` the first
    /// candidate that is not installed wins instead.
    fn choose_candidate(&self, req: &Requirement) -> Option<PackIndex> {
        let candidates: Vec<PackIndex> = self
            .index
            .candidates(req)
            .filter(|&p| !self.ignore.is_provide_ignored(p, req.tag))
            .collect();

        let preferred = candidates
            .iter()
            .copied()
            .find(|&p| self.stats[p].is_installed() == self.config.prefer_installed);
        preferred.or_else(|| candidates.first().copied())
    }

    fn mark_unsolved(&mut self, package: PackIndex, tag: TagIndex) {
        if self.config.trace.saturation_enabled() {
            trace!(
                "{} requires {}: no candidate",
                self.index.key(package),
                self.index.tag_name(tag)
            );
        }
        self.unsolved.entry(package).or_default().insert(tag);
        self.stats[package].set_broken(true);
    }

    fn trace_choice(&self, package: PackIndex, req: &Requirement, provider: PackIndex, how: &str) {
        if self.config.trace.saturation_enabled() {
            trace!(
                "{} requires {}: {} ({})",
                self.index.key(package),
                self.index.describe(req),
                self.index.key(provider),
                how
            );
        }
    }
}
