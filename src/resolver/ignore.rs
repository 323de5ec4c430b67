// src/resolver/ignore.rs

//! Manual overrides of solver results
//!
//! Overrides only accumulate. Nothing here is ever removed again for the
//! lifetime of a solver, and none of them mutate the dependency index; the
//! saturation engine and the conflict detector consult the registry instead.

use std::collections::BTreeSet;

use tracing::debug;

use super::index::{DependencyIndex, PackIndex, TagIndex};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreRegistry {
    /// Suppressed conflict edges, stored in both directions
    conflicts: BTreeSet<(PackIndex, PackIndex)>,
    /// Tags treated as satisfied outside the index
    tags: BTreeSet<TagIndex>,
    /// Provide edges that no longer count
    provides: BTreeSet<(PackIndex, TagIndex)>,
}

impl IgnoreRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_conflict_ignored(&self, a: PackIndex, b: PackIndex) -> bool {
        self.conflicts.contains(&(a, b))
    }

    pub fn is_tag_ignored(&self, tag: TagIndex) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_provide_ignored(&self, package: PackIndex, tag: TagIndex) -> bool {
        self.provides.contains(&(package, tag))
    }

    /// Suppress the conflict between two packages in both directions
    ///
    /// Returns true if at least one existing edge was newly suppressed.
    pub fn ignore_conflict_pair(&mut self, index: &DependencyIndex, a: PackIndex, b: PackIndex) -> bool {
        let mut changed = false;
        if index.conflicts(a).contains(&b) {
            changed |= self.conflicts.insert((a, b));
        }
        if index.conflicts(b).contains(&a) {
            changed |= self.conflicts.insert((b, a));
        }
        changed
    }

    /// Suppress conflicts between every version of two package names
    ///
    /// Returns the number of newly suppressed edges.
    pub fn ignore_conflict_names(&mut self, index: &DependencyIndex, name_a: &str, name_b: &str) -> usize {
        let mut count = 0;
        for a in index.packages_named(name_a) {
            for b in index.packages_named(name_b) {
                if index.conflicts(a).contains(&b) && self.conflicts.insert((a, b)) {
                    count += 1;
                }
                if index.conflicts(b).contains(&a) && self.conflicts.insert((b, a)) {
                    count += 1;
                }
            }
        }
        debug!("Ignoring {} conflict edges between {} and {}", count, name_a, name_b);
        count
    }

    /// Treat a tag as satisfied outside the index
    pub fn ignore_tag(&mut self, tag: TagIndex) -> bool {
        self.tags.insert(tag)
    }

    /// Drop the provide edges of tags that only `name` provides
    ///
    /// The affected tags are also treated as satisfied externally, so their
    /// requirers neither pull a package in nor report them as unsolved.
    /// Tags with at least one provider of another name are left alone.
    /// Returns the number of newly ignored tags.
    pub fn ignore_unique_provides(&mut self, index: &DependencyIndex, name: &str) -> usize {
        let owned: BTreeSet<TagIndex> = index
            .packages_named(name)
            .flat_map(|p| index.provided_tags(p).iter().copied())
            .filter(|&tag| {
                index
                    .providers(tag)
                    .iter()
                    .all(|&p| index.key(p).name == name)
            })
            .collect();

        let mut count = 0;
        for tag in owned {
            for &p in index.providers(tag) {
                self.provides.insert((p, tag));
            }
            if self.tags.insert(tag) {
                debug!("Ignoring tag {} provided only by {}", index.tag_name(tag), name);
                count += 1;
            }
        }
        count
    }
}
