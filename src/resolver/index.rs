// src/resolver/index.rs

//! Dense integer index over packages, tags and their dependency edges
//!
//! Packages and tags are stored once in ordered lists and every edge is an
//! integer into those lists, so the (cyclic) requires/conflicts graph has no
//! owning references at all. Index assignment is stable for the lifetime of
//! one solver, and the index is never mutated after `build`; manual overrides
//! live in the solver's `IgnoreRegistry`.
//!
//! Rows, all indexed by package unless noted:
//!
//! ```text
//! provide_array    package -> tags it provides (always includes its own name)
//! providers        tag     -> packages providing it
//! require_array    package -> AND requirements (tag + version constraint)
//! or_require_array package -> OR groups of requirements
//! required_by      tag     -> packages with a requirement on it
//! conflict_array   package -> packages it conflicts with
//! obsolete_array   package -> not-installed packages it obsoletes
//! inst_obsolete    package -> installed packages it obsoletes
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info};

use super::input::SolverInput;
use super::package::{PackStat, PackageKey, Tag};
use crate::config::SolverConfig;
use crate::version::{CompareOp, Version};

/// Position of a package in the index
pub type PackIndex = usize;

/// Position of a tag in the index
pub type TagIndex = usize;

/// An indexed requirement on a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub tag: TagIndex,
    pub compare: CompareOp,
    pub version: Version,
}

/// Static facts about one indexed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    pub key: PackageKey,
    pub version: Version,
    /// Listed as valid or installed; only candidates are ever pulled in
    pub candidate: bool,
    /// Installed when the solver was built
    pub installed: bool,
}

/// Statistics about the index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexStats {
    pub packages: usize,
    pub candidates: usize,
    pub tags: usize,
    pub requirements: usize,
    pub or_groups: usize,
    pub conflicts: usize,
    pub obsoletes: usize,
}

/// Integer-indexed dependency representation
#[derive(Debug, Clone)]
pub struct DependencyIndex {
    dep_list: Vec<PackageEntry>,
    dep_list_index: HashMap<PackageKey, PackIndex>,
    dep_list_str_index: BTreeMap<String, BTreeSet<PackIndex>>,
    tag_list: Vec<Tag>,
    tag_list_index: HashMap<Tag, TagIndex>,
    provide_array: Vec<BTreeSet<TagIndex>>,
    providers: Vec<BTreeSet<PackIndex>>,
    require_array: Vec<Vec<Requirement>>,
    or_require_array: Vec<Vec<Vec<Requirement>>>,
    required_by: Vec<BTreeSet<PackIndex>>,
    conflict_array: Vec<BTreeSet<PackIndex>>,
    obsolete_array: Vec<BTreeSet<PackIndex>>,
    inst_obsolete_array: Vec<BTreeSet<PackIndex>>,
}

impl DependencyIndex {
    /// Build the index from raw dependency maps
    pub fn build(input: SolverInput, config: &SolverConfig) -> Self {
        info!("Building dependency index");

        let SolverInput {
            mut maps,
            mut valid_packages,
            installed_packages,
            additional,
        } = input;

        if let Some(additional) = additional {
            debug!(
                "Merging additional dependencies for {} packages",
                additional.valid_packages.len()
            );
            maps.merge(additional.maps);
            valid_packages.extend(additional.valid_packages);
        }

        let mut index = Self {
            dep_list: Vec::with_capacity(installed_packages.len() + valid_packages.len()),
            dep_list_index: HashMap::new(),
            dep_list_str_index: BTreeMap::new(),
            tag_list: Vec::new(),
            tag_list_index: HashMap::new(),
            provide_array: Vec::new(),
            providers: Vec::new(),
            require_array: Vec::new(),
            or_require_array: Vec::new(),
            required_by: Vec::new(),
            conflict_array: Vec::new(),
            obsolete_array: Vec::new(),
            inst_obsolete_array: Vec::new(),
        };

        // Installed first, then candidates, then packages only named as map keys
        for key in &installed_packages {
            let idx = index.register_package(key);
            index.dep_list[idx].installed = true;
            index.dep_list[idx].candidate = true;
        }
        for key in &valid_packages {
            let idx = index.register_package(key);
            index.dep_list[idx].candidate = true;
        }
        for key in maps.keys() {
            index.register_package(key);
        }

        // Tags: every provided/obsoleted tag, every package name (each package
        // provides itself) and every required name, so missing requirements
        // still get an index and can be reported as unsolved.
        let mut tags: BTreeSet<&str> = BTreeSet::new();
        tags.extend(maps.provides.values().flatten().map(String::as_str));
        tags.extend(maps.obsoletes.values().flatten().map(String::as_str));
        tags.extend(index.dep_list.iter().map(|e| e.key.name.as_str()));
        tags.extend(
            maps.requires
                .values()
                .flatten()
                .chain(maps.or_requires.values().flatten().flatten())
                .map(|dep| dep.name.as_str())
                .filter(|name| !config.skips_requirement(name)),
        );

        for tag in tags {
            index.tag_list_index.insert(tag.to_string(), index.tag_list.len());
            index.tag_list.push(tag.to_string());
        }

        let packages = index.dep_list.len();
        let tag_count = index.tag_list.len();
        index.provide_array = vec![BTreeSet::new(); packages];
        index.require_array = vec![Vec::new(); packages];
        index.or_require_array = vec![Vec::new(); packages];
        index.conflict_array = vec![BTreeSet::new(); packages];
        index.obsolete_array = vec![BTreeSet::new(); packages];
        index.inst_obsolete_array = vec![BTreeSet::new(); packages];
        index.providers = vec![BTreeSet::new(); tag_count];
        index.required_by = vec![BTreeSet::new(); tag_count];

        debug!("Indexing provides");
        for idx in 0..packages {
            if let Some(tag) = index.tag_index(&index.dep_list[idx].key.name) {
                index.add_provide(idx, tag);
            }
        }
        for (key, provided) in &maps.provides {
            let Some(idx) = index.package_index(key) else {
                continue;
            };
            for name in provided {
                if let Some(tag) = index.tag_index(name) {
                    index.add_provide(idx, tag);
                }
            }
        }

        debug!("Indexing requires");
        for (key, deps) in &maps.requires {
            let Some(idx) = index.package_index(key) else {
                continue;
            };
            for dep in deps {
                let Some(req) = index.index_requirement(key, &dep.name, dep.compare, &dep.version, config)
                else {
                    continue;
                };
                index.required_by[req.tag].insert(idx);
                if !index.require_array[idx].contains(&req) {
                    index.require_array[idx].push(req);
                }
            }
        }

        for (key, groups) in &maps.or_requires {
            let Some(idx) = index.package_index(key) else {
                continue;
            };
            for group in groups {
                let alternatives: Vec<Requirement> = group
                    .iter()
                    .filter_map(|dep| {
                        index.index_requirement(key, &dep.name, dep.compare, &dep.version, config)
                    })
                    .collect();
                if alternatives.is_empty() {
                    continue;
                }
                for req in &alternatives {
                    index.required_by[req.tag].insert(idx);
                }
                index.or_require_array[idx].push(alternatives);
            }
        }

        debug!("Indexing conflicts");
        for (key, deps) in &maps.conflicts {
            let Some(idx) = index.package_index(key) else {
                continue;
            };
            for dep in deps {
                let required = dep.required_version();
                let targets: Vec<PackIndex> = index
                    .packages_named(&dep.name)
                    .filter(|&other| other != idx)
                    .filter(|&other| {
                        dep.compare
                            .satisfied_by(&index.dep_list[other].version, &required)
                    })
                    .collect();
                index.conflict_array[idx].extend(targets);
            }
        }

        // Obsoletes are resolved against providers, so they must come last.
        debug!("Indexing obsoletes");
        for (key, obsoleted) in &maps.obsoletes {
            let Some(idx) = index.package_index(key) else {
                continue;
            };
            for name in obsoleted {
                let Some(tag) = index.tag_index(name) else {
                    continue;
                };
                let targets: Vec<PackIndex> = index.providers[tag]
                    .iter()
                    .copied()
                    .filter(|&other| other != idx)
                    .collect();
                for other in targets {
                    if index.dep_list[other].installed {
                        index.inst_obsolete_array[idx].insert(other);
                    } else {
                        index.obsolete_array[idx].insert(other);
                    }
                }
            }
        }

        let stats = index.stats();
        info!(
            "Dependency index built: {} packages ({} candidates), {} tags, {} requirements, {} conflicts",
            stats.packages, stats.candidates, stats.tags, stats.requirements, stats.conflicts
        );

        index
    }

    /// Insert a package or return the index it already has
    fn register_package(&mut self, key: &PackageKey) -> PackIndex {
        if let Some(&idx) = self.dep_list_index.get(key) {
            return idx;
        }

        let idx = self.dep_list.len();
        self.dep_list.push(PackageEntry {
            key: key.clone(),
            version: Version::parse(&key.version),
            candidate: false,
            installed: false,
        });
        self.dep_list_index.insert(key.clone(), idx);
        self.dep_list_str_index
            .entry(key.name.clone())
            .or_default()
            .insert(idx);
        idx
    }

    fn add_provide(&mut self, package: PackIndex, tag: TagIndex) {
        self.provide_array[package].insert(tag);
        self.providers[tag].insert(package);
    }

    fn index_requirement(
        &self,
        owner: &PackageKey,
        name: &str,
        compare: CompareOp,
        version: &str,
        config: &SolverConfig,
    ) -> Option<Requirement> {
        if config.skips_requirement(name) {
            debug!("Dropping requirement '{}' of {}", name, owner);
            return None;
        }

        let tag = self.tag_index(name)?;
        Some(Requirement {
            tag,
            compare,
            version: if compare.is_versioned() {
                Version::parse(version)
            } else {
                Version::default()
            },
        })
    }

    /// Initial solver state: one record per package, install flags set
    pub fn initial_stats(&self) -> Vec<PackStat> {
        self.dep_list
            .iter()
            .map(|entry| {
                let mut stat = PackStat::new(&entry.key);
                stat.set_installed(entry.installed);
                stat
            })
            .collect()
    }

    pub fn package_count(&self) -> usize {
        self.dep_list.len()
    }

    pub fn tag_count(&self) -> usize {
        self.tag_list.len()
    }

    /// Look up a package by identity
    pub fn package_index(&self, key: &PackageKey) -> Option<PackIndex> {
        self.dep_list_index.get(key).copied()
    }

    /// Look up a tag by name
    pub fn tag_index(&self, tag: &str) -> Option<TagIndex> {
        self.tag_list_index.get(tag).copied()
    }

    pub fn entry(&self, package: PackIndex) -> &PackageEntry {
        &self.dep_list[package]
    }

    pub fn key(&self, package: PackIndex) -> &PackageKey {
        &self.dep_list[package].key
    }

    pub fn tag_name(&self, tag: TagIndex) -> &str {
        &self.tag_list[tag]
    }

    /// All versions of a package name, in index order
    pub fn packages_named<'a>(&'a self, name: &str) -> impl Iterator<Item = PackIndex> + 'a {
        self.dep_list_str_index
            .get(name)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn provided_tags(&self, package: PackIndex) -> &BTreeSet<TagIndex> {
        &self.provide_array[package]
    }

    pub fn providers(&self, tag: TagIndex) -> &BTreeSet<PackIndex> {
        &self.providers[tag]
    }

    pub fn requires(&self, package: PackIndex) -> &[Requirement] {
        &self.require_array[package]
    }

    pub fn or_requires(&self, package: PackIndex) -> &[Vec<Requirement>] {
        &self.or_require_array[package]
    }

    pub fn required_by(&self, tag: TagIndex) -> &BTreeSet<PackIndex> {
        &self.required_by[tag]
    }

    pub fn conflicts(&self, package: PackIndex) -> &BTreeSet<PackIndex> {
        &self.conflict_array[package]
    }

    pub fn obsoletes(&self, package: PackIndex) -> &BTreeSet<PackIndex> {
        &self.obsolete_array[package]
    }

    pub fn inst_obsoletes(&self, package: PackIndex) -> &BTreeSet<PackIndex> {
        &self.inst_obsolete_array[package]
    }

    /// Check whether `package` can discharge `req`, ignoring solver state
    ///
    /// Unversioned requirements accept any provider. Versioned ones only
    /// accept packages whose own name is the tag, since provided tags carry
    /// no version.
    pub fn satisfies(&self, package: PackIndex, req: &Requirement) -> bool {
        if !self.providers[req.tag].contains(&package) {
            return false;
        }
        if !req.compare.is_versioned() {
            return true;
        }
        let entry = &self.dep_list[package];
        entry.key.name == self.tag_list[req.tag]
            && req.compare.satisfied_by(&entry.version, &req.version)
    }

    /// Candidates able to discharge `req`, in stable index order
    pub fn candidates<'a>(&'a self, req: &'a Requirement) -> impl Iterator<Item = PackIndex> + 'a {
        self.providers[req.tag]
            .iter()
            .copied()
            .filter(move |&p| self.dep_list[p].candidate && self.satisfies(p, req))
    }

    /// Render a requirement for diagnostics
    pub fn describe(&self, req: &Requirement) -> String {
        if req.compare.is_versioned() {
            format!("{} {} {}", self.tag_list[req.tag], req.compare, req.version)
        } else {
            self.tag_list[req.tag].clone()
        }
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            packages: self.dep_list.len(),
            candidates: self.dep_list.iter().filter(|e| e.candidate).count(),
            tags: self.tag_list.len(),
            requirements: self.require_array.iter().map(Vec::len).sum(),
            or_groups: self.or_require_array.iter().map(Vec::len).sum(),
            conflicts: self.conflict_array.iter().map(BTreeSet::len).sum(),
            obsoletes: self
                .obsolete_array
                .iter()
                .chain(&self.inst_obsolete_array)
                .map(BTreeSet::len)
                .sum(),
        }
    }

    /// Log every row and package state at debug level
    pub fn dump(&self, stats: &[PackStat]) {
        for (tag, providers) in self.providers.iter().enumerate() {
            debug!("provides {:>4} {:<24} <- {:?}", tag, self.tag_list[tag], providers);
        }
        for (idx, entry) in self.dep_list.iter().enumerate() {
            let reqs: Vec<String> = self.require_array[idx]
                .iter()
                .map(|r| self.describe(r))
                .collect();
            debug!(
                "package {:>4} {:<24} requires {:?} conflicts {:?} obsoletes {:?}/{:?}",
                idx,
                entry.key.to_string(),
                reqs,
                self.conflict_array[idx],
                self.obsolete_array[idx],
                self.inst_obsolete_array[idx]
            );
        }
        for (idx, stat) in stats.iter().enumerate() {
            debug!(
                "state {:>4}: used {} sel {} inst {} broken {} name {}",
                idx,
                stat.used_by(),
                if stat.in_selection() { "X" } else { "-" },
                if stat.is_installed() { "X" } else { "-" },
                if stat.is_broken() { "X" } else { "-" },
                stat.name()
            );
        }
    }
}
