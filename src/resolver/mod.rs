// src/resolver/mod.rs

//! Dependency resolution and conflict detection
//!
//! Turns a package selection into a consistent install set: the dependency
//! maps are indexed once, then saturation pulls in every requirement
//! greedily and conflict detection reports what cannot coexist.
//!
//! ```text
//! DependencyMaps -> DependencyIndex -> PackStat[] -> SaturationEngine
//!                                                 -> ConflictDetector
//!                                                 -> Solver (SolveOutcome)
//! ```

mod conflict;
mod engine;
mod ignore;
mod index;
mod input;
mod package;
mod plan;
mod saturate;
mod simulate;

pub use conflict::{ConflictDetector, ConflictReport};
pub use engine::Solver;
pub use ignore::IgnoreRegistry;
pub use index::{DependencyIndex, IndexStats, PackIndex, PackageEntry, Requirement, TagIndex};
pub use input::{
    AdditionalDependencies, DependencyMaps, PackDepMap, PackOrDepMap, PackTagMap, SolverInput,
};
pub use package::{Dependence, PackStat, PackageKey, Tag};
pub use plan::{Diagnostic, ObsoleteEntry, SolveOutcome};
pub use saturate::{SaturationEngine, UnsolvedMap};
pub use simulate::RemovalSimulation;
