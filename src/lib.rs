// src/lib.rs

//! Greedy package dependency resolver
//!
//! Given repository dependency data (requires, conflicts, provides,
//! obsoletes) and a package selection, computes the packages that must be
//! pulled in, the requirements nothing satisfies, the conflicts among the
//! resulting set and the obsolescence relations.
//!
//! # Architecture
//!
//! - Arena indexing: packages and tags become dense integers, edges are
//!   integer rows, so cyclic dependency graphs need no shared ownership
//! - Greedy saturation: one deterministic choice per requirement, no
//!   backtracking
//! - Cumulative overrides: ignored conflicts and tags only ever grow
//! - Infallible operations: bad input is skipped and reported as diagnostics
//!
//! ```no_run
//! use pkgdep::{Dependence, DependencyMaps, PackageKey, Solver, SolverInput};
//!
//! let app = PackageKey::new("app", "1.0");
//! let maps = DependencyMaps::new().with_requires(app.clone(), vec![Dependence::parse("lib >= 2")]);
//! let valid = vec![app.clone(), PackageKey::new("lib", "2.1")];
//!
//! let mut solver = Solver::new(SolverInput::new(maps, valid, Vec::new()));
//! let outcome = solver.solve_dependencies(&[app]);
//! println!("{}", outcome);
//! ```

pub mod config;
mod error;
pub mod resolver;
pub mod version;

pub use config::{RemovalPolicy, SolverConfig, TraceLevel};
pub use error::{Error, Result};
pub use resolver::{
    AdditionalDependencies, Dependence, DependencyMaps, Diagnostic, ObsoleteEntry, PackStat,
    PackageKey, SolveOutcome, Solver, SolverInput,
};
pub use version::{CompareOp, Version};
