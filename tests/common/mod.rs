// tests/common/mod.rs

//! Shared test utilities and fixture repositories for integration tests.

#![allow(dead_code)]

use std::sync::Once;

use pkgdep::{Dependence, DependencyMaps, PackageKey, Solver, SolverConfig, SolverInput};

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary.
///
/// Honors `RUST_LOG`, e.g. `RUST_LOG=pkgdep=trace cargo test`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn key(name: &str, version: &str) -> PackageKey {
    PackageKey::new(name, version)
}

pub fn solver(maps: DependencyMaps, valid: Vec<PackageKey>, installed: Vec<PackageKey>) -> Solver {
    init_tracing();
    Solver::new(SolverInput::new(maps, valid, installed))
}

pub fn solver_with_config(
    maps: DependencyMaps,
    valid: Vec<PackageKey>,
    installed: Vec<PackageKey>,
    config: SolverConfig,
) -> Solver {
    init_tracing();
    Solver::with_config(SolverInput::new(maps, valid, installed), config)
}

/// A-1.0 requires B >= 2.0; B-1.0 and B-2.0 are both available.
pub fn versioned_requirement() -> Solver {
    let maps = DependencyMaps::new().with_requires(key("A", "1.0"), vec![Dependence::parse("B >= 2.0")]);
    solver(
        maps,
        vec![key("A", "1.0"), key("B", "1.0"), key("B", "2.0")],
        vec![],
    )
}

/// A-1.0 conflicts with B unconditionally.
pub fn unconditional_conflict() -> Solver {
    let maps = DependencyMaps::new().with_conflicts(key("A", "1.0"), vec![Dependence::new("B")]);
    solver(maps, vec![key("A", "1.0"), key("B", "1.0")], vec![])
}

/// A small desktop-like repository.
///
/// ```text
/// editor-2.0   requires gui-lib >= 3, spell, (clipboard-x | clipboard-wl)
/// gui-lib-3.1  requires libc, fonts
/// spell-1.0    requires dict-en
/// fonts-1.0    provides fonts
/// dict-en-1.0  provides dict
/// libc-2.39    installed
/// clipboard-wl-1.0
/// term-1.0     requires libc, conflicts with oldterm
/// oldterm-0.9  installed
/// newsh-2.0    obsoletes oldsh, requires libc
/// oldsh-1.0    installed, required by installed script-1.0
/// ```
pub fn desktop() -> Solver {
    let maps = DependencyMaps::new()
        .with_requires(
            key("editor", "2.0"),
            vec![Dependence::parse("gui-lib >= 3"), Dependence::new("spell")],
        )
        .with_or_requires(
            key("editor", "2.0"),
            vec![Dependence::new("clipboard-x"), Dependence::new("clipboard-wl")],
        )
        .with_requires(
            key("gui-lib", "3.1"),
            vec![Dependence::new("libc"), Dependence::new("fonts")],
        )
        .with_requires(key("gui-lib", "2.0"), vec![Dependence::new("libc")])
        .with_requires(key("spell", "1.0"), vec![Dependence::new("dict-en")])
        .with_requires(key("term", "1.0"), vec![Dependence::new("libc")])
        .with_conflicts(key("term", "1.0"), vec![Dependence::new("oldterm")])
        .with_requires(key("newsh", "2.0"), vec![Dependence::new("libc")])
        .with_obsoletes(key("newsh", "2.0"), ["oldsh"])
        .with_requires(key("script", "1.0"), vec![Dependence::new("oldsh")])
        .with_provides(key("dict-en", "1.0"), ["dict"]);

    let valid = vec![
        key("editor", "2.0"),
        key("gui-lib", "2.0"),
        key("gui-lib", "3.1"),
        key("spell", "1.0"),
        key("fonts", "1.0"),
        key("dict-en", "1.0"),
        key("clipboard-wl", "1.0"),
        key("term", "1.0"),
        key("newsh", "2.0"),
    ];
    let installed = vec![
        key("libc", "2.39"),
        key("oldterm", "0.9"),
        key("oldsh", "1.0"),
        key("script", "1.0"),
    ];

    solver(maps, valid, installed)
}
