// src/config.rs

//! Solver configuration
//!
//! One struct replaces the former constructor variants. It can be built in
//! code or loaded from the `[solver]` table of a TOML file:
//!
//! ```toml
//! [solver]
//! prefer_installed = true
//! removal = "collect"
//! trace = "saturation"
//! skip_requirement_prefixes = ["rpmlib("]
//! installed_present = true
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What `delete_package` does to the dependencies a package pulled in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Re-solve the remaining selection; orphaned dependencies drop out
    #[default]
    Collect,
    /// Only decrement the used-by counters of the package's direct
    /// requirement providers; deeper dependencies stay in the solution
    Unuse,
}

/// Extra diagnostic output of the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceLevel {
    #[default]
    Off,
    /// Dump index rows and package states after every solve (debug level)
    Index,
    /// Index dump plus every saturation decision (trace level)
    Saturation,
}

impl TraceLevel {
    /// Map the historical verbose-debug strings: `"all"` and `"all-sat"`
    pub fn from_debug_str(s: &str) -> Self {
        match s {
            "all" => TraceLevel::Index,
            "all-sat" => TraceLevel::Saturation,
            _ => TraceLevel::Off,
        }
    }

    pub fn index_enabled(&self) -> bool {
        *self != TraceLevel::Off
    }

    pub fn saturation_enabled(&self) -> bool {
        *self == TraceLevel::Saturation
    }
}

/// Solver behaviour switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Prefer an installed package when several candidates satisfy a
    /// requirement; when off, candidates that are not installed are tried first
    pub prefer_installed: bool,

    /// Behaviour of `delete_package`
    pub removal: RemovalPolicy,

    /// Diagnostic verbosity
    pub trace: TraceLevel,

    /// Requirements on tags starting with one of these are never indexed
    pub skip_requirement_prefixes: Vec<String>,

    /// Installed packages count as present for conflict and obsolete detection
    pub installed_present: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            prefer_installed: true,
            removal: RemovalPolicy::default(),
            trace: TraceLevel::default(),
            skip_requirement_prefixes: vec!["rpmlib(".to_string()],
            installed_present: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    solver: SolverConfig,
}

impl SolverConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        file.solver.validate()?;
        Ok(file.solver)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Reject values that would silently disable the solver
    pub fn validate(&self) -> Result<()> {
        if self.skip_requirement_prefixes.iter().any(|p| p.is_empty()) {
            return Err(Error::InvalidConfig(
                "empty entry in skip_requirement_prefixes would drop every requirement".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_removal(mut self, removal: RemovalPolicy) -> Self {
        self.removal = removal;
        self
    }

    pub fn with_trace(mut self, trace: TraceLevel) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_prefer_installed(mut self, prefer_installed: bool) -> Self {
        self.prefer_installed = prefer_installed;
        self
    }

    /// True if a requirement on `tag` is never indexed
    pub fn skips_requirement(&self, tag: &str) -> bool {
        self.skip_requirement_prefixes
            .iter()
            .any(|prefix| tag.starts_with(prefix.as_str()))
    }
}
