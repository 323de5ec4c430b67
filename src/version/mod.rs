// src/version/mod.rs

//! Version handling and compare operators for package dependencies
//!
//! Versions follow the RPM `[epoch:]version[-release]` shape. Parsing never
//! fails: whatever the metadata contains is kept and compared segment by
//! segment, so a garbled version can still be looked up by identity.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A parsed package version with epoch, version, and release components
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Version {
    pub epoch: u64,
    pub version: String,
    pub release: Option<String>,
}

impl Version {
    /// Parse a version string
    ///
    /// Format: [epoch:]version[-release]
    /// Examples:
    /// - "1.2.3" → epoch=0, version="1.2.3", release=None
    /// - "2:1.2.3" → epoch=2, version="1.2.3", release=None
    /// - "1.2.3-4.el8" → epoch=0, version="1.2.3", release=Some("4.el8")
    ///
    /// A non-numeric epoch prefix is kept as part of the version.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();

        let (epoch, rest) = match s.split_once(':') {
            Some((e, r)) if e.is_empty() => (0, r),
            Some((e, r)) if e.bytes().all(|b| b.is_ascii_digit()) => {
                (e.parse::<u64>().unwrap_or(u64::MAX), r)
            }
            _ => (0, s),
        };

        let (version, release) = match rest.rsplit_once('-') {
            Some((v, r)) => (v.to_string(), Some(r.to_string())),
            None => (rest.to_string(), None),
        };

        Self {
            epoch,
            version,
            release,
        }
    }

    /// True for the empty version used by packages known only by name
    pub fn is_empty(&self) -> bool {
        self.epoch == 0 && self.version.is_empty() && self.release.is_none()
    }

    /// Compare two versions
    ///
    /// Returns `None` when a numeric segment meets an alphabetic one at the
    /// same position; such versions have no defined order.
    pub fn compare(&self, other: &Version) -> Option<Ordering> {
        match self.compare_upstream(other)? {
            Ordering::Equal => {}
            ord => return Some(ord),
        }

        match (&self.release, &other.release) {
            (Some(l), Some(r)) => compare_segments(l, r),
            (None, None) => Some(Ordering::Equal),
            (None, Some(_)) => Some(Ordering::Less),
            (Some(_), None) => Some(Ordering::Greater),
        }
    }

    /// Compare epoch and version, ignoring the release
    pub fn compare_upstream(&self, other: &Version) -> Option<Ordering> {
        match self.epoch.cmp(&other.epoch) {
            Ordering::Equal => compare_segments(&self.version, &other.version),
            ord => Some(ord),
        }
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch > 0 {
            write!(f, "{}:", self.epoch)?;
        }
        write!(f, "{}", self.version)?;
        if let Some(ref release) = self.release {
            write!(f, "-{}", release)?;
        }
        Ok(())
    }
}

/// Compare two version strings split into numeric and alphabetic runs
///
/// Anything that is neither a digit nor an ASCII letter separates runs and is
/// skipped. Numbers compare numerically, letters lexically, and when one
/// string is a prefix of the other the shorter one is older.
fn compare_segments(lhs: &str, rhs: &str) -> Option<Ordering> {
    let l = lhs.as_bytes();
    let r = rhs.as_bytes();
    let (mut i, mut j) = (0, 0);

    loop {
        while i < l.len() && !l[i].is_ascii_alphanumeric() {
            i += 1;
        }
        while j < r.len() && !r[j].is_ascii_alphanumeric() {
            j += 1;
        }
        if i >= l.len() || j >= r.len() {
            break;
        }

        let l_numeric = l[i].is_ascii_digit();
        if l_numeric != r[j].is_ascii_digit() {
            return None;
        }

        let (l_start, r_start) = (i, j);
        if l_numeric {
            while i < l.len() && l[i].is_ascii_digit() {
                i += 1;
            }
            while j < r.len() && r[j].is_ascii_digit() {
                j += 1;
            }
            let ord = compare_numeric(&lhs[l_start..i], &rhs[r_start..j]);
            if ord != Ordering::Equal {
                return Some(ord);
            }
        } else {
            while i < l.len() && l[i].is_ascii_alphabetic() {
                i += 1;
            }
            while j < r.len() && r[j].is_ascii_alphabetic() {
                j += 1;
            }
            let ord = lhs[l_start..i].cmp(&rhs[r_start..j]);
            if ord != Ordering::Equal {
                return Some(ord);
            }
        }
    }

    Some((i < l.len()).cmp(&(j < r.len())))
}

/// Compare digit runs of any length without overflowing
fn compare_numeric(lhs: &str, rhs: &str) -> Ordering {
    let lhs = lhs.trim_start_matches('0');
    let rhs = rhs.trim_start_matches('0');
    lhs.len().cmp(&rhs.len()).then_with(|| lhs.cmp(rhs))
}

/// Version compare operator of a dependency atom (`!=` is not supported)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum CompareOp {
    /// No version constraint, presence only
    #[default]
    None,
    Eq,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl CompareOp {
    /// Parse an operator, degrading anything unknown to `CompareOp::None`
    ///
    /// Accepts one or two of `<`, `>`, `=` in any order and the spelled-out
    /// forms `eq`, `lt`, `gt`, `lte`/`le`, `gte`/`ge`. `<>` is not an operator.
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse_symbols(s.trim()).unwrap_or_else(|| {
            if !s.trim().is_empty() {
                tracing::warn!("Unparsable compare operator '{}', treating as unversioned", s);
            }
            CompareOp::None
        })
    }

    fn parse_symbols(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "" | "nop" | "none" => return Some(CompareOp::None),
            "eq" => return Some(CompareOp::Eq),
            "lt" => return Some(CompareOp::Lt),
            "gt" => return Some(CompareOp::Gt),
            "lte" | "le" => return Some(CompareOp::Lte),
            "gte" | "ge" => return Some(CompareOp::Gte),
            _ => {}
        }

        if s.len() > 2 {
            return None;
        }

        let (mut eq, mut lt, mut gt) = (false, false, false);
        for c in s.chars() {
            match c {
                '=' => eq = true,
                '<' => lt = true,
                '>' => gt = true,
                _ => return None,
            }
        }

        match (eq, lt, gt) {
            (_, true, true) => None,
            (true, true, false) => Some(CompareOp::Lte),
            (true, false, true) => Some(CompareOp::Gte),
            (false, true, false) => Some(CompareOp::Lt),
            (false, false, true) => Some(CompareOp::Gt),
            (true, false, false) => Some(CompareOp::Eq),
            (false, false, false) => None,
        }
    }

    /// Operator symbol as written in dependency strings
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::None => "",
            CompareOp::Eq => "=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Lte => "<=",
            CompareOp::Gte => ">=",
        }
    }

    /// True if the operator constrains the version at all
    pub fn is_versioned(&self) -> bool {
        *self != CompareOp::None
    }

    /// Check whether `candidate` satisfies `candidate <op> required`
    ///
    /// A required version without a release matches any release of the
    /// candidate. Uncomparable versions never satisfy a versioned operator.
    pub fn satisfied_by(&self, candidate: &Version, required: &Version) -> bool {
        if *self == CompareOp::None {
            return true;
        }

        let ord = if required.release.is_none() {
            candidate.compare_upstream(required)
        } else {
            candidate.compare(required)
        };

        let Some(ord) = ord else {
            return false;
        };

        match self {
            CompareOp::None => true,
            CompareOp::Eq => ord == Ordering::Equal,
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Lte => ord != Ordering::Greater,
            CompareOp::Gte => ord != Ordering::Less,
        }
    }
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_symbols(s.trim()).ok_or_else(|| Error::InvalidCompareOp(s.to_string()))
    }
}

impl From<String> for CompareOp {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl From<CompareOp> for &'static str {
    fn from(op: CompareOp) -> Self {
        op.as_str()
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s)
    }

    #[test]
    fn test_version_parse_simple() {
        let ver = v("1.2.3");
        assert_eq!(ver.epoch, 0);
        assert_eq!(ver.version, "1.2.3");
        assert_eq!(ver.release, None);
    }

    #[test]
    fn test_version_parse_full() {
        let ver = v("1:2.3.4-5.el8");
        assert_eq!(ver.epoch, 1);
        assert_eq!(ver.version, "2.3.4");
        assert_eq!(ver.release, Some("5.el8".to_string()));
    }

    #[test]
    fn test_version_parse_never_fails() {
        let ver = v("abc:1.0");
        assert_eq!(ver.epoch, 0);
        assert_eq!(ver.version, "abc:1.0");

        assert!(v("").is_empty());
        assert!(!v("0").is_empty());
    }

    #[test]
    fn test_version_display() {
        assert_eq!(v("1.2.3").to_string(), "1.2.3");
        assert_eq!(v("2:1.2.3-4.el8").to_string(), "2:1.2.3-4.el8");
    }

    #[test]
    fn test_compare_numeric_segments() {
        assert_eq!(v("1.10").compare(&v("1.9")), Some(Ordering::Greater));
        assert_eq!(v("2.0").compare(&v("2.0")), Some(Ordering::Equal));
        assert_eq!(v("1.0").compare(&v("1.0.1")), Some(Ordering::Less));
        assert_eq!(v("007").compare(&v("7")), Some(Ordering::Equal));
    }

    #[test]
    fn test_compare_alpha_and_mixed_segments() {
        assert_eq!(v("1.0a").compare(&v("1.0b")), Some(Ordering::Less));
        assert_eq!(v("1.a").compare(&v("1.1")), None);
    }

    #[test]
    fn test_compare_epoch_wins() {
        assert_eq!(v("1:1.0").compare(&v("9.9")), Some(Ordering::Greater));
    }

    #[test]
    fn test_compare_release() {
        assert_eq!(v("1.2.3-1").compare(&v("1.2.3-2")), Some(Ordering::Less));
        assert_eq!(v("1.2.3").compare(&v("1.2.3-2")), Some(Ordering::Less));
    }

    #[test]
    fn test_parse_lenient_symbols() {
        assert_eq!(CompareOp::parse_lenient(">="), CompareOp::Gte);
        assert_eq!(CompareOp::parse_lenient("=>"), CompareOp::Gte);
        assert_eq!(CompareOp::parse_lenient("=<"), CompareOp::Lte);
        assert_eq!(CompareOp::parse_lenient("=="), CompareOp::Eq);
        assert_eq!(CompareOp::parse_lenient("<"), CompareOp::Lt);
        assert_eq!(CompareOp::parse_lenient("GT"), CompareOp::Gt);
    }

    #[test]
    fn test_parse_lenient_degrades_to_none() {
        assert_eq!(CompareOp::parse_lenient("<>"), CompareOp::None);
        assert_eq!(CompareOp::parse_lenient("~="), CompareOp::None);
        assert_eq!(CompareOp::parse_lenient(">=>"), CompareOp::None);
    }

    #[test]
    fn test_from_str_is_strict() {
        assert_eq!("<=".parse::<CompareOp>().unwrap(), CompareOp::Lte);
        assert!("<>".parse::<CompareOp>().is_err());
        assert!("!=".parse::<CompareOp>().is_err());
    }

    #[test]
    fn test_satisfied_by() {
        assert!(CompareOp::Gte.satisfied_by(&v("2.0"), &v("2.0")));
        assert!(!CompareOp::Gte.satisfied_by(&v("1.0"), &v("2.0")));
        assert!(CompareOp::Lt.satisfied_by(&v("1.9.9"), &v("2.0")));
        assert!(CompareOp::None.satisfied_by(&v("1.a"), &v("1.1")));
        assert!(!CompareOp::Eq.satisfied_by(&v("1.a"), &v("1.1")));
    }

    #[test]
    fn test_satisfied_by_ignores_release_when_unspecified() {
        assert!(CompareOp::Eq.satisfied_by(&v("2.0-3"), &v("2.0")));
        assert!(!CompareOp::Eq.satisfied_by(&v("2.0-3"), &v("2.0-4")));
    }
}
