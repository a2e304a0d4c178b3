//! Build requirement set - idempotent collection of inferred BuildRequires
//!
//! Requirements learned from the build logs accumulate here across rounds. The
//! set is persisted to a small JSON cache keyed by the package version so a
//! restarted run does not have to rediscover everything from scratch.

mod cache;

pub use cache::{CacheError, RequirementCache, CACHE_FILE_NAME};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A single requirement inferred from a diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum Requirement {
    /// A plain package name, e.g. `libfoo-devel`
    Plain(String),
    /// A pkg-config module, recorded as `pkgconfig(<name>)`
    PkgConfig(String),
}

impl Requirement {
    pub fn plain(name: impl Into<String>) -> Self {
        Requirement::Plain(name.into())
    }

    pub fn pkgconfig(name: impl Into<String>) -> Self {
        Requirement::PkgConfig(name.into())
    }

    pub fn name(&self) -> &str {
        match self {
            Requirement::Plain(name) | Requirement::PkgConfig(name) => name,
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Plain(name) => write!(f, "{}", name),
            Requirement::PkgConfig(name) => write!(f, "pkgconfig({})", name),
        }
    }
}

/// Set of build requirements.
///
/// Adding a requirement reports how many entries were new, which is the
/// number the round accounting feeds into its rebuild decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementSet {
    entries: BTreeSet<String>,
    /// Also emit `pkgconfig(32<name>)` for every pkg-config requirement
    #[serde(default)]
    with_32bit: bool,
}

impl RequirementSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_32bit(with_32bit: bool) -> Self {
        Self {
            entries: BTreeSet::new(),
            with_32bit,
        }
    }

    /// Add a requirement, returning the number of entries that were not
    /// already present (0, 1, or 2 for a 32-bit pkg-config pair).
    pub fn add(&mut self, requirement: &Requirement) -> usize {
        match requirement {
            Requirement::Plain(name) => self.insert(name.clone()),
            Requirement::PkgConfig(name) => {
                let mut added = self.insert(format!("pkgconfig({})", name));
                if self.with_32bit {
                    added += self.insert(format!("pkgconfig(32{})", name));
                }
                added
            }
        }
    }

    pub fn add_all<'a>(&mut self, requirements: impl IntoIterator<Item = &'a Requirement>) -> usize {
        requirements.into_iter().map(|r| self.add(r)).sum()
    }

    fn insert(&mut self, entry: String) -> usize {
        let entry = entry.trim().to_string();
        if entry.is_empty() {
            return 0;
        }
        usize::from(self.entries.insert(entry))
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.contains(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Merge entries restored from a cache. Returns the number of new entries.
    pub fn extend_entries<I, S>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        entries.into_iter().map(|e| self.insert(e.into())).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut set = RequirementSet::new();
        assert_eq!(set.add(&Requirement::plain("libfoo-devel")), 1);
        assert_eq!(set.add(&Requirement::plain("libfoo-devel")), 0);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_pkgconfig_formatting() {
        let mut set = RequirementSet::new();
        assert_eq!(set.add(&Requirement::pkgconfig("glib-2.0")), 1);
        assert!(set.contains("pkgconfig(glib-2.0)"));
        assert!(!set.contains("pkgconfig(32glib-2.0)"));
    }

    #[test]
    fn test_pkgconfig_with_32bit_adds_pair() {
        let mut set = RequirementSet::with_32bit(true);
        assert_eq!(set.add(&Requirement::pkgconfig("zlib")), 2);
        assert!(set.contains("pkgconfig(zlib)"));
        assert!(set.contains("pkgconfig(32zlib)"));
        assert_eq!(set.add(&Requirement::pkgconfig("zlib")), 0);
    }

    #[test]
    fn test_blank_entries_are_ignored() {
        let mut set = RequirementSet::new();
        assert_eq!(set.add(&Requirement::plain("   ")), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(Requirement::plain("bison").to_string(), "bison");
        assert_eq!(Requirement::pkgconfig("x11").to_string(), "pkgconfig(x11)");
    }

    #[test]
    fn test_extend_entries_counts_new_only() {
        let mut set = RequirementSet::new();
        set.add(&Requirement::plain("flex"));
        assert_eq!(set.extend_entries(["flex", "bison"]), 1);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["bison", "flex"]);
    }
}
