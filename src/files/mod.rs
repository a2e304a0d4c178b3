//! File classifier - assigns installed paths to `%files` sub-packages
//!
//! Paths reported by the build as "installed but unpackaged" arrive one at a
//! time. Each is run through a fixed sequence of checks (locale catalogs,
//! explicit maps, setuid, autostart links, policy vetoes, header split) and
//! then through the ordered rule tables. The accumulated [`FileAssignment`]
//! is what the `%files` sections are rendered from.

mod package_rules;
mod policy;
mod prune;
pub mod rules;

pub use package_rules::{table_for, PACKAGES_WITH_TABLES};
pub use policy::{ClassifierPolicy, ExclusionVetoes, Veto};
pub use rules::{ClassificationRule, Dest, RuleSpec, RuleTable};

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

/// Ownership and mode override for a single path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttr {
    pub mode: String,
    pub user: String,
    pub group: String,
}

impl fmt::Display for FileAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%attr({},{},{})", self.mode, self.user, self.group)
    }
}

/// Accumulated classification state, cumulative across rounds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAssignment {
    /// Bucket name → entries
    pub packages: BTreeMap<String, BTreeSet<String>>,
    /// Explicitly named sub-package → entries
    pub subpackages: BTreeMap<String, BTreeSet<String>>,
    pub excludes: Vec<String>,
    pub seen: BTreeSet<String>,
    pub blacklist: BTreeSet<String>,
    pub locales: Vec<String>,
    pub has_banned: bool,
}

impl FileAssignment {
    /// Bucket that holds `entry`, if any
    pub fn bucket_of(&self, entry: &str) -> Option<&str> {
        self.packages
            .iter()
            .chain(self.subpackages.iter())
            .find(|(_, entries)| entries.contains(entry))
            .map(|(name, _)| name.as_str())
    }

    pub fn entry_count(&self) -> usize {
        self.packages
            .values()
            .chain(self.subpackages.values())
            .map(BTreeSet::len)
            .sum()
    }

    fn ensure_bucket(&mut self, bucket: &str, subpackage: bool) -> &mut BTreeSet<String> {
        let map = if subpackage {
            &mut self.subpackages
        } else {
            &mut self.packages
        };
        map.entry(bucket.to_string()).or_default()
    }
}

/// A single entry added to a bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub bucket: String,
    pub entry: String,
    pub subpackage: bool,
}

/// Why a path was kept out of every bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcludeReason {
    Locale,
    Compat,
    Only32Bit,
    Listed,
}

impl From<Veto> for ExcludeReason {
    fn from(veto: Veto) -> Self {
        match veto {
            Veto::Compat => ExcludeReason::Compat,
            Veto::Only32Bit => ExcludeReason::Only32Bit,
        }
    }
}

/// Result of classifying one path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Classification {
    /// Seen before or blacklisted
    Skipped,
    /// Message catalog; `new` when the language was not known yet
    Locale { language: String, new: bool },
    Excluded { reason: ExcludeReason },
    /// New entries; empty when every entry was already listed
    Assigned { assignments: Vec<Assignment> },
    /// Rejected for living under a banned prefix
    Banned,
}

impl Classification {
    /// Number of new `%files` entries
    pub fn file_events(&self) -> usize {
        match self {
            Classification::Assigned { assignments } => assignments.len(),
            _ => 0,
        }
    }

    /// Whether a new locale was discovered
    pub fn new_locale(&self) -> bool {
        matches!(self, Classification::Locale { new: true, .. })
    }
}

fn locale_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^/usr/share/locale/([^/]+)/(?:.*/)?[^/]+\.mo$").expect("valid regex")
    })
}

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(rules::HEADER_SPLIT_PATTERN).expect("valid regex"))
}

fn autostart_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(rules::AUTOSTART_PATTERN).expect("valid regex"))
}

/// Classifies install paths for one package
#[derive(Debug, Clone)]
pub struct FileClassifier {
    package_name: String,
    policy: ClassifierPolicy,
    vetoes: ExclusionVetoes,
    package_table: Option<RuleTable>,
    generic_table: RuleTable,
    file_maps: BTreeMap<String, BTreeSet<String>>,
    setuid: BTreeSet<String>,
    attrs: BTreeMap<String, FileAttr>,
    banned_paths: Vec<String>,
    state: FileAssignment,
}

impl FileClassifier {
    pub fn new(package_name: &str, policy: ClassifierPolicy) -> Result<Self, regex::Error> {
        Ok(Self {
            package_name: package_name.to_string(),
            vetoes: ExclusionVetoes::new(&policy)?,
            package_table: table_for(package_name)?,
            generic_table: RuleTable::generic(package_name)?,
            policy,
            file_maps: BTreeMap::new(),
            setuid: BTreeSet::new(),
            attrs: BTreeMap::new(),
            banned_paths: Vec::new(),
            state: FileAssignment::default(),
        })
    }

    /// Explicit bucket → paths overrides
    pub fn with_file_maps(mut self, file_maps: BTreeMap<String, BTreeSet<String>>) -> Self {
        self.file_maps = file_maps;
        self
    }

    pub fn with_setuid(mut self, setuid: impl IntoIterator<Item = String>) -> Self {
        self.setuid = setuid.into_iter().collect();
        self
    }

    pub fn with_attrs(mut self, attrs: BTreeMap<String, FileAttr>) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_banned_paths(mut self, banned_paths: Vec<String>) -> Self {
        self.banned_paths = banned_paths;
        self
    }

    /// Paths excluded up front
    pub fn with_excludes(mut self, excludes: impl IntoIterator<Item = String>) -> Self {
        self.state.excludes.extend(excludes);
        self
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn policy(&self) -> &ClassifierPolicy {
        &self.policy
    }

    pub fn state(&self) -> &FileAssignment {
        &self.state
    }

    pub fn into_state(self) -> FileAssignment {
        self.state
    }

    fn is_excluded(&self, path: &str) -> bool {
        self.state.excludes.iter().any(|e| e == path)
    }

    fn exclude(&mut self, path: &str, reason: ExcludeReason) -> Classification {
        debug!(path, ?reason, "Excluding file");
        self.state.excludes.push(path.to_string());
        Classification::Excluded { reason }
    }

    fn is_banned(&self, path: &str) -> bool {
        self.banned_paths.iter().any(|b| path.starts_with(b.as_str()))
    }

    /// Add `path` (as rendered by `entry`) to a bucket.
    ///
    /// The bucket is created even when the path is banned. Returns `Err(())`
    /// for banned content, `Ok(None)` when the entry was already listed.
    fn place(
        &mut self,
        path: &str,
        entry: String,
        bucket: &str,
        subpackage: bool,
    ) -> Result<Option<Assignment>, ()> {
        let banned = self.is_banned(path);
        let entry = match self.attrs.get(path) {
            Some(attr) if !banned => format!("{} {}", attr, entry),
            _ => entry,
        };

        let entries = self.state.ensure_bucket(bucket, subpackage);
        if banned {
            warn!("Content {} found in banned path, skipping", path);
            self.state.has_banned = true;
            return Err(());
        }

        if !entries.insert(entry.clone()) {
            return Ok(None);
        }
        debug!(bucket, entry = %entry, "Assigned file");
        Ok(Some(Assignment {
            bucket: bucket.to_string(),
            entry,
            subpackage,
        }))
    }

    fn assign(&mut self, placements: Vec<(String, &str, bool)>, path: &str) -> Classification {
        let mut assignments = Vec::new();
        let mut banned = false;
        for (entry, bucket, subpackage) in placements {
            match self.place(path, entry, bucket, subpackage) {
                Ok(Some(a)) => assignments.push(a),
                Ok(None) => {}
                Err(()) => banned = true,
            }
        }
        if banned && assignments.is_empty() {
            Classification::Banned
        } else {
            Classification::Assigned { assignments }
        }
    }

    fn locale_bucket(&self) -> &'static str {
        match self.package_name.as_str() {
            "gcc" | "glibc" => "locale",
            _ => "locales",
        }
    }

    /// Classify one installed path.
    pub fn classify(&mut self, path: &str) -> Classification {
        if self.state.seen.contains(path) || self.state.blacklist.contains(path) {
            return Classification::Skipped;
        }
        self.state.seen.insert(path.to_string());

        if let Some(caps) = locale_regex().captures(path) {
            if self.policy.exclude_locales {
                return self.exclude(path, ExcludeReason::Locale);
            }
            let language = caps[1].to_string();
            let new = !self.state.locales.contains(&language) && !self.is_excluded(path);
            if new {
                info!("New locale: {}", language);
                self.state.locales.push(language.clone());
                let bucket = self.locale_bucket();
                self.state.ensure_bucket(bucket, false);
            }
            return Classification::Locale { language, new };
        }

        let mapped = self
            .file_maps
            .iter()
            .find(|(_, paths)| paths.contains(path))
            .map(|(bucket, _)| bucket.clone());
        if let Some(bucket) = mapped {
            return self.assign(vec![(path.to_string(), bucket.as_str(), false)], path);
        }

        if self.setuid.contains(path) {
            let entry = format!("%attr(4755, root, root) {}", path);
            return self.assign(vec![(entry, "setuid", false)], path);
        }

        if autostart_regex().is_match(path)
            && !path.contains(rules::AUTOSTART_EXEMPT)
            && !self.is_excluded(path)
        {
            return self.assign(
                vec![
                    (path.to_string(), "autostart", false),
                    (format!("%exclude {}", path), "services", false),
                ],
                path,
            );
        }

        if let Some(veto) = self.vetoes.check(path) {
            return self.exclude(path, veto.into());
        }

        if self.policy.want_dev_split && header_regex().is_match(path) {
            return self.assign_by_rule(path, None);
        }

        let matched = self
            .package_table
            .as_ref()
            .and_then(|t| t.first_match(path))
            .or_else(|| self.generic_table.first_match(path))
            .map(|rule| {
                (
                    rule.entry_for(path),
                    rule.destination.resolve(self.policy.so_to_lib),
                    rule.subpackage,
                )
            });

        if let Some(placement) = matched {
            return self.assign_by_rule(path, Some(placement));
        }

        if self.is_excluded(path) {
            return Classification::Excluded {
                reason: ExcludeReason::Listed,
            };
        }
        self.assign(vec![(path.to_string(), "main", false)], path)
    }

    /// A matched rule still yields to an explicit exclude.
    fn assign_by_rule(
        &mut self,
        path: &str,
        placement: Option<(String, &'static str, bool)>,
    ) -> Classification {
        if self.is_excluded(path) {
            return Classification::Excluded {
                reason: ExcludeReason::Listed,
            };
        }
        let placement = placement.unwrap_or_else(|| (path.to_string(), "dev", false));
        self.assign(vec![placement], path)
    }

    /// Remove `path` from every bucket and forget it was seen.
    ///
    /// Returns true when something was removed; the path is then blacklisted.
    pub fn retract(&mut self, path: &str) -> bool {
        self.state.seen.remove(path);

        let suffix = format!(" {}", path);
        let mut removed = false;
        for entries in self
            .state
            .packages
            .values_mut()
            .chain(self.state.subpackages.values_mut())
        {
            let before = entries.len();
            entries.retain(|e| e != path && !e.ends_with(&suffix));
            removed |= entries.len() != before;
        }

        if removed {
            info!("Removing {} from the file list", path);
            self.state.blacklist.insert(path.to_string());
        }
        removed
    }

    /// Drop list entries that are real directories under `buildroot`.
    pub fn prune_directories(&mut self, buildroot: &std::path::Path) -> bool {
        prune::prune_directories(&mut self.state, buildroot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(name: &str) -> FileClassifier {
        FileClassifier::new(name, ClassifierPolicy::default()).unwrap()
    }

    fn assigned_bucket(c: &Classification) -> Option<&str> {
        match c {
            Classification::Assigned { assignments } => {
                assignments.first().map(|a| a.bucket.as_str())
            }
            _ => None,
        }
    }

    #[test]
    fn test_second_classification_is_skipped() {
        let mut c = classifier("foo");
        let first = c.classify("/usr/bin/foo");
        assert_eq!(first.file_events(), 1);
        assert_eq!(c.classify("/usr/bin/foo"), Classification::Skipped);
        assert_eq!(c.state().entry_count(), 1);
    }

    #[test]
    fn test_fallback_to_main() {
        let mut c = classifier("foo");
        let result = c.classify("/etc/foo.conf");
        assert_eq!(assigned_bucket(&result), Some("main"));
    }

    #[test]
    fn test_setuid() {
        let mut c = classifier("foo").with_setuid(vec!["/usr/bin/su".to_string()]);
        c.classify("/usr/bin/su");
        assert!(c.state().packages["setuid"].contains("%attr(4755, root, root) /usr/bin/su"));
    }

    #[test]
    fn test_file_maps_win() {
        let mut maps = BTreeMap::new();
        maps.insert(
            "extras".to_string(),
            ["/usr/bin/foo-extra".to_string()].into_iter().collect(),
        );
        let mut c = classifier("foo").with_file_maps(maps);
        let result = c.classify("/usr/bin/foo-extra");
        assert_eq!(assigned_bucket(&result), Some("extras"));
    }

    #[test]
    fn test_attrs_prefix() {
        let mut attrs = BTreeMap::new();
        attrs.insert(
            "/usr/bin/foo".to_string(),
            FileAttr {
                mode: "0750".to_string(),
                user: "root".to_string(),
                group: "wheel".to_string(),
            },
        );
        let mut c = classifier("foo").with_attrs(attrs);
        c.classify("/usr/bin/foo");
        assert!(c.state().packages["bin"].contains("%attr(0750,root,wheel) /usr/bin/foo"));
    }

    #[test]
    fn test_autostart_goes_to_two_buckets() {
        let mut c = classifier("foo");
        let path = "/usr/lib/systemd/system/multi-user.target.wants/foo.service";
        let result = c.classify(path);
        assert_eq!(result.file_events(), 2);
        assert!(c.state().packages["autostart"].contains(path));
        assert!(c.state().packages["services"].contains(&format!("%exclude {}", path)));
    }

    #[test]
    fn test_update_triggers_is_not_autostart() {
        let mut c = classifier("foo");
        let path = "/usr/lib/systemd/system/update-triggers.target.wants/foo.service";
        let result = c.classify(path);
        assert_eq!(assigned_bucket(&result), Some("services"));
        assert!(!c.state().packages.contains_key("autostart"));
    }

    #[test]
    fn test_header_split() {
        let mut c = classifier("foo");
        let result = c.classify("/usr/lib64/foo/include/foo.h");
        assert_eq!(assigned_bucket(&result), Some("dev"));
    }

    #[test]
    fn test_header_split_disabled() {
        let policy = ClassifierPolicy {
            want_dev_split: false,
            ..ClassifierPolicy::default()
        };
        let path = "/usr/lib64/gcc/x86_64-generic-linux/11/include/stddef.h";

        let mut split = classifier("gcc");
        assert_eq!(assigned_bucket(&split.classify(path)), Some("dev"));

        let mut c = FileClassifier::new("gcc", policy).unwrap();
        assert_eq!(assigned_bucket(&c.classify(path)), Some("main"));
    }

    #[test]
    fn test_banned_path() {
        let mut c = classifier("foo").with_banned_paths(vec!["/opt".to_string()]);
        assert_eq!(c.classify("/opt/foo/bin/foo"), Classification::Banned);
        assert!(c.state().has_banned);
        assert!(c.state().packages.contains_key("main"));
        assert!(c.state().packages["main"].is_empty());
    }

    #[test]
    fn test_listed_exclude_beats_rule() {
        let mut c = classifier("foo").with_excludes(vec!["/usr/bin/foo".to_string()]);
        assert_eq!(
            c.classify("/usr/bin/foo"),
            Classification::Excluded {
                reason: ExcludeReason::Listed
            }
        );
    }

    #[test]
    fn test_replacement_entry_counted_once() {
        let mut c = classifier("foo");
        assert_eq!(c.classify("/usr/share/omf/a.xml").file_events(), 1);
        assert_eq!(c.classify("/usr/share/omf/b.xml").file_events(), 0);
        assert_eq!(c.state().packages["main"].len(), 1);
    }

    #[test]
    fn test_retract() {
        let mut c = classifier("foo");
        c.classify("/usr/bin/foo");
        assert!(c.retract("/usr/bin/foo"));
        assert!(c.state().packages["bin"].is_empty());
        assert!(c.state().blacklist.contains("/usr/bin/foo"));
        assert_eq!(c.classify("/usr/bin/foo"), Classification::Skipped);
    }

    #[test]
    fn test_retract_unknown_path() {
        let mut c = classifier("foo");
        assert!(!c.retract("/usr/bin/nothing"));
        assert!(c.state().blacklist.is_empty());
    }

    #[test]
    fn test_retract_attr_entry() {
        let mut c = classifier("foo").with_setuid(vec!["/usr/bin/su".to_string()]);
        c.classify("/usr/bin/su");
        assert!(c.retract("/usr/bin/su"));
        assert!(c.state().packages["setuid"].is_empty());
    }

    #[test]
    fn test_locale_bucket_for_glibc() {
        let mut c = classifier("glibc");
        c.classify("/usr/share/locale/de/LC_MESSAGES/libc.mo");
        assert!(c.state().packages.contains_key("locale"));
        assert!(!c.state().packages.contains_key("locales"));
    }

    #[test]
    fn test_excluded_locales() {
        let policy = ClassifierPolicy {
            exclude_locales: true,
            ..ClassifierPolicy::default()
        };
        let mut c = FileClassifier::new("foo", policy).unwrap();
        let result = c.classify("/usr/share/locale/de/LC_MESSAGES/foo.mo");
        assert_eq!(
            result,
            Classification::Excluded {
                reason: ExcludeReason::Locale
            }
        );
        assert!(c.state().locales.is_empty());
    }
}
