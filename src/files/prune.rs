//! Removal of directories that ended up in the file lists

use super::FileAssignment;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;
use tracing::warn;

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(%\w+(\([^\)]*\))?\s+)(.*)").expect("valid regex"))
}

fn is_real_directory(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

fn prune_set(
    entries: &mut BTreeSet<String>,
    blacklist: &mut BTreeSet<String>,
    buildroot: &Path,
) -> bool {
    let mut removed = false;
    entries.retain(|entry| {
        // %doc, %dir and friends are kept as written
        if directive_regex().is_match(entry) {
            return true;
        }
        if is_real_directory(&buildroot.join(entry.trim_start_matches('/'))) {
            warn!("Removing directory {} from file list", entry);
            blacklist.insert(entry.clone());
            removed = true;
            return false;
        }
        true
    });
    removed
}

/// Remove entries that are real directories (not symlinks) under `buildroot`.
///
/// Returns true when anything was removed.
pub fn prune_directories(state: &mut FileAssignment, buildroot: &Path) -> bool {
    let mut removed = false;
    for entries in state.packages.values_mut() {
        removed |= prune_set(entries, &mut state.blacklist, buildroot);
    }
    for entries in state.subpackages.values_mut() {
        removed |= prune_set(entries, &mut state.blacklist, buildroot);
    }
    removed
}
