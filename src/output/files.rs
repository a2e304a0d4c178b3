use crate::files::FileAssignment;
use crate::requirements::RequirementSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Write;

/// Bucket rendered as the unnamed `%files` section
pub const MAIN_BUCKET: &str = "main";

/// Bucket whose entries are never packaged
pub const IGNORE_BUCKET: &str = "ignore";

const LOCALE_BUCKETS: &[&str] = &["locales", "locale"];

/// Both outputs of a round, ready to be written next to the spec
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesFragment {
    pub files: String,
    pub build_requires: String,
}

impl FilesFragment {
    pub fn render(state: &FileAssignment, requirements: &RequirementSet) -> Self {
        Self {
            files: render_files_sections(state),
            build_requires: render_build_requires(requirements),
        }
    }
}

fn write_entries(out: &mut String, entries: &BTreeSet<String>) {
    for entry in entries {
        let _ = writeln!(out, "{}", entry);
    }
}

/// `%files` sections for every bucket, plus `%find_lang` per locale.
///
/// The main section always comes first and carries the `%exclude` lines;
/// empty buckets still get a header so the sub-package exists.
pub fn render_files_sections(state: &FileAssignment) -> String {
    let mut out = String::new();

    for language in &state.locales {
        let _ = writeln!(out, "%find_lang {}", language);
    }
    if !state.locales.is_empty() {
        out.push('\n');
    }

    out.push_str("%files\n%defattr(-,root,root,-)\n");
    if let Some(entries) = state.packages.get(MAIN_BUCKET) {
        write_entries(&mut out, entries);
    }
    for exclude in &state.excludes {
        let _ = writeln!(out, "%exclude {}", exclude);
    }

    for (bucket, entries) in &state.packages {
        if bucket == MAIN_BUCKET || bucket == IGNORE_BUCKET {
            continue;
        }
        let _ = write!(out, "\n%files {}", bucket);
        if LOCALE_BUCKETS.contains(&bucket.as_str()) {
            for language in &state.locales {
                let _ = write!(out, " -f {}.lang", language);
            }
        }
        out.push_str("\n%defattr(-,root,root,-)\n");
        write_entries(&mut out, entries);
    }

    for (name, entries) in &state.subpackages {
        let _ = writeln!(out, "\n%files -n {}", name);
        out.push_str("%defattr(-,root,root,-)\n");
        write_entries(&mut out, entries);
    }

    out
}

/// One `BuildRequires` line per requirement, sorted
pub fn render_build_requires(requirements: &RequirementSet) -> String {
    requirements
        .iter()
        .map(|req| format!("BuildRequires : {}\n", req))
        .collect()
}
