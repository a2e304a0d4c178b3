//! Stateful line detectors run over the build and root logs
//!
//! Each detector sees every line once, in file order, and reports an event
//! when its line shape appears. The [`LogScanner`](super::scanner::LogScanner)
//! composes them and folds their events into a round outcome.

use super::round::Phase;
use crate::config::PackageIdentity;
use regex::Regex;
use std::sync::OnceLock;

/// One line in, at most one event out
pub trait LineDetector {
    type Event;

    fn feed(&mut self, line: &str) -> Option<Self::Event>;
}

const FILES_SECTION_HEADER: &str = "Installed (but unpackaged) file(s) found:";
const FILES_SECTION_END_MARKERS: &[&str] = &[
    "RPM build errors",
    "Childreturncodewas",
    "Child returncode",
    "Empty %files file",
];
const FILES_SECTION_END_PREFIXES: &[&str] = &["Building", "Child return code was"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SectionState {
    #[default]
    Before,
    Inside,
    After,
}

/// Extracts the paths rpmbuild lists as installed but unpackaged
#[derive(Debug, Clone, Default)]
pub struct FilesSectionDetector {
    state: SectionState,
}

impl FilesSectionDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_inside(&self) -> bool {
        self.state == SectionState::Inside
    }
}

impl LineDetector for FilesSectionDetector {
    type Event = String;

    fn feed(&mut self, line: &str) -> Option<String> {
        if self.state == SectionState::Inside
            && (FILES_SECTION_END_MARKERS.iter().any(|m| line.contains(m))
                || FILES_SECTION_END_PREFIXES.iter().any(|p| line.starts_with(p)))
        {
            self.state = SectionState::After;
        }

        match self.state {
            SectionState::Before => {
                if line.contains(FILES_SECTION_HEADER) {
                    self.state = SectionState::Inside;
                }
                None
            }
            SectionState::Inside => {
                let path = line.trim();
                path.starts_with('/').then(|| path.to_string())
            }
            SectionState::After => None,
        }
    }
}

const TAB_ERROR: &str = "Sorry: TabError: inconsistent use of tabs and spaces in indentation";

/// Return code forced by a fatal sentinel line
pub const TAB_ERROR_RETURN_CODE: i32 = 99;

/// Lines that turn an apparently successful build into a failure
#[derive(Debug, Clone, Default)]
pub struct FatalSentinelDetector;

impl LineDetector for FatalSentinelDetector {
    type Event = i32;

    fn feed(&mut self, line: &str) -> Option<i32> {
        line.starts_with(TAB_ERROR)
            .then_some(TAB_ERROR_RETURN_CODE)
    }
}

/// Latches success once the phase's success marker appears with a zero
/// return code
#[derive(Debug, Clone)]
pub struct SuccessDetector {
    marker: &'static str,
    return_code: i32,
    latched: bool,
}

impl SuccessDetector {
    pub fn new(phase: Phase, return_code: i32) -> Self {
        Self {
            marker: phase.success_marker(),
            return_code,
            latched: false,
        }
    }

    pub fn override_return_code(&mut self, code: i32) {
        self.return_code = code;
    }

    pub fn succeeded(&self) -> bool {
        self.latched
    }
}

impl LineDetector for SuccessDetector {
    type Event = ();

    fn feed(&mut self, line: &str) -> Option<()> {
        if !self.latched && self.return_code == 0 && line.starts_with(self.marker) {
            self.latched = true;
            return Some(());
        }
        None
    }
}

/// Paths rpmbuild could not find in the build root
#[derive(Debug, Clone)]
pub struct MissingFileDetector {
    marker: String,
}

impl MissingFileDetector {
    pub fn new(identity: &PackageIdentity) -> Self {
        Self {
            marker: format!("File not found: /builddir/build/BUILDROOT/{}/", identity.nvra()),
        }
    }
}

impl LineDetector for MissingFileDetector {
    type Event = String;

    fn feed(&mut self, line: &str) -> Option<String> {
        line.split_once(self.marker.as_str())
            .map(|(_, rest)| format!("/{}", rest.trim()))
    }
}

fn missing_package_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^.*No matching package to install: '(.*)'$").expect("valid regex")
    })
}

/// Installer packages the chroot could not resolve
#[derive(Debug, Clone, Default)]
pub struct RootLogDetector;

impl LineDetector for RootLogDetector {
    type Event = String;

    fn feed(&mut self, line: &str) -> Option<String> {
        missing_package_regex()
            .captures(line.trim_end_matches(['\r', '\n']))
            .map(|caps| caps[1].to_string())
    }
}
