//! Single-pass log scanner feeding the inferer, the classifier and the detectors

use super::detectors::{
    FatalSentinelDetector, FilesSectionDetector, LineDetector, MissingFileDetector,
    RootLogDetector, SuccessDetector,
};
use super::round::{Phase, RoundOutcome};
use crate::config::PackageIdentity;
use crate::files::FileClassifier;
use crate::inference::RequirementInferer;
use crate::requirements::RequirementSet;
use tracing::{debug, error, info};

/// Result of scanning the root log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootLogReport {
    /// Build log parsing should proceed
    pub clean: bool,
    pub unresolved_packages: Vec<String>,
}

/// Scan the chroot setup log for packages the installer could not resolve.
///
/// A zero return code means the root log is not consulted at all.
pub fn scan_root_log(content: &str, return_code: i32) -> RootLogReport {
    if return_code == 0 {
        return RootLogReport {
            clean: true,
            unresolved_packages: Vec::new(),
        };
    }

    let mut detector = RootLogDetector;
    let unresolved: Vec<String> = content
        .lines()
        .filter_map(|line| detector.feed(line))
        .inspect(|pkg| error!("Cannot resolve dependency name: {}", pkg))
        .collect();

    RootLogReport {
        clean: unresolved.is_empty(),
        unresolved_packages: unresolved,
    }
}

/// Borrows the round's mutable state for one pass over the build log
pub struct LogScanner<'a> {
    inferer: &'a mut RequirementInferer,
    requirements: &'a mut RequirementSet,
    classifier: &'a mut FileClassifier,
    identity: &'a PackageIdentity,
    phase: Phase,
    file_restart_enabled: bool,
}

impl<'a> LogScanner<'a> {
    pub fn new(
        inferer: &'a mut RequirementInferer,
        requirements: &'a mut RequirementSet,
        classifier: &'a mut FileClassifier,
        identity: &'a PackageIdentity,
        phase: Phase,
    ) -> Self {
        inferer.set_phase(phase);
        Self {
            inferer,
            requirements,
            classifier,
            identity,
            phase,
            file_restart_enabled: true,
        }
    }

    /// New `%files` entries count toward `file_restart` instead of `must_restart`
    pub fn with_file_restart(mut self, enabled: bool) -> Self {
        self.file_restart_enabled = enabled;
        self
    }

    fn record_file(&mut self, path: &str, outcome: &mut RoundOutcome) {
        let classification = self.classifier.classify(path);
        debug!(path, ?classification, "Classified file");

        if classification.new_locale() {
            outcome.must_restart += 1;
        }

        let events = classification.file_events();
        if events == 0 {
            return;
        }
        if self.file_restart_enabled {
            outcome.file_restart += events;
        } else {
            outcome.must_restart += events;
        }
        if !outcome.new_files_found {
            info!("New %files content found");
            outcome.new_files_found = true;
        }
    }

    /// Scan the build log into `outcome`.
    pub fn scan_build_log(&mut self, content: &str, return_code: i32, outcome: &mut RoundOutcome) {
        let mut files = FilesSectionDetector::new();
        let mut sentinel = FatalSentinelDetector;
        let mut success = SuccessDetector::new(self.phase, return_code);
        let mut missing = MissingFileDetector::new(self.identity);

        for line in content.lines() {
            let signal = self.inferer.observe(line, self.requirements);
            outcome.new_requirements += signal.new_requirements;
            outcome.must_restart += signal.must_restart;

            if let Some(path) = files.feed(line) {
                self.record_file(&path, outcome);
            }

            if let Some(code) = sentinel.feed(line) {
                info!("{}", line.trim_end());
                outcome.return_code = Some(code);
                success.override_return_code(code);
            }

            if let Some(path) = missing.feed(line) {
                if self.classifier.retract(&path) {
                    outcome.must_restart += 1;
                    outcome.retracted_files.push(path);
                }
            }

            if success.feed(line).is_some() {
                match self.phase {
                    Phase::Full => info!("RPM build successful"),
                    phase => info!("RPM {} build successful", phase),
                }
                outcome.success = true;
            }
        }
    }

    /// Scan both logs of a round.
    pub fn scan(mut self, root_log: &str, build_log: &str, return_code: i32) -> RoundOutcome {
        let mut outcome = RoundOutcome::default();
        let root = scan_root_log(root_log, return_code);
        outcome.unresolved_packages = root.unresolved_packages;
        if root.clean {
            self.scan_build_log(build_log, return_code, &mut outcome);
        }
        outcome
    }
}
