//! Requirement inference - learns build requirements from build-log lines

use crate::build::Phase;
use crate::patterns::{PatternLibrary, ResolveError, ResolveOutcome};
use crate::requirements::{Requirement, RequirementSet};
use std::collections::HashSet;
use tracing::{debug, warn};

/// What a single `observe` call contributed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildSignal {
    /// Requirements not seen before
    pub new_requirements: usize,
    /// How many of those force a rebuild in the current phase
    pub must_restart: usize,
}

impl RebuildSignal {
    fn merge(&mut self, other: RebuildSignal) {
        self.new_requirements += other.new_requirements;
        self.must_restart += other.must_restart;
    }
}

/// Runs the pattern library over log lines and records what it finds.
#[derive(Debug, Clone)]
pub struct RequirementInferer {
    library: PatternLibrary,
    phase: Phase,
    warned_about: HashSet<String>,
}

impl RequirementInferer {
    pub fn new(library: PatternLibrary, phase: Phase) -> Self {
        Self {
            library,
            phase,
            warned_about: HashSet::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub fn library(&self) -> &PatternLibrary {
        &self.library
    }

    fn record(&self, requirements: &mut RequirementSet, found: &[Requirement]) -> RebuildSignal {
        let added = requirements.add_all(found);
        if added > 0 {
            debug!(?found, "New build requirement");
        }
        RebuildSignal {
            new_requirements: added,
            must_restart: if self.phase.requirements_force_rebuild() {
                added
            } else {
                0
            },
        }
    }

    fn warn_once(&mut self, error: &ResolveError) {
        let token = error.token();
        if token.trim().is_empty() || token.starts_with("--") {
            return;
        }
        if self.warned_about.insert(token.to_string()) {
            match error {
                ResolveError::UnknownGem(gem) => warn!("Unknown ruby gem match: {}", gem),
                _ => warn!("Unknown pattern match: {}", token),
            }
        }
    }

    /// Feed one log line. Does nothing in the prep and binary phases.
    pub fn observe(&mut self, line: &str, requirements: &mut RequirementSet) -> RebuildSignal {
        let mut signal = RebuildSignal::default();
        if !self.phase.infers_requirements() {
            return signal;
        }

        if let Some(m) = self.library.pkgconfig.first_match(line) {
            let found = [Requirement::pkgconfig(m.action.clone())];
            signal.merge(self.record(requirements, &found));
        }

        if let Some(m) = self.library.simple.first_match(line) {
            let found = [Requirement::plain(m.action.clone())];
            signal.merge(self.record(requirements, &found));
        }

        let failed = self.library.failed.first_match(line).map(|m| {
            let raw = m.captured.unwrap_or("");
            m.action.resolve(raw, &self.library.tables)
        });
        match failed {
            Some(ResolveOutcome::Resolved(found)) => {
                signal.merge(self.record(requirements, &found));
            }
            Some(ResolveOutcome::Unresolvable(error)) => self.warn_once(&error),
            Some(ResolveOutcome::Ignored) | None => {}
        }

        if self.library.failed_exit.first_match(line).is_some() {
            warn!("{}", line.trim_end());
        }

        signal
    }
}
