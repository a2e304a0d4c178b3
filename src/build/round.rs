//! Phase state machine and per-round accounting

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rounds past this number always stop the loop
pub const MAX_ROUNDS: u32 = 20;

/// Which part of the build is re-run.
///
/// `Full` runs every stage; the others short-circuit to a single rpmbuild
/// stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Full,
    Prep,
    Build,
    Install,
    Binary,
}

impl Phase {
    /// Requirement inference runs in this phase
    pub fn infers_requirements(self) -> bool {
        !matches!(self, Phase::Prep | Phase::Binary)
    }

    /// New requirements force a rebuild only in a full build
    pub fn requirements_force_rebuild(self) -> bool {
        self == Phase::Full
    }

    /// Log line prefix that marks a successful build in this phase
    pub fn success_marker(self) -> &'static str {
        match self {
            Phase::Full | Phase::Binary => "Executing(%clean",
            Phase::Prep | Phase::Build | Phase::Install => "Child return code was: 0",
        }
    }

    /// rpmbuild stage name passed as `--short-circuit=<stage>`
    pub fn short_circuit(self) -> Option<&'static str> {
        match self {
            Phase::Full => None,
            Phase::Prep => Some("prep"),
            Phase::Build => Some("build"),
            Phase::Install => Some("install"),
            Phase::Binary => Some("binary"),
        }
    }

    pub fn as_str(self) -> &'static str {
        self.short_circuit().unwrap_or("full")
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" | "none" => Ok(Phase::Full),
            "prep" => Ok(Phase::Prep),
            "build" => Ok(Phase::Build),
            "install" => Ok(Phase::Install),
            "binary" => Ok(Phase::Binary),
            other => Err(format!(
                "Invalid phase '{}'. Must be one of: full, prep, build, install, binary",
                other
            )),
        }
    }
}

/// Everything one round learned from its logs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Events that require a full rebuild
    pub must_restart: usize,
    /// New `%files` entries that a binary-only rebuild can pick up
    pub file_restart: usize,
    pub success: bool,
    /// Return code override from a fatal sentinel line
    pub return_code: Option<i32>,
    pub new_files_found: bool,
    /// Packages the installer could not find (from the root log)
    pub unresolved_packages: Vec<String>,
    pub new_requirements: usize,
    pub retracted_files: Vec<String>,
}

impl RoundOutcome {
    /// Nothing new was learned
    pub fn is_quiet(&self) -> bool {
        self.must_restart == 0 && self.file_restart == 0
    }

    /// Only `%files` content changed; a binary-only rebuild is enough
    pub fn only_files_changed(&self) -> bool {
        self.must_restart == 0 && self.file_restart > 0
    }
}

/// What the loop does after a round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundDecision {
    Continue,
    /// Continue in the binary phase without archiving the round's logs
    SwitchToBinary,
    Stop,
}

/// State carried across the convergence loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildRoundState {
    pub round: u32,
    pub phase: Phase,
    pub previous: RoundOutcome,
    pub success: bool,
}

impl BuildRoundState {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            ..Self::default()
        }
    }

    /// Start the next round; switches to the binary phase when the previous
    /// round only found new files.
    pub fn begin_round(&mut self, file_restart_enabled: bool) -> u32 {
        self.round += 1;
        if file_restart_enabled && self.round > 1 && self.previous.only_files_changed() {
            self.phase = Phase::Binary;
        }
        self.round
    }

    /// Fold a finished round into the state and decide what comes next.
    pub fn finish_round(&mut self, outcome: RoundOutcome, file_restart_enabled: bool) -> RoundDecision {
        self.success = outcome.success;
        let exhausted = self.round > MAX_ROUNDS;

        let decision = if exhausted {
            RoundDecision::Stop
        } else if file_restart_enabled {
            if !outcome.is_quiet() {
                RoundDecision::Continue
            } else if self.phase == Phase::Install {
                self.phase = Phase::Binary;
                RoundDecision::SwitchToBinary
            } else {
                RoundDecision::Stop
            }
        } else if outcome.must_restart == 0 {
            RoundDecision::Stop
        } else {
            RoundDecision::Continue
        };

        self.previous = outcome;
        decision
    }
}
