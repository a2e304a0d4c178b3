//! Build convergence - rounds of the chroot build tool and what they teach us
//!
//! [`BuildOrchestrator`] owns the loop. Every round the [`LogScanner`] makes a
//! single pass over the tool's logs, feeding the requirement inferer, the file
//! classifier and the [`detectors`]; the resulting [`RoundOutcome`] decides
//! whether another round is needed and in which [`Phase`].

pub mod detectors;
mod error;
pub mod hooks;
pub mod logs;
mod orchestrator;
mod round;
mod scanner;
pub mod tool;

pub use error::ConvergeError;
pub use hooks::{
    CommandHooks, FilesFragmentWriter, HookContext, PostAction, PostBuildHooks, RecordingHooks,
    SpecWriter,
};
pub use orchestrator::{BuildOrchestrator, ConvergeReport};
pub use round::{BuildRoundState, Phase, RoundDecision, RoundOutcome, MAX_ROUNDS};
pub use scanner::{scan_root_log, LogScanner, RootLogReport};
pub use tool::{
    BuildTool, BuildToolError, MockCommand, MockTool, ScriptedBuildTool, ScriptedRun,
    ToolInvocation,
};
