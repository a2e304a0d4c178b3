//! The convergence loop
//!
//! Each round renders the current `%files` fragment, runs the two mock steps,
//! scans the logs and folds what was learned into the next round's phase. The
//! loop ends when a round learns nothing new, or after the round budget.

use super::error::ConvergeError;
use super::hooks::{post_actions, CommandHooks, FilesFragmentWriter, HookContext, PostBuildHooks, SpecWriter};
use super::logs::{read_log, ResultsDir};
use super::round::{BuildRoundState, Phase, RoundDecision, RoundOutcome};
use super::scanner::LogScanner;
use super::tool::{BuildTool, MockCommand, MockTool, ToolInvocation, RESULTS_DIR};
use crate::config::{ConfigError, PackageIdentity, PackagingOptions, SpecloopConfig};
use crate::files::{FileAssignment, FileClassifier};
use crate::inference::RequirementInferer;
use crate::output::FilesFragment;
use crate::requirements::{RequirementCache, RequirementSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Summary of a finished convergence run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergeReport {
    pub package: String,
    pub rounds: u32,
    /// Phase the last round ran in
    pub phase: Phase,
    pub success: bool,
    pub requirements: Vec<String>,
    pub files: FileAssignment,
}

/// Drives rounds of the build tool until the package description stops changing
pub struct BuildOrchestrator {
    package_dir: PathBuf,
    identity: PackageIdentity,
    file_restart: bool,
    buildroot: PathBuf,
    mock: MockCommand,
    results: ResultsDir,
    cache: RequirementCache,
    tool: Arc<dyn BuildTool>,
    writer: Arc<dyn SpecWriter>,
    hooks: Arc<dyn PostBuildHooks>,
    inferer: RequirementInferer,
    requirements: RequirementSet,
    classifier: FileClassifier,
    state: BuildRoundState,
}

impl BuildOrchestrator {
    /// Orchestrator with the production collaborators: mock, the
    /// `<name>.files` writer and the configured post-build commands.
    pub fn new(
        package_dir: impl Into<PathBuf>,
        identity: PackageIdentity,
        config: &SpecloopConfig,
        options: &PackagingOptions,
    ) -> Result<Self, ConfigError> {
        let package_dir = package_dir.into();
        identity.validate()?;

        Ok(Self {
            buildroot: config.buildroot(&identity),
            file_restart: config.file_restart,
            mock: MockCommand::from_config(config),
            results: ResultsDir::new(package_dir.join(RESULTS_DIR)),
            cache: RequirementCache::in_dir(&package_dir),
            tool: Arc::new(MockTool::from_config(config)),
            writer: Arc::new(FilesFragmentWriter::new(&package_dir)),
            hooks: Arc::new(CommandHooks::new(options.post_build.clone())),
            inferer: RequirementInferer::new(options.pattern_library()?, Phase::Full),
            requirements: options.requirement_set(),
            classifier: options.classifier(&identity.name)?,
            state: BuildRoundState::new(Phase::Full),
            package_dir,
            identity,
        })
    }

    pub fn with_tool(mut self, tool: Arc<dyn BuildTool>) -> Self {
        self.tool = tool;
        self
    }

    pub fn with_spec_writer(mut self, writer: Arc<dyn SpecWriter>) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn PostBuildHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Start in a short-circuit phase instead of a full build
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.state = BuildRoundState::new(phase);
        self
    }

    pub fn with_buildroot(mut self, buildroot: impl Into<PathBuf>) -> Self {
        self.buildroot = buildroot.into();
        self
    }

    pub fn with_file_restart(mut self, enabled: bool) -> Self {
        self.file_restart = enabled;
        self
    }

    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.mock.cleanup = cleanup;
        self
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    pub fn state(&self) -> &BuildRoundState {
        &self.state
    }

    pub fn requirements(&self) -> &RequirementSet {
        &self.requirements
    }

    pub fn files(&self) -> &FileAssignment {
        self.classifier.state()
    }

    fn write_fragment(&self) -> Result<(), ConvergeError> {
        let fragment = FilesFragment::render(self.classifier.state(), &self.requirements);
        self.writer.write(&self.identity, &fragment)
    }

    fn invocation(&self, args: Vec<String>, log: &str) -> ToolInvocation {
        ToolInvocation {
            args,
            cwd: self.package_dir.clone(),
            log_file: self.results.log(log),
        }
    }

    /// Source package step then binary step; returns the binary step's code.
    async fn run_build_tool(&self) -> Result<i32, ConvergeError> {
        let srpm = self.invocation(self.mock.srpm_args(&self.identity), "mock_srpm");
        let srpm_code = self.tool.run(&srpm).await?;
        self.results.rename_srpm_logs()?;
        if srpm_code != 0 {
            return Err(ConvergeError::SourcePackageFailed(srpm_code));
        }

        let binary = self.invocation(
            self.mock.binary_args(&self.identity, self.state.phase),
            "mock_build",
        );
        Ok(self.tool.run(&binary).await?)
    }

    /// Run one round and return what it learned.
    async fn round(&mut self) -> Result<RoundOutcome, ConvergeError> {
        let round = self.state.begin_round(self.file_restart);
        let phase = self.state.phase;
        info!("Building package {} round {} ({} phase)", self.identity.name, round, phase);

        if round == 1 {
            self.results.reset()?;
        } else {
            self.results.ensure()?;
        }
        self.write_fragment()?;

        let code = self.run_build_tool().await?;

        let build_log_path = self.results.build_log();
        let Some(build_log) = read_log(&build_log_path)? else {
            return Err(ConvergeError::MissingBuildLog(build_log_path));
        };
        let root_log = read_log(&self.results.root_log())?.unwrap_or_default();

        let mut outcome = LogScanner::new(
            &mut self.inferer,
            &mut self.requirements,
            &mut self.classifier,
            &self.identity,
            phase,
        )
        .with_file_restart(self.file_restart)
        .scan(&root_log, &build_log, code);

        if self.classifier.state().has_banned {
            return Err(ConvergeError::BannedContent);
        }
        if !outcome.unresolved_packages.is_empty() {
            return Err(ConvergeError::MissingInstallerPackage(outcome.unresolved_packages));
        }

        self.cache.store(&self.identity.version, &self.requirements)?;

        if self.classifier.prune_directories(&self.buildroot) {
            debug!("Directories pruned from the file list");
            outcome.must_restart += 1;
        }

        debug!(
            must_restart = outcome.must_restart,
            file_restart = outcome.file_restart,
            success = outcome.success,
            "Round {} finished",
            round
        );
        Ok(outcome)
    }

    /// Run rounds until the build converges.
    ///
    /// # Errors
    ///
    /// Any fatal condition ends the run: a missing build log, banned content,
    /// unresolvable installer packages, a failing build tool, or a final round
    /// that did not succeed.
    pub async fn converge(mut self) -> Result<ConvergeReport, ConvergeError> {
        if let Err(e) = self.cache.load_into(&self.identity.version, &mut self.requirements) {
            warn!("Ignoring requirement cache: {}", e);
        }

        loop {
            let outcome = self.round().await?;
            let round = self.state.round;
            match self.state.finish_round(outcome, self.file_restart) {
                RoundDecision::Stop => break,
                RoundDecision::SwitchToBinary => {
                    info!("Switching to the binary phase");
                }
                RoundDecision::Continue => self.results.archive_round(round)?,
            }
        }

        self.write_fragment()?;

        if !self.state.success {
            error!("FATAL: Build failed, aborting");
            return Err(ConvergeError::BuildFailed {
                rounds: self.state.round,
            });
        }

        let ctx = HookContext {
            package_dir: self.package_dir.clone(),
            results_dir: self.results.path().to_path_buf(),
            identity: self.identity.clone(),
        };
        for action in post_actions(self.state.phase) {
            debug!(?action, "Post-build action");
            action.run(self.hooks.as_ref(), &ctx).await?;
        }

        info!(
            "Package {} converged after {} round(s)",
            self.identity.nvr(),
            self.state.round
        );

        Ok(ConvergeReport {
            package: self.identity.nvr(),
            rounds: self.state.round,
            phase: self.state.phase,
            success: self.state.success,
            requirements: self.requirements.iter().map(str::to_string).collect(),
            files: self.classifier.into_state(),
        })
    }
}

impl std::fmt::Debug for BuildOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOrchestrator")
            .field("package_dir", &self.package_dir)
            .field("identity", &self.identity)
            .field("tool", &self.tool.name())
            .field("state", &self.state)
            .finish()
    }
}
