//! Collaborators the orchestrator hands its results to
//!
//! [`SpecWriter`] receives the rendered `%files` fragment before every round.
//! [`PostBuildHooks`] runs the phase-dependent actions after a successful
//! build.

use super::error::ConvergeError;
use super::round::Phase;
use crate::config::{PackageIdentity, PostBuildCommands};
use crate::output::FilesFragment;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Receives the `%files` fragment and build requirements each round
pub trait SpecWriter: Send + Sync {
    fn write(&self, identity: &PackageIdentity, fragment: &FilesFragment) -> Result<(), ConvergeError>;
}

/// Writes `<name>.files` and `<name>.buildreqs` into the package directory
#[derive(Debug, Clone)]
pub struct FilesFragmentWriter {
    dir: PathBuf,
}

impl FilesFragmentWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn files_path(&self, identity: &PackageIdentity) -> PathBuf {
        self.dir.join(format!("{}.files", identity.name))
    }

    pub fn buildreqs_path(&self, identity: &PackageIdentity) -> PathBuf {
        self.dir.join(format!("{}.buildreqs", identity.name))
    }
}

impl SpecWriter for FilesFragmentWriter {
    fn write(&self, identity: &PackageIdentity, fragment: &FilesFragment) -> Result<(), ConvergeError> {
        let files = self.files_path(identity);
        fs::write(&files, &fragment.files).map_err(ConvergeError::io(&files))?;
        let buildreqs = self.buildreqs_path(identity);
        fs::write(&buildreqs, &fragment.build_requires).map_err(ConvergeError::io(&buildreqs))?;
        debug!("Wrote {} and {}", files.display(), buildreqs.display());
        Ok(())
    }
}

/// What the post-build actions get to see
#[derive(Debug, Clone)]
pub struct HookContext {
    pub package_dir: PathBuf,
    pub results_dir: PathBuf,
    pub identity: PackageIdentity,
}

/// Post-build actions, run only after a successful build
#[async_trait]
pub trait PostBuildHooks: Send + Sync {
    async fn abi_report(&self, ctx: &HookContext) -> Result<(), ConvergeError>;

    /// Record the release the build succeeded with
    async fn write_release(&self, ctx: &HookContext) -> Result<(), ConvergeError>;

    async fn log_check(&self, ctx: &HookContext) -> Result<(), ConvergeError>;

    async fn commit(&self, ctx: &HookContext) -> Result<(), ConvergeError>;
}

/// Post-build actions that `phase` calls for, in order
pub fn post_actions(phase: Phase) -> &'static [PostAction] {
    use PostAction::*;
    match phase {
        Phase::Full => &[AbiReport, WriteRelease, LogCheck, Commit],
        Phase::Prep => &[WriteRelease],
        Phase::Build => &[LogCheck],
        Phase::Binary => &[AbiReport, Commit],
        Phase::Install => &[],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    AbiReport,
    WriteRelease,
    LogCheck,
    Commit,
}

impl PostAction {
    pub async fn run(self, hooks: &dyn PostBuildHooks, ctx: &HookContext) -> Result<(), ConvergeError> {
        match self {
            PostAction::AbiReport => hooks.abi_report(ctx).await,
            PostAction::WriteRelease => hooks.write_release(ctx).await,
            PostAction::LogCheck => hooks.log_check(ctx).await,
            PostAction::Commit => hooks.commit(ctx).await,
        }
    }
}

/// Release marker file written into the package directory
pub const RELEASE_FILE: &str = "release";

pub fn write_release_marker(dir: &Path, identity: &PackageIdentity) -> Result<(), ConvergeError> {
    let path = dir.join(RELEASE_FILE);
    fs::write(&path, format!("{}\n", identity.release)).map_err(ConvergeError::io(&path))
}

/// Runs the configured shell commands; unconfigured actions are skipped
#[derive(Debug, Clone, Default)]
pub struct CommandHooks {
    commands: PostBuildCommands,
}

impl CommandHooks {
    pub fn new(commands: PostBuildCommands) -> Self {
        Self { commands }
    }

    /// A failing command is reported but does not fail the build.
    async fn run_command(&self, action: &str, command: Option<&str>, ctx: &HookContext) {
        let Some(command) = command else {
            debug!("No {} command configured, skipping", action);
            return;
        };

        info!("Running {}: {}", action, command);
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(&ctx.package_dir)
            .env("SPECLOOP_NAME", &ctx.identity.name)
            .env("SPECLOOP_VERSION", &ctx.identity.version)
            .env("SPECLOOP_RELEASE", &ctx.identity.release)
            .env("SPECLOOP_RESULTS", &ctx.results_dir)
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("{} exited with {}", action, status),
            Err(e) => warn!("Failed to run {}: {}", action, e),
        }
    }
}

#[async_trait]
impl PostBuildHooks for CommandHooks {
    async fn abi_report(&self, ctx: &HookContext) -> Result<(), ConvergeError> {
        self.run_command("abi report", self.commands.abi_report.as_deref(), ctx)
            .await;
        Ok(())
    }

    async fn write_release(&self, ctx: &HookContext) -> Result<(), ConvergeError> {
        write_release_marker(&ctx.package_dir, &ctx.identity)
    }

    async fn log_check(&self, ctx: &HookContext) -> Result<(), ConvergeError> {
        self.run_command("log check", self.commands.log_check.as_deref(), ctx)
            .await;
        Ok(())
    }

    async fn commit(&self, ctx: &HookContext) -> Result<(), ConvergeError> {
        self.run_command("commit", self.commands.commit.as_deref(), ctx)
            .await;
        Ok(())
    }
}

/// Records which post-build actions ran
#[derive(Debug, Default)]
pub struct RecordingHooks {
    calls: Mutex<Vec<PostAction>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PostAction> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, action: PostAction) -> Result<(), ConvergeError> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(action);
        Ok(())
    }
}

#[async_trait]
impl PostBuildHooks for RecordingHooks {
    async fn abi_report(&self, _ctx: &HookContext) -> Result<(), ConvergeError> {
        self.record(PostAction::AbiReport)
    }

    async fn write_release(&self, _ctx: &HookContext) -> Result<(), ConvergeError> {
        self.record(PostAction::WriteRelease)
    }

    async fn log_check(&self, _ctx: &HookContext) -> Result<(), ConvergeError> {
        self.record(PostAction::LogCheck)
    }

    async fn commit(&self, _ctx: &HookContext) -> Result<(), ConvergeError> {
        self.record(PostAction::Commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use yare::parameterized;

    fn context(dir: &Path) -> HookContext {
        HookContext {
            package_dir: dir.to_path_buf(),
            results_dir: dir.join("results"),
            identity: PackageIdentity::new("foo", "1.0", "7"),
        }
    }

    #[parameterized(
        full = { Phase::Full, &[PostAction::AbiReport, PostAction::WriteRelease, PostAction::LogCheck, PostAction::Commit] },
        prep = { Phase::Prep, &[PostAction::WriteRelease] },
        build = { Phase::Build, &[PostAction::LogCheck] },
        install = { Phase::Install, &[] },
        binary = { Phase::Binary, &[PostAction::AbiReport, PostAction::Commit] },
    )]
    fn test_post_actions(phase: Phase, expected: &[PostAction]) {
        assert_eq!(post_actions(phase), expected);
    }

    #[test]
    fn test_fragment_writer() {
        let dir = TempDir::new().unwrap();
        let writer = FilesFragmentWriter::new(dir.path());
        let identity = PackageIdentity::new("foo", "1.0", "1");
        let fragment = FilesFragment {
            files: "%files\n".to_string(),
            build_requires: "BuildRequires : bison\n".to_string(),
        };

        writer.write(&identity, &fragment).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("foo.files")).unwrap(), "%files\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("foo.buildreqs")).unwrap(),
            "BuildRequires : bison\n"
        );
    }

    #[tokio::test]
    async fn test_command_hooks_write_release() {
        let dir = TempDir::new().unwrap();
        let hooks = CommandHooks::default();
        hooks.write_release(&context(dir.path())).await.unwrap();
        assert_eq!(fs::read_to_string(dir.path().join(RELEASE_FILE)).unwrap(), "7\n");
    }

    #[tokio::test]
    async fn test_unconfigured_commands_are_skipped() {
        let dir = TempDir::new().unwrap();
        let hooks = CommandHooks::default();
        let ctx = context(dir.path());
        hooks.abi_report(&ctx).await.unwrap();
        hooks.log_check(&ctx).await.unwrap();
        hooks.commit(&ctx).await.unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_configured_command_runs_in_package_dir() {
        let dir = TempDir::new().unwrap();
        let hooks = CommandHooks::new(PostBuildCommands {
            commit: Some("echo \"$SPECLOOP_NAME-$SPECLOOP_RELEASE\" > committed".to_string()),
            ..PostBuildCommands::default()
        });
        hooks.commit(&context(dir.path())).await.unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("committed")).unwrap(),
            "foo-7\n"
        );
    }

    #[tokio::test]
    async fn test_recording_hooks() {
        let dir = TempDir::new().unwrap();
        let hooks = RecordingHooks::new();
        for action in post_actions(Phase::Binary) {
            action.run(&hooks, &context(dir.path())).await.unwrap();
        }
        assert_eq!(hooks.calls(), vec![PostAction::AbiReport, PostAction::Commit]);
    }

    #[tokio::test]
    async fn test_recording_hooks_recover_poisoned_lock() {
        let dir = TempDir::new().unwrap();
        let hooks = RecordingHooks::new();

        let joined = std::thread::scope(|s| {
            s.spawn(|| {
                let _calls = hooks.calls.lock();
                panic!("panic while holding the call log");
            })
            .join()
        });
        assert!(joined.is_err());
        assert!(hooks.calls.is_poisoned());

        PostAction::Commit.run(&hooks, &context(dir.path())).await.unwrap();
        assert_eq!(hooks.calls(), vec![PostAction::Commit]);
    }
}
