//! The chroot build tool behind a trait
//!
//! [`MockTool`] spawns mock (through sudo unless disabled) with its output
//! redirected to a log file. [`ScriptedBuildTool`] replays canned runs and is
//! what the convergence tests drive the orchestrator with.

use super::round::Phase;
use crate::config::{PackageIdentity, SpecloopConfig};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// Directory, relative to the package directory, mock writes results into
pub const RESULTS_DIR: &str = "results";

#[derive(Debug, Error)]
pub enum BuildToolError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No scripted build runs left")]
    Exhausted,
}

/// One call of the build tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub args: Vec<String>,
    /// Package directory the tool runs in
    pub cwd: PathBuf,
    /// File receiving the tool's stdout and stderr
    pub log_file: PathBuf,
}

#[async_trait]
pub trait BuildTool: Send + Sync {
    /// Run the tool to completion and return its exit code.
    async fn run(&self, invocation: &ToolInvocation) -> Result<i32, BuildToolError>;

    fn name(&self) -> &str;
}

/// Builds mock argument lists for the two steps of a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCommand {
    pub root_config: String,
    pub extra_opts: Vec<String>,
    pub cleanup: bool,
}

impl MockCommand {
    pub fn from_config(config: &SpecloopConfig) -> Self {
        Self {
            root_config: config.mock_config.clone(),
            extra_opts: config.mock_opts.clone(),
            cleanup: config.cleanup,
        }
    }

    fn cleanup_flag(&self) -> &'static str {
        if self.cleanup {
            "--cleanup-after"
        } else {
            "--no-cleanup-after"
        }
    }

    /// Source package step
    pub fn srpm_args(&self, identity: &PackageIdentity) -> Vec<String> {
        let mut args = vec![
            format!("--root={}", self.root_config),
            "--buildsrpm".to_string(),
            "--sources=./".to_string(),
            format!("--spec={}.spec", identity.name),
            format!("--uniqueext={}", identity.name),
            format!("--result={}/", RESULTS_DIR),
            self.cleanup_flag().to_string(),
        ];
        args.extend(self.extra_opts.iter().cloned());
        args
    }

    /// Binary package step, rebuilding the source package from the first step
    pub fn binary_args(&self, identity: &PackageIdentity, phase: Phase) -> Vec<String> {
        let mut args = vec![
            format!("--root={}", self.root_config),
            format!("--result={}/", RESULTS_DIR),
            format!("{}/{}", RESULTS_DIR, identity.srpm_file_name()),
            format!("--uniqueext={}", identity.name),
            self.cleanup_flag().to_string(),
        ];
        args.extend(self.extra_opts.iter().cloned());

        match phase {
            Phase::Full => {}
            Phase::Binary => {
                args.push("--no-clean".to_string());
                args.push("--short-circuit=binary".to_string());
            }
            Phase::Prep | Phase::Build | Phase::Install => {
                args.push(format!("--short-circuit={}", phase));
            }
        }
        args
    }
}

/// Runs mock as a subprocess
#[derive(Debug, Clone)]
pub struct MockTool {
    program: PathBuf,
    sudo: bool,
}

impl MockTool {
    pub fn new(program: impl Into<PathBuf>, sudo: bool) -> Self {
        Self {
            program: program.into(),
            sudo,
        }
    }

    pub fn from_config(config: &SpecloopConfig) -> Self {
        Self::new(config.mock_bin.clone(), config.mock_sudo)
    }

    fn command(&self) -> Command {
        if self.sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(&self.program);
            cmd
        } else {
            Command::new(&self.program)
        }
    }

    fn open_log(path: &Path) -> Result<(Stdio, Stdio), BuildToolError> {
        let io_err = |source| BuildToolError::Io {
            path: path.to_path_buf(),
            source,
        };
        let stdout = fs::File::create(path).map_err(io_err)?;
        let stderr = stdout.try_clone().map_err(io_err)?;
        Ok((Stdio::from(stdout), Stdio::from(stderr)))
    }
}

#[async_trait]
impl BuildTool for MockTool {
    async fn run(&self, invocation: &ToolInvocation) -> Result<i32, BuildToolError> {
        let (stdout, stderr) = Self::open_log(&invocation.log_file)?;
        let program = self.program.display().to_string();
        info!("Running {} {}", program, invocation.args.join(" "));

        let status = self
            .command()
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .await
            .map_err(|source| BuildToolError::Spawn {
                program: program.clone(),
                source,
            })?;

        // Logs written inside the chroot must be on disk before they are read
        if let Err(e) = Command::new("sync").status().await {
            debug!("sync failed: {}", e);
        }

        let code = status.code().unwrap_or(-1);
        debug!(code, "{} finished", program);
        Ok(code)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A canned build tool run: exit code plus files to leave behind
#[derive(Debug, Clone, Default)]
pub struct ScriptedRun {
    pub exit_code: i32,
    /// Paths relative to the invocation's working directory
    pub files: Vec<(PathBuf, String)>,
}

impl ScriptedRun {
    pub fn exit(code: i32) -> Self {
        Self {
            exit_code: code,
            files: Vec::new(),
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.push((path.into(), content.into()));
        self
    }

    /// Binary step that leaves `build.log` and `root.log` in the results dir
    pub fn build_logs(code: i32, build_log: &str, root_log: &str) -> Self {
        Self::exit(code)
            .with_file(Path::new(RESULTS_DIR).join("build.log"), build_log)
            .with_file(Path::new(RESULTS_DIR).join("root.log"), root_log)
    }
}

/// Replays queued [`ScriptedRun`]s in order and records every invocation
pub struct ScriptedBuildTool {
    runs: Mutex<VecDeque<ScriptedRun>>,
    invocations: Mutex<Vec<ToolInvocation>>,
}

impl ScriptedBuildTool {
    pub fn new() -> Self {
        Self {
            runs: Mutex::new(VecDeque::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn add_run(&self, run: ScriptedRun) {
        self.runs().push_back(run);
    }

    pub fn add_runs(&self, runs: impl IntoIterator<Item = ScriptedRun>) {
        let mut queue = self.runs();
        for run in runs {
            queue.push_back(run);
        }
    }

    pub fn remaining_runs(&self) -> usize {
        self.runs().len()
    }

    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations_log().clone()
    }

    // Poisoned locks are recovered
    fn runs(&self) -> MutexGuard<'_, VecDeque<ScriptedRun>> {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn invocations_log(&self) -> MutexGuard<'_, Vec<ToolInvocation>> {
        self.invocations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_file(path: &Path, content: &str) -> Result<(), BuildToolError> {
        let io_err = |source| BuildToolError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, content).map_err(io_err)
    }
}

impl Default for ScriptedBuildTool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedBuildTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedBuildTool")
            .field("remaining_runs", &self.remaining_runs())
            .finish()
    }
}

#[async_trait]
impl BuildTool for ScriptedBuildTool {
    async fn run(&self, invocation: &ToolInvocation) -> Result<i32, BuildToolError> {
        self.invocations_log().push(invocation.clone());
        let run = self
            .runs()
            .pop_front()
            .ok_or(BuildToolError::Exhausted)?;

        Self::write_file(&invocation.log_file, &invocation.args.join(" "))?;
        for (path, content) in &run.files {
            Self::write_file(&invocation.cwd.join(path), content)?;
        }
        Ok(run.exit_code)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
