use super::tool::BuildToolError;
use crate::requirements::CacheError;
use std::path::PathBuf;
use thiserror::Error;

/// Conditions that end a convergence run
#[derive(Debug, Error)]
pub enum ConvergeError {
    #[error("Build log {0} does not exist; the user may lack permission to run the build tool")]
    MissingBuildLog(PathBuf),

    #[error("Cannot resolve installer packages: {}", .0.join(", "))]
    MissingInstallerPackage(Vec<String>),

    #[error("Content installed into a banned location")]
    BannedContent,

    #[error("Build did not succeed after {rounds} round(s)")]
    BuildFailed { rounds: u32 },

    #[error("Source package step failed with exit code {0}")]
    SourcePackageFailed(i32),

    #[error(transparent)]
    Tool(#[from] BuildToolError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ConvergeError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| ConvergeError::Io { path, source }
    }
}
