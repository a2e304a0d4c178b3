//! Layout of the results directory and per-round log archival

use super::error::ConvergeError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Logs kept for every round, without the `.log` suffix
pub const ROUND_LOGS: &[&str] = &[
    "build",
    "root",
    "srpm-build",
    "srpm-root",
    "mock_srpm",
    "mock_build",
];

/// Paths of the logs inside one results directory
#[derive(Debug, Clone)]
pub struct ResultsDir {
    root: PathBuf,
}

impl ResultsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn log(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.log", name))
    }

    pub fn build_log(&self) -> PathBuf {
        self.log("build")
    }

    pub fn root_log(&self) -> PathBuf {
        self.log("root")
    }

    /// Start from an empty results directory
    pub fn reset(&self) -> Result<(), ConvergeError> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(ConvergeError::io(&self.root))?;
        }
        fs::create_dir_all(&self.root).map_err(ConvergeError::io(&self.root))
    }

    pub fn ensure(&self) -> Result<(), ConvergeError> {
        fs::create_dir_all(&self.root).map_err(ConvergeError::io(&self.root))
    }

    /// Keep the source package step's logs apart from the binary step's
    pub fn rename_srpm_logs(&self) -> Result<(), ConvergeError> {
        self.rename_if_present(&self.root_log(), &self.log("srpm-root"))?;
        self.rename_if_present(&self.build_log(), &self.log("srpm-build"))
    }

    /// Move every round log to `round<N>-<log>.log`
    pub fn archive_round(&self, round: u32) -> Result<(), ConvergeError> {
        for name in ROUND_LOGS {
            let archived = self.root.join(format!("round{}-{}.log", round, name));
            self.rename_if_present(&self.log(name), &archived)?;
        }
        Ok(())
    }

    fn rename_if_present(&self, from: &Path, to: &Path) -> Result<(), ConvergeError> {
        if !from.exists() {
            return Ok(());
        }
        debug!("{} -> {}", from.display(), to.display());
        fs::rename(from, to).map_err(ConvergeError::io(from))
    }
}

/// Read a log that may contain bytes that are not UTF-8
pub fn read_log(path: &Path) -> Result<Option<String>, ConvergeError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConvergeError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_archive_round() {
        let dir = TempDir::new().unwrap();
        let results = ResultsDir::new(dir.path().join("results"));
        results.ensure().unwrap();
        fs::write(results.build_log(), "b").unwrap();
        fs::write(results.log("mock_build"), "m").unwrap();

        results.archive_round(3).unwrap();

        assert!(!results.build_log().exists());
        assert_eq!(
            fs::read_to_string(results.path().join("round3-build.log")).unwrap(),
            "b"
        );
        assert!(results.path().join("round3-mock_build.log").exists());
        assert!(!results.path().join("round3-root.log").exists());
    }

    #[test]
    fn test_rename_srpm_logs() {
        let dir = TempDir::new().unwrap();
        let results = ResultsDir::new(dir.path());
        fs::write(results.root_log(), "r").unwrap();

        results.rename_srpm_logs().unwrap();

        assert!(!results.root_log().exists());
        assert!(results.log("srpm-root").exists());
    }

    #[test]
    fn test_reset_clears_old_logs() {
        let dir = TempDir::new().unwrap();
        let results = ResultsDir::new(dir.path().join("results"));
        results.ensure().unwrap();
        fs::write(results.path().join("round1-build.log"), "old").unwrap();

        results.reset().unwrap();

        assert!(results.path().is_dir());
        assert_eq!(fs::read_dir(results.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_read_log_lossy_and_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("build.log");
        assert_eq!(read_log(&path).unwrap(), None);

        fs::write(&path, b"ok \xff line\n").unwrap();
        let content = read_log(&path).unwrap().unwrap();
        assert!(content.starts_with("ok "));
        assert!(content.ends_with(" line\n"));
    }
}
