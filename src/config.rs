//! Configuration management for specloop
//!
//! Two layers feed a run:
//!
//! - [`SpecloopConfig`]: runtime settings for the chroot build tool, loaded from
//!   environment variables with sensible defaults.
//! - [`PackagingOptions`]: per-package policy, lookup tables and extra patterns,
//!   read from `specloop.toml` in the package directory.
//!
//! # Environment Variables
//!
//! - `SPECLOOP_MOCK_BIN`: mock executable - default: "/usr/bin/mock"
//! - `SPECLOOP_MOCK_SUDO`: run mock through sudo (true|false) - default: "true"
//! - `SPECLOOP_MOCK_CONFIG`: mock chroot config (`--root`) - default: "clear"
//! - `SPECLOOP_MOCK_OPTS`: extra mock arguments, whitespace separated - default: ""
//! - `SPECLOOP_MOCK_DIR`: mock chroot directory - default: "/var/lib/mock"
//! - `SPECLOOP_FILE_RESTART`: binary-only rebuilds for `%files` changes - default: "true"
//! - `SPECLOOP_CLEANUP`: remove the chroot after each build - default: "false"
//! - `SPECLOOP_LOG_LEVEL`: logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use specloop::config::{PackagingOptions, SpecloopConfig};
//! use std::path::Path;
//!
//! let config = SpecloopConfig::default();
//! config.validate().expect("Invalid configuration");
//!
//! let options = PackagingOptions::load(Path::new("./foo")).expect("Invalid specloop.toml");
//! let classifier = options.classifier("foo").expect("Invalid rules");
//! ```

use crate::files::{ClassifierPolicy, FileAttr, FileClassifier};
use crate::patterns::{PatternError, PatternLibrary, Resolver};
use crate::requirements::RequirementSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_MOCK_BIN: &str = "/usr/bin/mock";
const DEFAULT_MOCK_SUDO: bool = true;
const DEFAULT_MOCK_CONFIG: &str = "clear";
const DEFAULT_MOCK_DIR: &str = "/var/lib/mock";
const DEFAULT_FILE_RESTART: bool = true;
const DEFAULT_CLEANUP: bool = false;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ARCH: &str = "x86_64";

/// Name of the per-package options file
pub const OPTIONS_FILE_NAME: &str = "specloop.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<regex::Error> for ConfigError {
    fn from(err: regex::Error) -> Self {
        ConfigError::ParseError {
            field: "rule table".to_string(),
            error: err.to_string(),
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(default)
}

/// Runtime configuration for the chroot build tool
#[derive(Debug, Clone)]
pub struct SpecloopConfig {
    /// mock executable
    pub mock_bin: PathBuf,

    /// Run mock through sudo
    pub mock_sudo: bool,

    /// mock chroot configuration name
    pub mock_config: String,

    /// Extra arguments appended to every mock invocation
    pub mock_opts: Vec<String>,

    /// Directory mock keeps its chroots in
    pub mock_dir: PathBuf,

    /// Rebuild only the binary stage when nothing but `%files` changed
    pub file_restart: bool,

    /// Remove the chroot after each build
    pub cleanup: bool,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for SpecloopConfig {
    /// Loads `SPECLOOP_*` environment variables, falling back to defaults
    fn default() -> Self {
        let mock_bin = env::var("SPECLOOP_MOCK_BIN")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MOCK_BIN));

        let mock_config =
            env::var("SPECLOOP_MOCK_CONFIG").unwrap_or_else(|_| DEFAULT_MOCK_CONFIG.to_string());

        let mock_opts = env::var("SPECLOOP_MOCK_OPTS")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        let mock_dir = env::var("SPECLOOP_MOCK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MOCK_DIR));

        let log_level = env::var("SPECLOOP_LOG_LEVEL")
            .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();

        Self {
            mock_bin,
            mock_sudo: env_bool("SPECLOOP_MOCK_SUDO", DEFAULT_MOCK_SUDO),
            mock_config,
            mock_opts,
            mock_dir,
            file_restart: env_bool("SPECLOOP_FILE_RESTART", DEFAULT_FILE_RESTART),
            cleanup: env_bool("SPECLOOP_CLEANUP", DEFAULT_CLEANUP),
            log_level,
        }
    }
}

impl SpecloopConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` for an empty mock binary or
    /// chroot config, or an unknown log level.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mock_bin.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Mock binary path cannot be empty".to_string(),
            ));
        }

        if self.mock_config.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Mock chroot config cannot be empty".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    /// Build root of `identity` inside the mock chroot
    pub fn buildroot(&self, identity: &PackageIdentity) -> PathBuf {
        self.mock_dir
            .join(format!("clear-{}", identity.name))
            .join("root/builddir/build/BUILDROOT")
            .join(identity.nvra())
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert("mock_bin".to_string(), self.mock_bin.display().to_string());
        map.insert("mock_sudo".to_string(), self.mock_sudo.to_string());
        map.insert("mock_config".to_string(), self.mock_config.clone());
        map.insert("mock_opts".to_string(), self.mock_opts.join(" "));
        map.insert("mock_dir".to_string(), self.mock_dir.display().to_string());
        map.insert("file_restart".to_string(), self.file_restart.to_string());
        map.insert("cleanup".to_string(), self.cleanup.to_string());
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for SpecloopConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Specloop Configuration:")?;
        writeln!(f, "  Mock Binary: {}", self.mock_bin.display())?;
        writeln!(f, "  Mock Sudo: {}", self.mock_sudo)?;
        writeln!(f, "  Mock Config: {}", self.mock_config)?;
        if !self.mock_opts.is_empty() {
            writeln!(f, "  Mock Options: {}", self.mock_opts.join(" "))?;
        }
        writeln!(f, "  Mock Dir: {}", self.mock_dir.display())?;
        writeln!(f, "  File Restart: {}", self.file_restart)?;
        writeln!(f, "  Cleanup: {}", self.cleanup)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

/// Name, version, release and architecture of the package being built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIdentity {
    pub name: String,
    pub version: String,
    pub release: String,
    pub arch: String,
}

impl PackageIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>, release: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            release: release.into(),
            arch: DEFAULT_ARCH.to_string(),
        }
    }

    pub fn with_arch(mut self, arch: impl Into<String>) -> Self {
        self.arch = arch.into();
        self
    }

    /// `name-version-release`
    pub fn nvr(&self) -> String {
        format!("{}-{}-{}", self.name, self.version, self.release)
    }

    /// `name-version-release.arch`
    pub fn nvra(&self) -> String {
        format!("{}.{}", self.nvr(), self.arch)
    }

    pub fn srpm_file_name(&self) -> String {
        format!("{}.src.rpm", self.nvr())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("name", &self.name),
            ("version", &self.version),
            ("release", &self.release),
            ("arch", &self.arch),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "Package {} cannot be empty",
                    field
                )));
            }
            if value.contains(char::is_whitespace) || value.contains('/') {
                return Err(ConfigError::ValidationFailed(format!(
                    "Package {} '{}' contains whitespace or '/'",
                    field, value
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nvra())
    }
}

/// Extra `simple` pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplePattern {
    pub pattern: String,
    pub requirement: String,
}

/// Extra `pkgconfig` pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkgConfigPattern {
    pub pattern: String,
    pub module: String,
}

/// Extra `failed` pattern; must capture the token in its first group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedPattern {
    pub pattern: String,
    pub resolver: Resolver,
}

/// Patterns appended after the built-in tables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraPatterns {
    pub simple: Vec<SimplePattern>,
    pub pkgconfig: Vec<PkgConfigPattern>,
    pub failed: Vec<FailedPattern>,
    pub failed_exit: Vec<String>,
}

/// Shell commands run after a successful build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostBuildCommands {
    pub abi_report: Option<String>,
    pub log_check: Option<String>,
    pub commit: Option<String>,
}

/// Per-package options, read from `specloop.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagingOptions {
    /// Also build 32-bit libraries
    #[serde(rename = "32bit")]
    pub enable_32bit: bool,

    #[serde(flatten)]
    pub policy: ClassifierPolicy,

    /// Bucket → paths that always go there
    pub file_maps: BTreeMap<String, BTreeSet<String>>,
    pub setuid: Vec<String>,
    pub attrs: BTreeMap<String, FileAttr>,
    pub excludes: Vec<String>,
    pub banned_paths: Vec<String>,

    pub gems: BTreeMap<String, String>,
    pub pypi_translations: BTreeMap<String, String>,
    pub failed_commands: BTreeMap<String, String>,
    pub ignored_commands: Vec<String>,

    pub patterns: ExtraPatterns,
    pub post_build: PostBuildCommands,
}

impl PackagingOptions {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            field: OPTIONS_FILE_NAME.to_string(),
            error: e.to_string(),
        })
    }

    /// Read `specloop.toml` from `dir`; a missing file yields the defaults.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(OPTIONS_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io { path, source }),
        }
    }

    /// Built-in pattern library extended with these options
    pub fn pattern_library(&self) -> Result<PatternLibrary, ConfigError> {
        let mut library = PatternLibrary::with_defaults();

        for extra in &self.patterns.simple {
            library.simple.push(&extra.pattern, extra.requirement.clone())?;
        }
        for extra in &self.patterns.pkgconfig {
            library.pkgconfig.push(&extra.pattern, extra.module.clone())?;
        }
        for extra in &self.patterns.failed {
            library.push_failed(&extra.pattern, extra.resolver)?;
        }
        for pattern in &self.patterns.failed_exit {
            library.failed_exit.push(pattern, ())?;
        }

        let tables = &mut library.tables;
        tables.failed_commands.extend(self.failed_commands.clone());
        tables.gems.extend(self.gems.clone());
        tables.pypi_translations.extend(self.pypi_translations.clone());
        tables.ignored.extend(self.ignored_commands.iter().cloned());

        Ok(library)
    }

    /// File classifier for `package_name` configured with these options
    pub fn classifier(&self, package_name: &str) -> Result<FileClassifier, ConfigError> {
        Ok(FileClassifier::new(package_name, self.policy.clone())?
            .with_file_maps(self.file_maps.clone())
            .with_setuid(self.setuid.iter().cloned())
            .with_attrs(self.attrs.clone())
            .with_banned_paths(self.banned_paths.clone())
            .with_excludes(self.excludes.iter().cloned()))
    }

    pub fn requirement_set(&self) -> RequirementSet {
        RequirementSet::with_32bit(self.enable_32bit)
    }
}
