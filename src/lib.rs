//! specloop - round-based RPM spec convergence
//!
//! Given a package directory with a spec and its sources, specloop builds the
//! package in a mock chroot, learns missing build requirements and unpackaged
//! files from the logs, and rebuilds until a round teaches nothing new.
//!
//! # Core Concepts
//!
//! - **Pattern library**: ordered tables of log-line patterns and the build
//!   requirement each one implies ([`patterns`], [`inference`])
//! - **File classifier**: ordered rules assigning install paths to `%files`
//!   sub-packages ([`files`])
//! - **Rounds**: the orchestrator runs the build tool, scans its logs in one
//!   pass and decides whether and how to rebuild ([`build`])
//!
//! # Example Usage
//!
//! ```no_run
//! use specloop::{BuildOrchestrator, PackageIdentity, PackagingOptions, SpecloopConfig};
//! use std::path::Path;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let dir = Path::new("./foo");
//! let config = SpecloopConfig::default();
//! let options = PackagingOptions::load(dir)?;
//! let identity = PackageIdentity::new("foo", "1.2", "1");
//!
//! let report = BuildOrchestrator::new(dir, identity, &config, &options)?
//!     .converge()
//!     .await?;
//! println!("converged after {} round(s)", report.rounds);
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod cli;
pub mod config;
pub mod files;
pub mod inference;
pub mod output;
pub mod patterns;
pub mod requirements;
pub mod util;

pub use build::{BuildOrchestrator, ConvergeError, ConvergeReport, Phase};
pub use config::{ConfigError, PackageIdentity, PackagingOptions, SpecloopConfig};
pub use files::{Classification, FileAssignment, FileClassifier};
pub use inference::RequirementInferer;
pub use patterns::PatternLibrary;
pub use requirements::{Requirement, RequirementSet};
pub use util::{init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
