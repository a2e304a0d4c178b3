use crate::build::Phase;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Converge an RPM spec by building it in mock until the logs stop teaching anything new
#[derive(Parser, Debug)]
#[command(
    name = "specloop",
    about = "Round-based RPM spec convergence in a mock chroot",
    version,
    author,
    long_about = "specloop builds a package in a mock chroot, reads the build and root logs \
                  for missing build requirements and unpackaged files, updates the %files \
                  fragment and build requirements, and rebuilds until nothing changes."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Build a package until its spec converges",
        long_about = "Runs rounds of mock builds in the package directory. Each round writes \
                      <name>.files and <name>.buildreqs, builds, and scans the logs.\n\n\
                      Examples:\n  \
                      specloop build ./foo --name foo --version 1.2 --release 1\n  \
                      specloop build ./foo --name foo --version 1.2 --release 1 --short-circuit install"
    )]
    Build(BuildArgs),

    #[command(
        about = "Classify install paths into %files sections",
        long_about = "Runs the file classifier over the given paths and prints where each one \
                      lands.\n\n\
                      Examples:\n  \
                      specloop classify --name foo /usr/bin/foo /usr/lib64/libfoo.so"
    )]
    Classify(ClassifyArgs),

    #[command(
        about = "Scan an existing build log",
        long_about = "Scans a build log (and optionally a root log) the way a build round \
                      does, without running mock.\n\n\
                      Examples:\n  \
                      specloop scan results/build.log --name foo --version 1.2 --release 1"
    )]
    Scan(ScanArgs),

    #[command(about = "Show the runtime configuration")]
    Config(ConfigArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(
        value_name = "DIR",
        help = "Package directory holding <name>.spec and sources (defaults to current directory)"
    )]
    pub package_dir: Option<PathBuf>,

    #[arg(long, help = "Package name")]
    pub name: String,

    #[arg(long = "version", value_name = "VERSION", help = "Package version")]
    pub pkg_version: String,

    #[arg(long, help = "Package release")]
    pub release: String,

    #[arg(
        long,
        value_name = "PHASE",
        value_parser = parse_phase,
        help = "Rebuild only up to this rpmbuild stage (prep, build, install, binary)"
    )]
    pub short_circuit: Option<Phase>,

    #[arg(long, help = "Always rebuild fully, even when only %files changed")]
    pub no_file_restart: bool,

    #[arg(long, help = "Remove the mock chroot after each build")]
    pub cleanup: bool,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    #[arg(value_name = "PATH", required = true, help = "Absolute install paths")]
    pub paths: Vec<String>,

    #[arg(long, help = "Package name")]
    pub name: String,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory containing specloop.toml (defaults to current directory)"
    )]
    pub options_dir: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(value_name = "BUILD_LOG", help = "Build log to scan")]
    pub build_log: PathBuf,

    #[arg(long, value_name = "FILE", help = "Root log to scan first")]
    pub root_log: Option<PathBuf>,

    #[arg(long, help = "Package name")]
    pub name: String,

    #[arg(long = "version", value_name = "VERSION", help = "Package version")]
    pub pkg_version: String,

    #[arg(long, help = "Package release")]
    pub release: String,

    #[arg(
        long,
        value_name = "PHASE",
        value_parser = parse_phase,
        default_value = "full",
        help = "Phase the log was produced in"
    )]
    pub phase: Phase,

    #[arg(
        long,
        value_name = "CODE",
        default_value = "0",
        allow_hyphen_values = true,
        help = "Exit code the build tool returned"
    )]
    pub return_code: i32,

    #[arg(
        long,
        value_name = "DIR",
        help = "Directory containing specloop.toml (defaults to current directory)"
    )]
    pub options_dir: Option<PathBuf>,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

fn parse_phase(s: &str) -> Result<Phase, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_args_verify() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_build_defaults() {
        let args = CliArgs::parse_from([
            "specloop", "build", "--name", "foo", "--version", "1.2", "--release", "3",
        ]);
        match args.command {
            Commands::Build(build) => {
                assert!(build.package_dir.is_none());
                assert_eq!(build.name, "foo");
                assert_eq!(build.pkg_version, "1.2");
                assert_eq!(build.release, "3");
                assert!(build.short_circuit.is_none());
                assert!(!build.no_file_restart);
                assert!(!build.cleanup);
                assert_eq!(build.format, OutputFormatArg::Human);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_build_with_options() {
        let args = CliArgs::parse_from([
            "specloop",
            "build",
            "/tmp/foo",
            "--name",
            "foo",
            "--version",
            "1.2",
            "--release",
            "3",
            "--short-circuit",
            "install",
            "--no-file-restart",
            "--cleanup",
            "--format",
            "json",
        ]);
        match args.command {
            Commands::Build(build) => {
                assert_eq!(build.package_dir, Some(PathBuf::from("/tmp/foo")));
                assert_eq!(build.short_circuit, Some(Phase::Install));
                assert!(build.no_file_restart);
                assert!(build.cleanup);
                assert_eq!(build.format, OutputFormatArg::Json);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_invalid_short_circuit() {
        let result = CliArgs::try_parse_from([
            "specloop",
            "build",
            "--name",
            "foo",
            "--version",
            "1",
            "--release",
            "1",
            "--short-circuit",
            "clean",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_classify_paths() {
        let args = CliArgs::parse_from([
            "specloop",
            "classify",
            "--name",
            "foo",
            "/usr/bin/foo",
            "/usr/lib64/libfoo.so",
        ]);
        match args.command {
            Commands::Classify(classify) => {
                assert_eq!(classify.paths, vec!["/usr/bin/foo", "/usr/lib64/libfoo.so"]);
                assert_eq!(classify.name, "foo");
            }
            _ => panic!("Expected Classify command"),
        }
    }

    #[test]
    fn test_scan_defaults() {
        let args = CliArgs::parse_from([
            "specloop",
            "scan",
            "build.log",
            "--name",
            "foo",
            "--version",
            "1",
            "--release",
            "1",
        ]);
        match args.command {
            Commands::Scan(scan) => {
                assert_eq!(scan.phase, Phase::Full);
                assert_eq!(scan.return_code, 0);
                assert!(scan.root_log.is_none());
            }
            _ => panic!("Expected Scan command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = CliArgs::parse_from(["specloop", "-v", "config"]);
        assert!(args.verbose);
        assert!(!args.quiet);

        let args = CliArgs::parse_from(["specloop", "--log-level", "debug", "config"]);
        assert_eq!(args.log_level, Some("debug".to_string()));
    }
}
