//! Subcommand handlers; each returns the process exit code

use super::commands::{BuildArgs, ClassifyArgs, ConfigArgs, ScanArgs};
use super::output::{ClassifiedPath, OutputFormatter, ScanReport};
use crate::build::{BuildOrchestrator, LogScanner};
use crate::config::{PackageIdentity, PackagingOptions, SpecloopConfig};
use crate::inference::RequirementInferer;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

fn current_dir_or(dir: Option<&PathBuf>) -> PathBuf {
    dir.cloned().unwrap_or_else(|| PathBuf::from("."))
}

fn load_options(dir: &Path) -> Result<PackagingOptions> {
    PackagingOptions::load(dir)
        .with_context(|| format!("Failed to load packaging options from {}", dir.display()))
}

fn print_or_fail(output: Result<String>) -> i32 {
    match output {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            error!("Failed to format output: {:#}", e);
            1
        }
    }
}

pub async fn handle_build(args: &BuildArgs) -> i32 {
    match run_build(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("FATAL: {:#}", e);
            1
        }
    }
}

async fn run_build(args: &BuildArgs) -> Result<i32> {
    let package_dir = current_dir_or(args.package_dir.as_ref());
    let mut config = SpecloopConfig::default();
    if args.no_file_restart {
        config.file_restart = false;
    }
    if args.cleanup {
        config.cleanup = true;
    }
    config.validate().context("Invalid configuration")?;

    let options = load_options(&package_dir)?;
    let identity = PackageIdentity::new(&args.name, &args.pkg_version, &args.release);
    info!("Converging {} in {}", identity.nvr(), package_dir.display());

    let mut orchestrator = BuildOrchestrator::new(&package_dir, identity, &config, &options)
        .context("Failed to set up the build")?;
    if let Some(phase) = args.short_circuit {
        orchestrator = orchestrator.with_phase(phase);
    }

    let report = orchestrator.converge().await?;
    Ok(print_or_fail(
        OutputFormatter::new(args.format.into()).format_build(&report),
    ))
}

pub fn handle_classify(args: &ClassifyArgs) -> i32 {
    match run_classify(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

fn run_classify(args: &ClassifyArgs) -> Result<i32> {
    let options = load_options(&current_dir_or(args.options_dir.as_ref()))?;
    let mut classifier = options
        .classifier(&args.name)
        .context("Failed to build the file classifier")?;

    let classified: Vec<ClassifiedPath> = args
        .paths
        .iter()
        .map(|path| ClassifiedPath {
            path: path.clone(),
            classification: classifier.classify(path),
        })
        .collect();

    Ok(print_or_fail(
        OutputFormatter::new(args.format.into()).format_classification(&classified, classifier.state()),
    ))
}

pub fn handle_scan(args: &ScanArgs) -> i32 {
    match run_scan(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    }
}

fn read_lossy(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn run_scan(args: &ScanArgs) -> Result<i32> {
    let options = load_options(&current_dir_or(args.options_dir.as_ref()))?;
    let identity = PackageIdentity::new(&args.name, &args.pkg_version, &args.release);

    let build_log = read_lossy(&args.build_log)?;
    let root_log = match &args.root_log {
        Some(path) => read_lossy(path)?,
        None => String::new(),
    };

    let mut inferer = RequirementInferer::new(
        options
            .pattern_library()
            .context("Failed to build the pattern library")?,
        args.phase,
    );
    let mut requirements = options.requirement_set();
    let mut classifier = options
        .classifier(&identity.name)
        .context("Failed to build the file classifier")?;

    let outcome = LogScanner::new(
        &mut inferer,
        &mut requirements,
        &mut classifier,
        &identity,
        args.phase,
    )
    .scan(&root_log, &build_log, args.return_code);

    let report = ScanReport {
        outcome,
        requirements: requirements.iter().map(str::to_string).collect(),
        files: classifier.into_state(),
    };
    Ok(print_or_fail(
        OutputFormatter::new(args.format.into()).format_scan(&report),
    ))
}

pub fn handle_config(args: &ConfigArgs) -> i32 {
    let config = SpecloopConfig::default();
    if let Err(e) = config.validate() {
        error!("{}", e);
        return 1;
    }
    print_or_fail(OutputFormatter::new(args.format.into()).format_config(&config))
}
