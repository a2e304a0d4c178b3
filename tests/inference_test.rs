//! Requirement inference integration tests
//!
//! Covers:
//! - Configured failed-command mappings and their rebuild signal
//! - pkg-config requirements, with and without 32-bit builds
//! - Phase gating of inference and of the rebuild signal
//! - Extra patterns loaded from options

use specloop::build::Phase;
use specloop::patterns::PatternLibrary;
use specloop::{PackagingOptions, RequirementInferer, RequirementSet};
use yare::parameterized;

fn inferer_with_libfoo(phase: Phase) -> RequirementInferer {
    let options = PackagingOptions::from_toml_str(
        r#"
[failed_commands]
LIBFOO = "libfoo-devel"
"#,
    )
    .unwrap();
    RequirementInferer::new(options.pattern_library().unwrap(), phase)
}

#[test]
fn test_failed_command_signal_then_quiet() {
    let mut inferer = inferer_with_libfoo(Phase::Full);
    let mut reqs = RequirementSet::new();

    let first = inferer.observe("checking for LIBFOO... not found", &mut reqs);
    assert!(reqs.contains("libfoo-devel"));
    assert_eq!(first.new_requirements, 1);
    assert_eq!(first.must_restart, 1);

    let second = inferer.observe("checking for LIBFOO... not found", &mut reqs);
    assert_eq!(second.new_requirements, 0);
    assert_eq!(second.must_restart, 0);
    assert_eq!(reqs.len(), 1);
}

#[test]
fn test_pkgconfig_requirement() {
    let mut inferer = RequirementInferer::new(PatternLibrary::with_defaults(), Phase::Full);
    let mut reqs = RequirementSet::new();

    let signal = inferer.observe("No package 'zlib' found", &mut reqs);

    assert_eq!(signal.new_requirements, 1);
    assert!(reqs.contains("pkgconfig(zlib)"));
}

#[test]
fn test_pkgconfig_requirement_with_32bit() {
    let mut inferer = RequirementInferer::new(PatternLibrary::with_defaults(), Phase::Full);
    let mut reqs = RequirementSet::with_32bit(true);

    let signal = inferer.observe("No package 'zlib' found", &mut reqs);

    assert_eq!(signal.new_requirements, 2);
    assert!(reqs.contains("pkgconfig(zlib)"));
    assert!(reqs.contains("pkgconfig(32zlib)"));
}

#[parameterized(
    full = { Phase::Full, 1, 1 },
    build = { Phase::Build, 1, 0 },
    install = { Phase::Install, 1, 0 },
    prep = { Phase::Prep, 0, 0 },
    binary = { Phase::Binary, 0, 0 },
)]
fn test_phase_gating(phase: Phase, new_requirements: usize, must_restart: usize) {
    let mut inferer = inferer_with_libfoo(phase);
    let mut reqs = RequirementSet::new();

    let signal = inferer.observe("checking for LIBFOO... not found", &mut reqs);

    assert_eq!(signal.new_requirements, new_requirements);
    assert_eq!(signal.must_restart, must_restart);
    assert_eq!(reqs.len(), new_requirements);
}

#[test]
fn test_unknown_token_adds_nothing() {
    let mut inferer = RequirementInferer::new(PatternLibrary::with_defaults(), Phase::Full);
    let mut reqs = RequirementSet::new();

    let signal = inferer.observe("checking for frobnicator-9000... not found", &mut reqs);

    assert_eq!(signal.new_requirements, 0);
    assert!(reqs.is_empty());
}

#[test]
fn test_extra_simple_pattern_from_options() {
    let options = PackagingOptions::from_toml_str(
        r#"
[[patterns.simple]]
pattern = "ninja: command is missing"
requirement = "ninja"
"#,
    )
    .unwrap();
    let mut inferer = RequirementInferer::new(options.pattern_library().unwrap(), Phase::Full);
    let mut reqs = RequirementSet::new();

    let signal = inferer.observe("error: ninja: command is missing", &mut reqs);

    assert_eq!(signal.must_restart, 1);
    assert!(reqs.contains("ninja"));
}

#[test]
fn test_invalid_extra_pattern_is_rejected() {
    let options = PackagingOptions::from_toml_str(
        r#"
[[patterns.simple]]
pattern = "unclosed ("
requirement = "nothing"
"#,
    )
    .unwrap();

    assert!(options.pattern_library().is_err());
}
