//! Output formatting for multiple formats
//!
//! Reports are printed as JSON, YAML or human-readable text. The `%files`
//! fragment itself is always rendered the way the spec writer consumes it.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::build::{ConvergeReport, RoundOutcome};
use crate::config::SpecloopConfig;
use crate::files::{Classification, FileAssignment};
use crate::output::render_files_sections;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

/// One classified path
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedPath {
    pub path: String,
    pub classification: Classification,
}

/// Everything a standalone log scan learned
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub outcome: RoundOutcome,
    pub requirements: Vec<String>,
    pub files: FileAssignment,
}

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\n";

/// Output formatter for specloop reports
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Machine-readable rendering; `None` for human output
    fn serialize<T: Serialize>(&self, value: &T, what: &str) -> Option<Result<String>> {
        match self.format {
            OutputFormat::Json => Some(
                serde_json::to_string_pretty(value)
                    .with_context(|| format!("Failed to serialize {} to JSON", what)),
            ),
            OutputFormat::Yaml => Some(
                serde_yaml::to_string(value)
                    .with_context(|| format!("Failed to serialize {} to YAML", what)),
            ),
            OutputFormat::Human => None,
        }
    }

    /// Formats the result of a convergence run
    pub fn format_build(&self, report: &ConvergeReport) -> Result<String> {
        if let Some(output) = self.serialize(report, "build report") {
            return output;
        }

        let mut output = String::new();
        if report.success {
            output.push_str(&format!("\u{2713} {} converged\n", report.package));
        } else {
            output.push_str(&format!("\u{2717} {} did not converge\n", report.package));
        }
        output.push_str(RULE);
        output.push_str(&format!("Rounds:  {}\n", report.rounds));
        output.push_str(&format!("Phase:   {}\n\n", report.phase));
        output.push_str(&format_requirements(&report.requirements));
        output.push('\n');
        output.push_str(&render_files_sections(&report.files));
        Ok(output)
    }

    /// Formats classifier decisions followed by the resulting `%files` sections
    pub fn format_classification(
        &self,
        classified: &[ClassifiedPath],
        files: &FileAssignment,
    ) -> Result<String> {
        let value = serde_json::json!({
            "paths": classified,
            "files": files,
        });
        if let Some(output) = self.serialize(&value, "classification") {
            return output;
        }

        let mut output = String::new();
        for item in classified {
            output.push_str(&format!("{:<50} {}\n", item.path, describe(&item.classification)));
        }
        output.push('\n');
        output.push_str(&render_files_sections(files));
        Ok(output)
    }

    /// Formats a standalone log scan
    pub fn format_scan(&self, report: &ScanReport) -> Result<String> {
        if let Some(output) = self.serialize(report, "scan report") {
            return output;
        }

        let outcome = &report.outcome;
        let mut output = String::new();
        output.push_str("Scan Result\n");
        output.push_str(RULE);
        output.push_str(&format!("Success:              {}\n", outcome.success));
        output.push_str(&format!("Full rebuild events:  {}\n", outcome.must_restart));
        output.push_str(&format!("%files events:        {}\n", outcome.file_restart));
        if !outcome.unresolved_packages.is_empty() {
            output.push_str("\n\u{26A0} Unresolved installer packages:\n");
            for pkg in &outcome.unresolved_packages {
                output.push_str(&format!("  - {}\n", pkg));
            }
        }
        if !outcome.retracted_files.is_empty() {
            output.push_str("\nRetracted files:\n");
            for path in &outcome.retracted_files {
                output.push_str(&format!("  - {}\n", path));
            }
        }
        output.push('\n');
        output.push_str(&format_requirements(&report.requirements));
        output.push('\n');
        output.push_str(&render_files_sections(&report.files));
        Ok(output)
    }

    /// Formats configuration display
    pub fn format_config(&self, config: &SpecloopConfig) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&config.to_display_map())
                .context("Failed to serialize config to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&config.to_display_map())
                .context("Failed to serialize config to YAML"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }
}

fn format_requirements(requirements: &[String]) -> String {
    if requirements.is_empty() {
        return "Build requirements: (none)\n".to_string();
    }
    let mut output = String::from("Build requirements:\n");
    for (i, req) in requirements.iter().enumerate() {
        let connector = if i == requirements.len() - 1 {
            "\u{2514}"
        } else {
            "\u{251C}"
        };
        output.push_str(&format!("{}\u{2500} {}\n", connector, req));
    }
    output
}

fn describe(classification: &Classification) -> String {
    match classification {
        Classification::Skipped => "skipped".to_string(),
        Classification::Locale { language, new } => {
            if *new {
                format!("locale {} (new)", language)
            } else {
                format!("locale {}", language)
            }
        }
        Classification::Excluded { reason } => format!("excluded ({:?})", reason),
        Classification::Assigned { assignments } if assignments.is_empty() => {
            "already listed".to_string()
        }
        Classification::Assigned { assignments } => assignments
            .iter()
            .map(|a| format!("{} \u{2192} {}", a.bucket, a.entry))
            .collect::<Vec<_>>()
            .join(", "),
        Classification::Banned => "banned".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Phase;
    use crate::files::{Assignment, ExcludeReason};

    fn report() -> ConvergeReport {
        let mut files = FileAssignment::default();
        files
            .packages
            .entry("bin".to_string())
            .or_default()
            .insert("/usr/bin/foo".to_string());
        ConvergeReport {
            package: "foo-1.0-1".to_string(),
            rounds: 2,
            phase: Phase::Full,
            success: true,
            requirements: vec!["bison".to_string(), "pkgconfig(zlib)".to_string()],
            files,
        }
    }

    #[test]
    fn test_build_human() {
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_build(&report())
            .unwrap();
        assert!(output.contains("foo-1.0-1 converged"));
        assert!(output.contains("Rounds:  2"));
        assert!(output.contains("\u{2514}\u{2500} pkgconfig(zlib)"));
        assert!(output.contains("%files bin"));
    }

    #[test]
    fn test_build_json() {
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_build(&report())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["rounds"], 2);
        assert_eq!(value["phase"], "full");
    }

    #[test]
    fn test_build_yaml() {
        let output = OutputFormatter::new(OutputFormat::Yaml)
            .format_build(&report())
            .unwrap();
        assert!(output.contains("package: foo-1.0-1"));
    }

    #[test]
    fn test_classification_human() {
        let classified = vec![
            ClassifiedPath {
                path: "/usr/bin/foo".to_string(),
                classification: Classification::Assigned {
                    assignments: vec![Assignment {
                        bucket: "bin".to_string(),
                        entry: "/usr/bin/foo".to_string(),
                        subpackage: false,
                    }],
                },
            },
            ClassifiedPath {
                path: "/usr/lib32/libfoo.so".to_string(),
                classification: Classification::Excluded {
                    reason: ExcludeReason::Compat,
                },
            },
        ];
        let output = OutputFormatter::new(OutputFormat::Human)
            .format_classification(&classified, &FileAssignment::default())
            .unwrap();
        assert!(output.contains("bin \u{2192} /usr/bin/foo"));
        assert!(output.contains("excluded (Compat)"));
    }

    #[test]
    fn test_scan_json() {
        let scan = ScanReport {
            outcome: RoundOutcome {
                must_restart: 1,
                ..RoundOutcome::default()
            },
            requirements: vec!["libfoo-devel".to_string()],
            files: FileAssignment::default(),
        };
        let output = OutputFormatter::new(OutputFormat::Json)
            .format_scan(&scan)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["outcome"]["must_restart"], 1);
        assert_eq!(value["requirements"][0], "libfoo-devel");
    }
}
