//! Resolution of captured tokens into build requirements

use super::cleanup::cleanup_token;
use crate::requirements::Requirement;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// How the token captured by a `failed` pattern turns into requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolver {
    /// Look the token up in the failed-commands table
    FailedCommand,
    PkgConfig,
    /// CRAN package, `R-<token>`
    R,
    /// Perl module, `perl(<token>)` with any `inc::` removed
    Perl,
    /// Python module through the translation table
    Pypi,
    /// Gem alias table with `rubygem-<token>` fallback
    Ruby,
    /// Gem alias table only
    RubyTable,
    /// ROS component: pkg-config module and plain package of the same name
    Catkin,
}

impl fmt::Display for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resolver::FailedCommand => "failed_command",
            Resolver::PkgConfig => "pkg_config",
            Resolver::R => "r",
            Resolver::Perl => "perl",
            Resolver::Pypi => "pypi",
            Resolver::Ruby => "ruby",
            Resolver::RubyTable => "ruby_table",
            Resolver::Catkin => "catkin",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("token is empty after cleanup")]
    Empty,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("unknown ruby gem: {0}")]
    UnknownGem(String),

    #[error("token cannot name a package: {0:?}")]
    Malformed(String),
}

impl ResolveError {
    /// The token the error is about, used to deduplicate warnings
    pub fn token(&self) -> &str {
        match self {
            ResolveError::Empty => "",
            ResolveError::UnknownCommand(t)
            | ResolveError::UnknownGem(t)
            | ResolveError::Malformed(t) => t,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveOutcome {
    Resolved(Vec<Requirement>),
    /// Token is on the ignore list
    Ignored,
    Unresolvable(ResolveError),
}

/// Lookup tables the resolvers consult
#[derive(Debug, Clone, Default)]
pub struct ResolverTables {
    pub failed_commands: BTreeMap<String, String>,
    pub ignored: BTreeSet<String>,
    pub gems: BTreeMap<String, String>,
    pub pypi_translations: BTreeMap<String, String>,
}

impl ResolverTables {
    fn translate<'a>(&'a self, name: &'a str) -> &'a str {
        self.pypi_translations
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    }
}

fn is_malformed(token: &str) -> bool {
    token.chars().any(|c| c.is_whitespace() || c.is_control())
}

impl Resolver {
    /// Clean up `raw` and map it to requirements.
    pub fn resolve(&self, raw: &str, tables: &ResolverTables) -> ResolveOutcome {
        let token = cleanup_token(raw);
        if tables.ignored.contains(&token) {
            return ResolveOutcome::Ignored;
        }
        if token.is_empty() {
            return ResolveOutcome::Unresolvable(ResolveError::Empty);
        }

        // Table lookups tolerate any token; name-building resolvers do not.
        let builds_name = !matches!(self, Resolver::FailedCommand | Resolver::RubyTable);
        if builds_name && is_malformed(&token) {
            return ResolveOutcome::Unresolvable(ResolveError::Malformed(token));
        }

        match self {
            Resolver::FailedCommand => match tables.failed_commands.get(&token) {
                Some(req) if !req.is_empty() => {
                    ResolveOutcome::Resolved(vec![Requirement::plain(req.clone())])
                }
                // Known command with no package behind it
                Some(_) => ResolveOutcome::Resolved(Vec::new()),
                None => ResolveOutcome::Unresolvable(ResolveError::UnknownCommand(token)),
            },
            Resolver::PkgConfig => ResolveOutcome::Resolved(vec![Requirement::pkgconfig(token)]),
            Resolver::R => ResolveOutcome::Resolved(vec![Requirement::plain(format!("R-{}", token))]),
            Resolver::Perl => {
                let module = token.replace("inc::", "");
                ResolveOutcome::Resolved(vec![Requirement::plain(format!("perl({})", module))])
            }
            Resolver::Pypi => {
                let name = tables.translate(&token);
                if name.is_empty() {
                    return ResolveOutcome::Unresolvable(ResolveError::Empty);
                }
                let python_name = format!("{}-python", name);
                let req = tables.translate(&python_name).to_string();
                ResolveOutcome::Resolved(vec![Requirement::plain(req)])
            }
            Resolver::Ruby => {
                let req = tables
                    .gems
                    .get(&token)
                    .cloned()
                    .unwrap_or_else(|| format!("rubygem-{}", token));
                ResolveOutcome::Resolved(vec![Requirement::plain(req)])
            }
            Resolver::RubyTable => match tables.gems.get(&token) {
                Some(req) => ResolveOutcome::Resolved(vec![Requirement::plain(req.clone())]),
                None => ResolveOutcome::Unresolvable(ResolveError::UnknownGem(token)),
            },
            Resolver::Catkin => ResolveOutcome::Resolved(vec![
                Requirement::pkgconfig(token.clone()),
                Requirement::plain(token),
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> ResolverTables {
        let mut tables = ResolverTables::default();
        tables
            .failed_commands
            .insert("LIBFOO".to_string(), "libfoo-devel".to_string());
        tables.failed_commands.insert("true".to_string(), String::new());
        tables.ignored.insert("gcc".to_string());
        tables
            .gems
            .insert("rspec".to_string(), "rubygem-rspec-core".to_string());
        tables
            .pypi_translations
            .insert("yaml".to_string(), "PyYAML".to_string());
        tables
    }

    #[test]
    fn test_failed_command_lookup() {
        let outcome = Resolver::FailedCommand.resolve("LIBFOO", &tables());
        assert_eq!(
            outcome,
            ResolveOutcome::Resolved(vec![Requirement::plain("libfoo-devel")])
        );
    }

    #[test]
    fn test_failed_command_unknown() {
        let outcome = Resolver::FailedCommand.resolve("frobnicate", &tables());
        assert_eq!(
            outcome,
            ResolveOutcome::Unresolvable(ResolveError::UnknownCommand("frobnicate".to_string()))
        );
    }

    #[test]
    fn test_failed_command_with_empty_mapping() {
        let outcome = Resolver::FailedCommand.resolve("true", &tables());
        assert_eq!(outcome, ResolveOutcome::Resolved(Vec::new()));
    }

    #[test]
    fn test_ignored_token() {
        assert_eq!(
            Resolver::FailedCommand.resolve("for gcc", &tables()),
            ResolveOutcome::Ignored
        );
    }

    #[test]
    fn test_empty_after_cleanup() {
        assert_eq!(
            Resolver::PkgConfig.resolve("threads is wanted", &tables()),
            ResolveOutcome::Unresolvable(ResolveError::Empty)
        );
    }

    #[test]
    fn test_pkgconfig_and_r() {
        assert_eq!(
            Resolver::PkgConfig.resolve("'gtk+-3.0'", &tables()),
            ResolveOutcome::Resolved(vec![Requirement::pkgconfig("gtk+-3.0")])
        );
        assert_eq!(
            Resolver::R.resolve("ggplot2", &tables()),
            ResolveOutcome::Resolved(vec![Requirement::plain("R-ggplot2")])
        );
    }

    #[test]
    fn test_perl_strips_inc() {
        assert_eq!(
            Resolver::Perl.resolve("inc::Module::Install", &tables()),
            ResolveOutcome::Resolved(vec![Requirement::plain("perl(Module::Install)")])
        );
    }

    #[test]
    fn test_pypi_translation() {
        assert_eq!(
            Resolver::Pypi.resolve("yaml", &tables()),
            ResolveOutcome::Resolved(vec![Requirement::plain("PyYAML-python")])
        );
        assert_eq!(
            Resolver::Pypi.resolve("requests", &tables()),
            ResolveOutcome::Resolved(vec![Requirement::plain("requests-python")])
        );
    }

    #[test]
    fn test_ruby_fallback_and_table() {
        assert_eq!(
            Resolver::Ruby.resolve("rake", &tables()),
            ResolveOutcome::Resolved(vec![Requirement::plain("rubygem-rake")])
        );
        assert_eq!(
            Resolver::Ruby.resolve("rspec", &tables()),
            ResolveOutcome::Resolved(vec![Requirement::plain("rubygem-rspec-core")])
        );
        assert_eq!(
            Resolver::RubyTable.resolve("rake", &tables()),
            ResolveOutcome::Unresolvable(ResolveError::UnknownGem("rake".to_string()))
        );
    }

    #[test]
    fn test_catkin_adds_both_forms() {
        assert_eq!(
            Resolver::Catkin.resolve("roscpp", &tables()),
            ResolveOutcome::Resolved(vec![
                Requirement::pkgconfig("roscpp"),
                Requirement::plain("roscpp"),
            ])
        );
    }

    #[test]
    fn test_malformed_token() {
        assert_eq!(
            Resolver::PkgConfig.resolve("two words", &tables()),
            ResolveOutcome::Unresolvable(ResolveError::Malformed("two words".to_string()))
        );
    }
}
