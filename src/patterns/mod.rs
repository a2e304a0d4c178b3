//! Pattern library - ordered regex tables mapping build diagnostics to requirements
//!
//! Four independent tables are consulted for every log line:
//!
//! - `simple`: a match implies a plain requirement
//! - `pkgconfig`: a match implies a pkg-config requirement
//! - `failed`: the first capture group is handed to a [`Resolver`]
//! - `failed_exit`: a match is only echoed as a warning
//!
//! Within each table the first matching pattern wins.

mod cleanup;
pub mod defaults;
mod resolver;

pub use cleanup::cleanup_token;
pub use resolver::{ResolveError, ResolveOutcome, Resolver, ResolverTables};

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("Pattern '{0}' needs exactly one capture group")]
    MissingCapture(String),
}

/// A compiled pattern and the action it implies
#[derive(Debug, Clone)]
pub struct LogPattern<A> {
    regex: Regex,
    action: A,
}

impl<A> LogPattern<A> {
    pub fn new(pattern: &str, action: A) -> Result<Self, PatternError> {
        let regex = Regex::new(pattern).map_err(|source| PatternError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { regex, action })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch<'a, A> {
    pub action: &'a A,
    /// First capture group, when the pattern has one and it participated
    pub captured: Option<&'a str>,
}

/// Ordered table of patterns; the first match wins
#[derive(Debug, Clone)]
pub struct PatternTable<A> {
    patterns: Vec<LogPattern<A>>,
}

impl<A> Default for PatternTable<A> {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }
}

impl<A> PatternTable<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pattern: &str, action: A) -> Result<(), PatternError> {
        self.patterns.push(LogPattern::new(pattern, action)?);
        Ok(())
    }

    pub fn first_match<'a>(&'a self, line: &'a str) -> Option<PatternMatch<'a, A>> {
        self.patterns.iter().find_map(|p| {
            p.regex.captures(line).map(|caps| PatternMatch {
                action: &p.action,
                captured: caps.get(1).map(|m| m.as_str()),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogPattern<A>> {
        self.patterns.iter()
    }
}

/// The four pattern tables plus the lookup tables their resolvers use
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    pub simple: PatternTable<String>,
    pub pkgconfig: PatternTable<String>,
    pub failed: PatternTable<Resolver>,
    pub failed_exit: PatternTable<()>,
    pub tables: ResolverTables,
}

impl PatternLibrary {
    /// Empty library with no patterns and empty lookup tables
    pub fn new() -> Self {
        Self {
            simple: PatternTable::new(),
            pkgconfig: PatternTable::new(),
            failed: PatternTable::new(),
            failed_exit: PatternTable::new(),
            tables: ResolverTables::default(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut library = Self::new();

        for (pattern, req) in defaults::SIMPLE_PATTERNS {
            library
                .simple
                .push(pattern, (*req).to_string())
                .expect("valid built-in pattern");
        }
        for (pattern, module) in defaults::PKGCONFIG_PATTERNS {
            library
                .pkgconfig
                .push(pattern, (*module).to_string())
                .expect("valid built-in pattern");
        }
        for (pattern, resolver) in defaults::FAILED_PATTERNS {
            library
                .failed
                .push(pattern, *resolver)
                .expect("valid built-in pattern");
        }
        for pattern in defaults::FAILED_EXIT_PATTERNS {
            library
                .failed_exit
                .push(pattern, ())
                .expect("valid built-in pattern");
        }

        let tables = &mut library.tables;
        tables.failed_commands.extend(
            defaults::FAILED_COMMANDS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        tables
            .ignored
            .extend(defaults::IGNORED_COMMANDS.iter().map(|s| s.to_string()));
        tables.gems.extend(
            defaults::GEMS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        tables.pypi_translations.extend(
            defaults::PYPI_TRANSLATIONS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );

        library
    }

    /// Append a `failed` pattern; the pattern must capture the token.
    pub fn push_failed(&mut self, pattern: &str, resolver: Resolver) -> Result<(), PatternError> {
        let compiled = LogPattern::new(pattern, resolver)?;
        if compiled.regex.captures_len() < 2 {
            return Err(PatternError::MissingCapture(pattern.to_string()));
        }
        self.failed.patterns.push(compiled);
        Ok(())
    }
}

impl Default for PatternLibrary {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_compile_and_populate() {
        let library = PatternLibrary::with_defaults();
        assert_eq!(library.simple.len(), defaults::SIMPLE_PATTERNS.len());
        assert_eq!(library.pkgconfig.len(), defaults::PKGCONFIG_PATTERNS.len());
        assert_eq!(library.failed.len(), defaults::FAILED_PATTERNS.len());
        assert!(!library.tables.failed_commands.is_empty());
        assert!(library.tables.ignored.contains("gcc"));
    }

    #[test]
    fn test_failed_patterns_all_capture() {
        let library = PatternLibrary::with_defaults();
        for pattern in library.failed.iter() {
            assert!(
                pattern.regex.captures_len() >= 2,
                "{} has no capture group",
                pattern.as_str()
            );
        }
    }

    #[test]
    fn test_first_match_wins() {
        let mut table = PatternTable::new();
        table.push(r"checking for (\w+)", "first").unwrap();
        table.push(r"checking for (\w+)\.\.\. no", "second").unwrap();

        let m = table.first_match("checking for foo... no").unwrap();
        assert_eq!(*m.action, "first");
        assert_eq!(m.captured, Some("foo"));
    }

    #[test]
    fn test_no_match() {
        let library = PatternLibrary::with_defaults();
        assert!(library.failed.first_match("gcc -O2 -c foo.c").is_none());
        assert!(library.simple.first_match("gcc -O2 -c foo.c").is_none());
    }

    #[test]
    fn test_default_failed_capture() {
        let library = PatternLibrary::with_defaults();
        let m = library
            .failed
            .first_match("checking for LIBFOO... not found")
            .unwrap();
        assert_eq!(*m.action, Resolver::FailedCommand);
        assert_eq!(m.captured, Some("LIBFOO"));

        let m = library
            .failed
            .first_match("No package 'gtk+-3.0' found")
            .unwrap();
        assert_eq!(*m.action, Resolver::PkgConfig);
        assert_eq!(m.captured, Some("gtk+-3.0"));
    }

    #[test]
    fn test_push_failed_requires_capture() {
        let mut library = PatternLibrary::new();
        assert!(matches!(
            library.push_failed("no group here", Resolver::PkgConfig),
            Err(PatternError::MissingCapture(_))
        ));
        assert!(library.push_failed("needs (\\w+)", Resolver::PkgConfig).is_ok());
    }

    #[test]
    fn test_invalid_pattern() {
        let mut table: PatternTable<()> = PatternTable::new();
        assert!(matches!(
            table.push("unclosed (", ()),
            Err(PatternError::InvalidPattern { .. })
        ));
    }
}
