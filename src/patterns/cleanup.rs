//! Normalization of tokens captured from configure/cmake diagnostics

/// Phrases that mark a captured token as a sentence rather than a name
const DISCARD_MARKERS: &[&str] = &["is wanted", "should be defined", "are broken", "is broken"];

/// Stray words configure scripts wrap around the interesting token.
/// Applied in order; longer phrases come before their suffixes.
const STRAY_FRAGMENTS: &[&str] = &[
    " works as expected",
    " and usability",
    " usability",
    " argument",
    " environment variable",
    " environment var",
    " presence",
    " support",
    " implementation is broken",
    " is broken",
    " files can be found",
    " can be found",
    " is declared",
    "whether to build ",
    "whether ",
    "library containing ",
    "x86_64-generic-linux-gnu-",
    "i686-generic-linux-gnu-",
];

/// Normalize a captured token before it is resolved to a requirement.
///
/// Returns an empty string when the token is a sentence fragment that cannot
/// name a package.
pub fn cleanup_token(raw: &str) -> String {
    if DISCARD_MARKERS.iter().any(|m| raw.contains(m)) {
        return String::new();
    }

    let mut token = raw.strip_prefix("for ").unwrap_or(raw).to_string();
    for fragment in STRAY_FRAGMENTS {
        if token.contains(fragment) {
            token = token.replace(fragment, "");
        }
    }

    token.replace('\'', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        plain = { "libfoo", "libfoo" },
        leading_for = { "for bison", "bison" },
        usability = { "zlib.h usability", "zlib.h" },
        and_usability = { "zlib.h and usability", "zlib.h" },
        presence = { "zlib.h presence", "zlib.h" },
        support = { "gettext support", "gettext" },
        whether = { "whether libtool", "libtool" },
        whether_to_build = { "whether to build shared", "shared" },
        library_containing = { "library containing dlopen", "dlopen" },
        triplet = { "x86_64-generic-linux-gnu-pkg-config", "pkg-config" },
        triplet_32 = { "i686-generic-linux-gnu-gcc", "gcc" },
        quotes = { "'glib-2.0'", "glib-2.0" },
        env_var = { "PYTHON environment variable", "PYTHON" },
        can_be_found = { "Qt5 files can be found", "Qt5" },
        whitespace = { "  flex  ", "flex" },
    )]
    fn test_cleanup(raw: &str, expected: &str) {
        assert_eq!(cleanup_token(raw), expected);
    }

    #[parameterized(
        wanted = { "threads is wanted" },
        defined = { "FOO should be defined" },
        are_broken = { "headers are broken" },
        is_broken = { "the compiler is broken" },
    )]
    fn test_sentences_are_discarded(raw: &str) {
        assert_eq!(cleanup_token(raw), "");
    }
}
