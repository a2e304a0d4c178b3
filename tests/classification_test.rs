//! File classification integration tests
//!
//! Covers:
//! - Repeat classification of the same path
//! - First-match ordering in the generic table
//! - Package-specific tables taking precedence
//! - Locale discovery and deduplication
//! - Compat and 32-bit-only vetoes, alone and combined
//! - Rendering of the resulting `%files` sections

use specloop::files::{ClassifierPolicy, ExcludeReason};
use specloop::output::render_files_sections;
use specloop::{Classification, FileClassifier, PackagingOptions};
use yare::parameterized;

fn classifier(name: &str) -> FileClassifier {
    FileClassifier::new(name, ClassifierPolicy::default()).unwrap()
}

fn classifier_with(name: &str, policy: ClassifierPolicy) -> FileClassifier {
    FileClassifier::new(name, policy).unwrap()
}

fn bucket_of(classification: &Classification) -> Option<String> {
    match classification {
        Classification::Assigned { assignments } => assignments.first().map(|a| a.bucket.clone()),
        _ => None,
    }
}

#[test]
fn test_classifying_twice_adds_nothing() {
    let mut c = classifier("foo");

    let first = c.classify("/usr/bin/foo");
    assert_eq!(first.file_events(), 1);

    let second = c.classify("/usr/bin/foo");
    assert_eq!(second, Classification::Skipped);
    assert_eq!(second.file_events(), 0);
    assert_eq!(c.state().packages["bin"].len(), 1);
}

#[test]
fn test_shared_replacement_entry_counts_once() {
    let mut c = classifier("foo");

    let first = c.classify("/usr/lib/python3.11/site-packages/foo/__init__.py");
    let second = c.classify("/usr/lib/python3.11/site-packages/foo/core.py");

    assert_eq!(first.file_events(), 1);
    assert_eq!(second.file_events(), 0);
    assert_eq!(
        c.state().packages["python3"].iter().collect::<Vec<_>>(),
        vec!["/usr/lib/python3*/*"]
    );
}

#[parameterized(
    man_before_data = { "/usr/share/man/man1/foo.1", "man" },
    info_before_data = { "/usr/share/info/foo.info", "info" },
    versioned_lib = { "/usr/lib64/libfoo.so.1.2.3", "lib" },
    libexec = { "/usr/libexec/foo-helper", "libexec" },
    header = { "/usr/include/foo.h", "dev" },
    plain_data = { "/usr/share/foo/data.db", "data" },
    fallback = { "/etc/foo.conf", "main" },
)]
fn test_generic_first_match(path: &str, expected: &str) {
    let mut c = classifier("foo");
    let result = c.classify(path);
    assert_eq!(bucket_of(&result).as_deref(), Some(expected));
}

#[parameterized(
    libgcc = { "/usr/lib64/libgcc_s.so.1", "libgcc1" },
    libstdcxx = { "/usr/lib64/libstdc++.so.6", "libstdc++" },
)]
fn test_package_table_wins_for_gcc(path: &str, expected: &str) {
    let mut gcc = classifier("gcc");
    let result = gcc.classify(path);
    assert_eq!(bucket_of(&result).as_deref(), Some(expected));
    assert!(gcc.state().subpackages.contains_key(expected));

    let mut other = classifier("foo");
    let result = other.classify(path);
    assert_eq!(bucket_of(&result).as_deref(), Some("lib"));
}

#[test]
fn test_unversioned_so_follows_policy() {
    let mut dev = classifier("foo");
    assert_eq!(bucket_of(&dev.classify("/usr/lib64/libfoo.so.1.2.3")).as_deref(), Some("lib"));
    assert_eq!(bucket_of(&dev.classify("/usr/lib64/libfoo.so")).as_deref(), Some("dev"));

    let mut lib = classifier_with(
        "foo",
        ClassifierPolicy {
            so_to_lib: true,
            ..ClassifierPolicy::default()
        },
    );
    assert_eq!(bucket_of(&lib.classify("/usr/lib64/libfoo.so")).as_deref(), Some("lib"));
}

#[test]
fn test_locale_is_recorded_not_bucketed() {
    let mut c = classifier("foo");

    let result = c.classify("/usr/share/locale/pt_BR/LC_MESSAGES/foo.mo");

    assert_eq!(
        result,
        Classification::Locale {
            language: "pt_BR".to_string(),
            new: true
        }
    );
    assert_eq!(c.state().locales, vec!["pt_BR"]);
    assert_eq!(c.state().entry_count(), 0);
}

#[test]
fn test_same_language_counted_once() {
    let mut c = classifier("foo");

    let first = c.classify("/usr/share/locale/de/LC_MESSAGES/foo.mo");
    let second = c.classify("/usr/share/locale/de/LC_MESSAGES/foo-extra.mo");

    assert!(first.new_locale());
    assert!(!second.new_locale());
    assert_eq!(c.state().locales, vec!["de"]);
}

#[test]
fn test_excluded_locales() {
    let mut c = classifier_with(
        "foo",
        ClassifierPolicy {
            exclude_locales: true,
            ..ClassifierPolicy::default()
        },
    );

    let result = c.classify("/usr/share/locale/fr/LC_MESSAGES/foo.mo");

    assert_eq!(
        result,
        Classification::Excluded {
            reason: ExcludeReason::Locale
        }
    );
    assert!(c.state().locales.is_empty());
}

#[parameterized(
    compat_keeps_versioned = { true, false, "/usr/lib64/libfoo.so.1", None },
    compat_drops_binary = { true, false, "/usr/bin/foo", Some(ExcludeReason::Compat) },
    only32_keeps_lib32 = { false, true, "/usr/lib32/libfoo.so.1", None },
    only32_drops_lib64 = { false, true, "/usr/lib64/libfoo.so.1", Some(ExcludeReason::Only32Bit) },
    both_keep_lib32 = { true, true, "/usr/lib32/libfoo.so.1", None },
    both_compat_rejects_first = { true, true, "/usr/bin/foo", Some(ExcludeReason::Compat) },
    both_only32_rejects = { true, true, "/usr/lib64/libfoo.so.1", Some(ExcludeReason::Only32Bit) },
)]
fn test_vetoes(compat: bool, only_32bit: bool, path: &str, expected: Option<ExcludeReason>) {
    let mut c = classifier_with(
        "foo",
        ClassifierPolicy {
            compat,
            only_32bit,
            ..ClassifierPolicy::default()
        },
    );

    let result = c.classify(path);

    match expected {
        Some(reason) => {
            assert_eq!(result, Classification::Excluded { reason });
            assert!(c.state().excludes.contains(&path.to_string()));
        }
        None => assert_eq!(result.file_events(), 1),
    }
}

#[test]
fn test_options_drive_classifier() {
    let options = PackagingOptions::from_toml_str(
        r#"
excludes = ["/usr/bin/foo-debug"]
setuid = ["/usr/bin/foo-su"]

[file_maps]
extras = ["/usr/share/foo/extra.dat"]
"#,
    )
    .unwrap();
    let mut c = options.classifier("foo").unwrap();

    assert_eq!(
        c.classify("/usr/bin/foo-debug"),
        Classification::Excluded {
            reason: ExcludeReason::Listed
        }
    );
    assert_eq!(bucket_of(&c.classify("/usr/bin/foo-su")).as_deref(), Some("setuid"));
    assert_eq!(
        bucket_of(&c.classify("/usr/share/foo/extra.dat")).as_deref(),
        Some("extras")
    );
}

#[test]
fn test_rendered_sections() {
    let mut c = classifier("foo");
    for path in [
        "/usr/bin/foo",
        "/usr/lib64/libfoo.so.1",
        "/usr/share/locale/de/LC_MESSAGES/foo.mo",
    ] {
        c.classify(path);
    }

    let rendered = render_files_sections(c.state());

    assert!(rendered.contains("%find_lang de\n"));
    assert!(rendered.contains("%files bin\n"));
    assert!(rendered.contains("/usr/bin/foo\n"));
    assert!(rendered.contains("%files lib\n"));
    assert!(rendered.contains("%files locales -f de.lang"));
}
