//! Ordered classification rules; the first matching rule wins

use regex::Regex;

/// Where a matching path goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dest {
    Bucket(&'static str),
    /// Unversioned shared object: `lib` with `so_to_lib`, else `dev`
    SharedObject,
    /// Same for the 32-bit tree: `lib32` or `dev32`
    SharedObject32,
    /// openmpi shared object: `openmpi` or `dev`
    SharedObjectMpi,
}

impl Dest {
    pub fn resolve(self, so_to_lib: bool) -> &'static str {
        match (self, so_to_lib) {
            (Dest::Bucket(name), _) => name,
            (Dest::SharedObject, true) => "lib",
            (Dest::SharedObject, false) => "dev",
            (Dest::SharedObject32, true) => "lib32",
            (Dest::SharedObject32, false) => "dev32",
            (Dest::SharedObjectMpi, true) => "openmpi",
            (Dest::SharedObjectMpi, false) => "dev",
        }
    }
}

/// Declarative form of a rule, as written in the tables below
#[derive(Debug, Clone, Copy)]
pub struct RuleSpec {
    pub pattern: &'static str,
    pub dest: Dest,
    pub replacement: Option<&'static str>,
    pub subpackage: bool,
}

impl RuleSpec {
    pub const fn new(pattern: &'static str, dest: Dest) -> Self {
        Self {
            pattern,
            dest,
            replacement: None,
            subpackage: false,
        }
    }

    pub const fn to(pattern: &'static str, bucket: &'static str) -> Self {
        Self::new(pattern, Dest::Bucket(bucket))
    }

    /// List `replacement` instead of the path itself
    pub const fn replaced_by(self, replacement: &'static str) -> Self {
        Self {
            replacement: Some(replacement),
            ..self
        }
    }

    /// Destination is an explicitly named sub-package (`%files -n`)
    pub const fn named(self) -> Self {
        Self {
            subpackage: true,
            ..self
        }
    }
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct ClassificationRule {
    pub pattern: Regex,
    pub destination: Dest,
    pub replacement: Option<String>,
    pub subpackage: bool,
}

impl ClassificationRule {
    pub fn compile(spec: &RuleSpec) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(spec.pattern)?,
            destination: spec.dest,
            replacement: spec.replacement.map(str::to_string),
            subpackage: spec.subpackage,
        })
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.is_match(path)
    }

    /// The entry written to the file list for `path`
    pub fn entry_for(&self, path: &str) -> String {
        self.replacement.clone().unwrap_or_else(|| path.to_string())
    }
}

/// An ordered list of compiled rules
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<ClassificationRule>,
}

impl RuleTable {
    pub fn compile(specs: &[RuleSpec]) -> Result<Self, regex::Error> {
        let rules = specs
            .iter()
            .map(ClassificationRule::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Generic table with the documentation rule for `package_name`
    pub fn generic(package_name: &str) -> Result<Self, regex::Error> {
        let mut table = Self::compile(GENERIC_HEAD)?;
        let escaped = regex::escape(package_name);
        table.rules.push(ClassificationRule {
            pattern: Regex::new(&format!(r"^/(usr/|usr.*)share/doc/{}/", escaped))?,
            destination: Dest::Bucket("doc"),
            replacement: Some(format!("%doc /usr/share/doc/{}/*", package_name)),
            subpackage: false,
        });
        table.rules.extend(Self::compile(GENERIC_TAIL)?.rules);
        Ok(table)
    }

    pub fn first_match(&self, path: &str) -> Option<&ClassificationRule> {
        self.rules.iter().find(|r| r.matches(path))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub const HEADER_SPLIT_PATTERN: &str = r"^/usr/.*/include/.*\.(h|hpp)$";

pub const AUTOSTART_PATTERN: &str = r"^/(usr/|usr.*)lib/systemd/system/.+\.target\.wants/.+";

pub const AUTOSTART_EXEMPT: &str = "update-triggers.target.wants";

const SO: Dest = Dest::SharedObject;
const SO32: Dest = Dest::SharedObject32;
const SO_MPI: Dest = Dest::SharedObjectMpi;

/// Generic rules up to the package documentation rule
const GENERIC_HEAD: &[RuleSpec] = &[
    RuleSpec::to(r"^/usr/lib/rpm[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*$", "main"),
    RuleSpec::to(r"^/(usr/|usr.*)share/package-licenses/.{1,}/.{1,}", "license"),
    RuleSpec::to(r"^/(usr/|usr.*)share/man/man2", "man"),
    RuleSpec::to(r"^/(usr/|usr.*)share/man/man3", "man"),
    RuleSpec::to(r"^/(usr/|usr.*)share/man/man\d", "man"),
    RuleSpec::to(r"^/(usr/|usr.*)share/man/", "man"),
    RuleSpec::to(r"^/(usr/|usr.*)share/pkgconfig/32.*\.pc$", "dev32"),
    RuleSpec::to(r"^/(usr/|usr.*)share/pkgconfig/", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)share/info/", "info"),
    RuleSpec::to(r"^/(usr/|usr.*)share/abi/", "abi"),
    RuleSpec::to(r"^/(usr/|usr.*)share/qt5/examples/", "examples"),
    RuleSpec::to(r"^/(usr/|usr.*)share/omf", "main").replaced_by("/usr/share/omf/*"),
    RuleSpec::to(r"^/(usr/|usr.*)share/installed-tests/", "tests"),
    RuleSpec::to(r"^/(usr/|usr.*)libexec/installed-tests/", "tests"),
    RuleSpec::to(r"^/usr/share/clear/optimized-elf/bin", "bin")
        .replaced_by("/usr/share/clear/optimized-elf/bin*"),
    RuleSpec::to(r"^/usr/share/clear/optimized-elf/exec", "libexec")
        .replaced_by("/usr/share/clear/optimized-elf/exec*"),
    RuleSpec::to(r"^/usr/share/clear/optimized-elf/lib", "lib")
        .replaced_by("/usr/share/clear/optimized-elf/lib*"),
    RuleSpec::to(r"^/usr/share/clear/optimized-elf/other", "lib")
        .replaced_by("/usr/share/clear/optimized-elf/other*"),
    RuleSpec::to(r"^/usr/share/clear/optimized-elf/test", "tests")
        .replaced_by("/usr/share/clear/optimized-elf/test*"),
    RuleSpec::to(r"^/usr/share/clear/optimized-elf/", "lib"),
    RuleSpec::to(r"^/usr/share/clear/filemap/", "filemap"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/openmpi/bin/", "openmpi"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/openmpi/share", "openmpi"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/openmpi/include/", "dev"),
    RuleSpec::new(r"^/(usr/|usr.*)lib64/openmpi/lib/[a-zA-Z0-9\.\_\+\-]*\.so$", SO_MPI),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/openmpi/lib/[a-zA-Z0-9\.\_\+\-\/]*\.a$", "staticdev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/openmpi/lib/[a-zA-Z0-9\.\_\+\-]*\.so\.", "openmpi"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/openmpi/lib/python3.*/", "openmpi"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/openmpi/lib/", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/[a-zA-Z0-9\.\_\+\-]*\.so\.", "plugins"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/[a-zA-Z0-9\.\_\+\-]*\.so\.", "lib"),
    RuleSpec::to(r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-]*\.so\.", "lib32"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/lib(asm|dw|elf)-[0-9.]+\.so", "lib"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/libkdeinit5", "lib"),
    RuleSpec::to(r"^/(usr/|usr.*)lib32/lib(asm|dw|elf)-[0-9.]+\.so", "lib32"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/haswell/[a-zA-Z0-9\.\_\+\-]*\.so\.", "lib"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/gobject-introspection/", "lib"),
    RuleSpec::to(r"^/(usr/|usr.*)libexec/", "libexec"),
    RuleSpec::to(r"^/(usr/|usr.*)bin/", "bin"),
    RuleSpec::to(r"^/(usr/|usr.*)sbin/", "bin"),
    RuleSpec::to(r"^/sbin/", "bin"),
    RuleSpec::to(r"^/bin/", "bin"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/python3.*/", "python3").replaced_by("/usr/lib/python3*/*"),
    RuleSpec::to(r"^/(usr/|usr.*)share/gir-[0-9\.]+/[a-zA-Z0-9\.\_\+\-]*\.gir", "data")
        .replaced_by("/usr/share/gir-1.0/*.gir"),
    RuleSpec::to(r"^/(usr/|usr.*)share/cmake/", "data").replaced_by("/usr/share/cmake/*"),
    RuleSpec::to(r"^/(usr/|usr.*)share/cmake-3.1/", "data").replaced_by("/usr/share/cmake-3.1/*"),
    RuleSpec::to(r"^/(usr/|usr.*)share/cmake-3.7/", "data").replaced_by("/usr/share/cmake-3.7/*"),
    RuleSpec::to(r"^/(usr/|usr.*)share/cmake-3.8/", "data").replaced_by("/usr/share/cmake-3.8/*"),
    RuleSpec::to(r"^/(usr/|usr.*)share/cmake-3.6/", "data").replaced_by("/usr/share/cmake-3.6/*"),
    RuleSpec::to(r"^/(usr/|usr.*)share/girepository-1\.0/.*\.typelib$", "data")
        .replaced_by("/usr/share/girepository-1.0/*.typelib"),
    RuleSpec::to(r"^/(usr/|usr.*)include/", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/girepository-1.0/", "data"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/cmake/", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/cmake/", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib32/cmake/", "dev32"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/qt5/mkspecs/", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/qt5/mkspecs/", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib32/qt5/mkspecs/", "dev32"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/qt5/", "lib"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/qt5/", "lib"),
    RuleSpec::to(r"^/(usr/|usr.*)lib32/qt5/", "lib32"),
    RuleSpec::new(r"^/(usr/|usr.*)lib/[a-zA-Z0-9\.\_\+\-]*\.so$", SO),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/libkdeinit5_[a-zA-Z0-9\.\_\+\-]*\.so$", "lib"),
    RuleSpec::to(r"^/(usr/|usr.*)lib32/libkdeinit5_[a-zA-Z0-9\.\_\+\-]*\.so$", "lib32"),
    RuleSpec::new(r"^/(usr/|usr.*)lib64/[a-zA-Z0-9\.\_\+\-]*\.so$", SO),
    RuleSpec::new(r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-]*\.so$", SO32),
    RuleSpec::new(r"^/(usr/|usr.*)lib64/haswell/avx512_1/[a-zA-Z0-9\.\_\+\-]*\.so$", SO),
    RuleSpec::new(r"^/(usr/|usr.*)lib64/haswell/[a-zA-Z0-9\.\_\+\-]*\.so$", SO),
    RuleSpec::to(r"^/(usr/|usr.*)lib/[a-zA-Z0-9\.\_\+\-\/]*\.a$", "staticdev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/[a-zA-Z0-9\.\_\+\-\/]*\.a$", "staticdev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-\/]*\.a$", "staticdev32"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/haswell/[a-zA-Z0-9\.\_\+\-]*\.a$", "staticdev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/haswell/[a-zA-Z0-9\.\_\+\-]*\.a$", "staticdev"),
    RuleSpec::to(r"^/usr/lib64/haswell/avx512_1/[a-zA-Z0-9._+-]*\.a$", "staticdev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib32/haswell/[a-zA-Z0-9\.\_\+\-]*\.a$", "staticdev32"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/pkgconfig/[a-zA-Z0-9\.\_\+\-]*\.pc$", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/pkgconfig/[a-zA-Z0-9\.\_\+\-]*\.pc$", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib32/pkgconfig/[a-zA-Z0-9\.\_\+\-]*\.pc$", "dev32"),
    RuleSpec::to(r"^/usr/lib64/haswell/pkgconfig/[a-zA-Z0-9._+-]*\.pc$", "dev"),
    RuleSpec::to(r"^/usr/lib64/haswell/avx512_1/pkgconfig/[a-zA-Z0-9._+-]*\.pc$", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/[a-zA-Z0-9\.\_\+\-]*\.la$", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/[a-zA-Z0-9\.\_\+\-]*\.la$", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-]*\.la$", "dev32"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/[a-zA-Z0-9\.\_\+\-]*\.prl$", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib64/[a-zA-Z0-9\.\_\+\-]*\.prl$", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-]*\.prl$", "dev32"),
    RuleSpec::to(r"^/(usr/|usr.*)share/aclocal/[a-zA-Z0-9\.\_\+\-]*\.ac$", "dev")
        .replaced_by("/usr/share/aclocal/*.ac"),
    RuleSpec::to(r"^/(usr/|usr.*)share/aclocal/[a-zA-Z0-9\.\_\+\-]*\.m4$", "dev")
        .replaced_by("/usr/share/aclocal/*.m4"),
    RuleSpec::to(r"^/(usr/|usr.*)share/aclocal-1.[0-9]+/[a-zA-Z0-9\.\_\+\-]*\.ac$", "dev")
        .replaced_by("/usr/share/aclocal-1.*/*.ac"),
    RuleSpec::to(r"^/(usr/|usr.*)share/aclocal-1.[0-9]+/[a-zA-Z0-9\.\_\+\-]*\.m4$", "dev")
        .replaced_by("/usr/share/aclocal-1.*/*.m4"),
];

/// Generic rules after the package documentation rule
const GENERIC_TAIL: &[RuleSpec] = &[
    RuleSpec::to(r"^/(usr/|usr.*)share/doc/", "doc"),
    RuleSpec::to(r"^/(usr/|usr.*)share/gtk-doc/html", "doc"),
    RuleSpec::to(r"^/(usr/|usr.*)share/help", "doc"),
    // catch-all rules
    RuleSpec::to(r"^/lib/systemd/system/", "services"),
    RuleSpec::to(r"^/lib/systemd/user/", "services"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/systemd/system/", "services"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/systemd/user/", "services"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/udev/rules.d", "config"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/modules-load.d", "config"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/tmpfiles.d", "config"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/sysusers.d", "config"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/sysctl.d", "config"),
    RuleSpec::to(r"^/(usr/|usr.*)share/", "data"),
    RuleSpec::to(r"^/(usr/|usr.*)lib/perl5/", "perl"),
    // loadable plugins that are not language extensions
    RuleSpec::new(r"^/(usr/|usr.*)lib/.*/[a-zA-Z0-9\.\_\+\-]*\.so", SO),
    RuleSpec::new(r"^/(usr/|usr.*)lib64/.*/[a-zA-Z0-9\.\_\+\-]*\.so", SO),
    RuleSpec::new(r"^/(usr/|usr.*)lib32/.*/[a-zA-Z0-9\.\_\+\-]*\.so", SO32),
    RuleSpec::new(r"^/(usr/|usr.*)lib64/[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*$", SO),
    RuleSpec::new(r"^/(usr/|usr.*)lib/[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*$", SO),
    RuleSpec::new(r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*$", SO32),
    RuleSpec::to(r"^/(usr/|usr.*)/[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*.txt$", "dev"),
    RuleSpec::new(r"^/(usr/|usr.*)/[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*.so$", SO),
    RuleSpec::to(r"^/(usr/|usr.*)/[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*.c$", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)/[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*.h$", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)/[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*.cpp$", "dev"),
    RuleSpec::to(r"^/(usr/|usr.*)/[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*.hpp$", "dev"),
    // .mo catalogs are handled before rule matching
    RuleSpec::to(r"^/(usr/|usr.*)share/locale/", "ignore"),
];
