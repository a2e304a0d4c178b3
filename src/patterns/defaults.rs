//! Built-in pattern tables and lookup tables

use super::resolver::Resolver;

/// Diagnostic → plain requirement
pub const SIMPLE_PATTERNS: &[(&str, &str)] = &[
    (r"checking for bison\.\.\. no", "bison"),
    (r"checking for flex\.\.\. no", "flex"),
    (r"checking for makeinfo\.\.\. no", "texinfo"),
    (r"checking for gperf\.\.\. no", "gperf"),
    (r"checking for swig\.\.\. no", "swig"),
    (r"checking for doxygen\.\.\. no", "doxygen"),
    (r"checking for intltool-update\.\.\. no", "intltool"),
    (r"checking for xsltproc\.\.\. no", "libxslt-bin"),
    (r"checking for msgfmt\.\.\. no", "gettext"),
    (r"The pkg-config script could not be found", "pkg-config"),
    (r"XML::Parser perl module is required for intltool", "perl(XML::Parser)"),
    (r"You need to install the gtk-doc package", "gtk-doc"),
    (r"/usr/bin/env: .python.: No such file or directory", "python3"),
    (r"error: possibly undefined macro: AC_PROG_LIBTOOL", "libtool"),
    (r"error: possibly undefined macro: AM_GNU_GETTEXT", "gettext-bin"),
    (r"Can't exec .autopoint.: No such file or directory", "gettext-bin"),
    (r"cannot find -lz$", "zlib-dev"),
];

/// Diagnostic → pkg-config module
pub const PKGCONFIG_PATTERNS: &[(&str, &str)] = &[
    (r"Could NOT find ZLIB", "zlib"),
    (r"Could NOT find OpenSSL", "openssl"),
    (r"Could NOT find PNG", "libpng"),
    (r"Could NOT find CURL", "libcurl"),
    (r"Could NOT find LibXml2", "libxml-2.0"),
    (r"Could NOT find EXPAT", "expat"),
    (r"Could NOT find LibLZMA", "liblzma"),
    (r"checking for GLIB - version >= .*\.\.\. no", "glib-2.0"),
    (r"libffi is required", "libffi"),
    (r"X11 development libraries not found", "x11"),
];

/// Diagnostic with one capture group → resolver for the captured token
pub const FAILED_PATTERNS: &[(&str, Resolver)] = &[
    (r"checking for (.*?)\.\.\. not found", Resolver::FailedCommand),
    (r"checking for (.*?)\.\.\. no$", Resolver::FailedCommand),
    (r"checking for (.*) in default path\.\.\. not found", Resolver::FailedCommand),
    (r"configure: error: ([a-zA-Z0-9_\-\.]+) is required", Resolver::FailedCommand),
    (r"configure: error: Cannot find ([a-zA-Z0-9_\-\.]+)", Resolver::FailedCommand),
    (r"([a-zA-Z0-9\-_\.]*): command not found", Resolver::FailedCommand),
    (r"which: no ([a-zA-Z0-9\-_\.]*) in \(", Resolver::FailedCommand),
    (r"fatal error: ([a-zA-Z0-9_\-\./]+): No such file or directory", Resolver::FailedCommand),
    (r"(?:-- )?(?:Could|Did) (?:NOT|not) find ([a-zA-Z0-9_\-]+)", Resolver::FailedCommand),
    (r"No package '([^']+)' found", Resolver::PkgConfig),
    (r"Package '([^']+)', required by '.*', not found", Resolver::PkgConfig),
    (r"Package ([a-zA-Z0-9_\-\.+]+) was not found in the pkg-config search path", Resolver::PkgConfig),
    (r#"Dependency "([^"]+)" not found"#, Resolver::PkgConfig),
    (r"Run-time dependency ([a-zA-Z0-9_\-\.+]+) found: NO", Resolver::PkgConfig),
    (r"ERROR: dependency ‘(.*)’ is not available", Resolver::R),
    (r"ERROR: dependencies? ‘(.*)’ (?:is|are) not available", Resolver::R),
    (r"you may need to install the ([a-zA-Z0-9_:]+) module", Resolver::Perl),
    (r"Can't locate [a-zA-Z0-9_/\.]+\.pm in @INC \(you may need to install the ([a-zA-Z0-9_:]+) module\)", Resolver::Perl),
    (r"checking for perl module ([a-zA-Z0-9_:]+)\.\.\. no", Resolver::Perl),
    (r"ModuleNotFoundError: No module named '?([a-zA-Z0-9_\-\.]+)'?", Resolver::Pypi),
    (r"ImportError: No module named '?([a-zA-Z0-9_\-\.]+)'?", Resolver::Pypi),
    (r"ERROR:  Could not find a valid gem '([a-zA-Z0-9_\-\.]+)'", Resolver::Ruby),
    (r"Gem::LoadError: Could not find '([a-zA-Z0-9_\-\.]+)'", Resolver::Ruby),
    (r"cannot load such file -- ([a-zA-Z0-9_\-\./]+)", Resolver::RubyTable),
    (r"Could not find the required component '([a-zA-Z0-9_\-]+)'", Resolver::Catkin),
];

/// Diagnostics that are echoed as warnings only
pub const FAILED_EXIT_PATTERNS: &[&str] = &[
    r"^configure: error: (.*)",
    r"^CMake Error at (.*)",
    r"make(?:\[\d+\])?: \*\*\* .* Error \d+",
    r"^error: Bad exit status from",
];

/// Command or library name → package providing it
pub const FAILED_COMMANDS: &[(&str, &str)] = &[
    ("aclocal", "automake"),
    ("autoconf", "autoconf"),
    ("autoreconf", "autoconf"),
    ("automake", "automake"),
    ("bison", "bison"),
    ("cmake", "cmake"),
    ("doxygen", "doxygen"),
    ("flex", "flex"),
    ("gperf", "gperf"),
    ("gtkdocize", "gtk-doc"),
    ("help2man", "help2man"),
    ("intltoolize", "intltool"),
    ("libtoolize", "libtool"),
    ("lex", "flex"),
    ("m4", "m4"),
    ("makeinfo", "texinfo"),
    ("meson", "meson"),
    ("msgfmt", "gettext"),
    ("nasm", "nasm"),
    ("ninja", "ninja"),
    ("pkg-config", "pkg-config"),
    ("python", "python3"),
    ("python3", "python3"),
    ("rst2man", "docutils"),
    ("sphinx-build", "sphinx"),
    ("swig", "swig"),
    ("valac", "vala"),
    ("xmlto", "xmlto"),
    ("xsltproc", "libxslt-bin"),
    ("yacc", "bison"),
    ("yasm", "yasm"),
    ("zlib.h", "zlib-dev"),
    ("ZLIB", "zlib-dev"),
    ("OpenSSL", "openssl-dev"),
    ("openssl/ssl.h", "openssl-dev"),
    ("PNG", "libpng-dev"),
    ("JPEG", "libjpeg-turbo-dev"),
    ("CURL", "curl-dev"),
    ("BZip2", "bzip2-dev"),
    ("LibXml2", "libxml2-dev"),
    ("ncurses.h", "ncurses-dev"),
    ("readline/readline.h", "readline-dev"),
    ("Threads", ""),
];

/// Tokens that name the toolchain itself and never a missing package
pub const IGNORED_COMMANDS: &[&str] = &[
    "C", "C++", "ANSI C", "ar", "as", "awk", "cc", "c++", "cpp", "g++", "gawk", "gcc", "grep",
    "install", "ld", "ln", "make", "mkdir", "nm", "ranlib", "sed", "sh", "strip", "true",
];

/// Gem name → package
pub const GEMS: &[(&str, &str)] = &[
    ("rspec", "rubygem-rspec-core"),
    ("rspec/core", "rubygem-rspec-core"),
    ("rake", "rubygem-rake"),
    ("bundler", "rubygem-bundler"),
    ("minitest", "rubygem-minitest"),
    ("json", "rubygem-json"),
];

/// Python module name → distribution name
pub const PYPI_TRANSLATIONS: &[(&str, &str)] = &[
    ("yaml", "PyYAML"),
    ("dateutil", "python-dateutil"),
    ("PIL", "Pillow"),
    ("setuptools_scm", "setuptools-scm"),
    ("pkg_resources", "setuptools"),
    ("google.protobuf", "protobuf"),
];
