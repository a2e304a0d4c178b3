//! Rule tables for packages whose layout the generic table gets wrong
//!
//! A package table is consulted before the generic table when the package
//! being built has the table's name.

use super::rules::{RuleSpec, RuleTable};

const RPM_MACROS: RuleSpec =
    RuleSpec::to(r"^/usr/lib/rpm[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*$", "main");

const GCC: &[RuleSpec] = &[
    RPM_MACROS,
    RuleSpec::to(r"^/usr/lib64/[a-zA-Z0-9\.\_\+\-]*\.[ao]$", "main"),
    RuleSpec::to(r"^/usr/(?:bin/(?:x86_64\-generic\-linux\-(?:g(?:cc(?:\-(?:ranlib|11|nm|ar))?|fortran|\+\+)|c\+\+)|gcc\-ranlib|gcov\-tool|lto\-dump|gfortran|gcc\-nm|gcc\-ar|gc(?:ov|c)|f95|c(?:pp|c)|[cg]\+\+)|lib/cpp)$", "main"),
    RuleSpec::to(r"^/usr/share/gcc-11/[a-zA-Z0-9\.\_\+\-\/]*", "main"),
    RuleSpec::to(r"^/usr/lib64/libcc1[a-zA-Z0-9\.\_\+\-\/]*", "main"),
    RuleSpec::to(r"^/usr/lib64/gcc/x86_64-generic-linux/11/plugin/[a-zA-Z0-9\.\_\+\-]*\.so[0-9\.]*", "main"),
    RuleSpec::to(r"^/usr/lib64/gcc/x86_64\-generic\-linux/11/(?:plugin/include|in(?:stall\-tools|clude(?:\-fixed)?))/[a-zA-Z0-9\.\_\+\-\/]*", "main"),
    RuleSpec::to(r"^/usr/lib64/gcc/x86_64\-generic\-linux/11/(?:l(?:iblto_plugin\.so\.0\.0\.0|to(?:\-wrapper|1))|liblto_plugin\.so(?:\.0)?|plugin/gtype\.state|f(?:include|951)|c(?:ollect2|c1(?:plus)?))", "main"),
    RuleSpec::to(r"^/usr/lib64/gcc/x86_64-generic-linux/11/libcaf_[a-zA-Z0-9\.\_\+\-]*", "main"),
    RuleSpec::to(r"^/usr/lib64/gcc/x86_64\-generic\-linux/11/(?:plugin/gengtype|crt(?:fastmath|begin[ST]|prec(?:64|80|32)|begin|endS?)\.o|include/ssp/|libgc(?:c(?:_eh)?|ov)\.a)", "dev"),
    RuleSpec::to(r"^/usr/include/c\+\+/*[a-zA-Z0-9\.\_\+\-\/]*", "dev"),
    RuleSpec::to(r"^/usr/bin/gcov-dump$", "dev"),
    RuleSpec::to(r"^/usr/share/gdb/auto-load/usr/lib64/libstdc\+\+\.so[a-zA-Z0-9\.\_\+\-]*", "dev"),
    RuleSpec::to(r"^/usr/lib64/libssp[a-zA-Z0-9\.\_\+\-]*\.a$", "dev"),
    RuleSpec::to(r"^/usr/lib64/lib(?:g(?:fortran\.s(?:pec|o)|omp\.(?:spec|a))|quadmath\.so|s(?:tdc\+\+(?:fs)?|upc\+\+)\.a|stdc\+\+\.so|(?:atomic|gcc_s)\.so|itm\.s(?:pec|o))$", "dev"),
    RuleSpec::to(r"^/usr/lib32/(?:lib(?:sanitizer\.spec|(?:g(?:fortran|omp)|itm)\.spec|caf_single\.a|g(?:fortran|omp)\.(?:so|a)|quadmath\.(?:so|a)|(?:s(?:tdc\+\+fs|upc\+\+)|gc(?:c_eh|ov))\.a|stdc\+\+\.(?:so|a)|(?:atomic|ubsan|asan|ssp)\.(?:so|a)|itm\.(?:so|a)|gcc\.a)|crt(?:fastmath|(?:(?:begin[ST]|prec(?:32|64|80)|endS)|(?:begin|end)))\.o)$", "dev32"),
    RuleSpec::to(r"^/usr/lib64/gcc/x86_64-generic-linux/11/32/[a-zA-Z0-9\.\_\+\-\/]*", "dev32"),
    RuleSpec::to(r"^/usr/share/gdb/auto-load/usr/lib32/libstdc\+\+\.so[a-zA-Z0-9\.\_\+\-]*", "dev32"),
    RuleSpec::to(r"^/usr/lib32/libgo(?:(?:lib)?begin)?\.a", "dev32"),
    RuleSpec::to(r"^/usr/lib64/libgcc_s\.so\.1$", "libgcc1").named(),
    RuleSpec::to(r"^/usr/lib64/lib(?:g(?:fortran|omp)|quadmath|atomic|itm|ssp)[a-zA-Z0-9\_\+\-]*\.so[a-zA-Z0-9\.\_\+\-]+", "libs-math"),
    RuleSpec::to(r"^/usr/lib64/haswell/lib(?:g(?:fortran|omp)|quadmath|atomic|itm|ssp)[a-zA-Z0-9\_\+\-]*\.so[a-zA-Z0-9\.\_\+\-]+", "libs-math"),
    RuleSpec::to(r"^/usr/lib32/lib(?:ssp_nonshared\.a|asan_preinit\.o)$", "libgcc32"),
    RuleSpec::to(r"^/usr/lib32/libgcc_s.so[a-zA-Z0-9\.\_\+\-]*", "libgcc32"),
    RuleSpec::to(r"^/usr/lib32/lib(?:quadmath|(?:gfortr|ubs)an|a(?:tomic|san)|gomp|itm|ssp)\.so\.[a-zA-Z0-9\.\_\+\-]*", "libgcc32"),
    RuleSpec::to(r"^/usr/lib64/libstdc\+\+\.so\.[a-zA-Z0-9\.\_\+\-]*", "libstdc++").named(),
    RuleSpec::to(r"^/usr/lib32/libstdc\+\+\.so\.[a-zA-Z0-9\.\_\+\-]*", "libstdc++32"),
    RuleSpec::to(r"^/usr/libexec/gccgo/bin/[a-zA-Z0-9\.\_\+\-\/]*", "go"),
    RuleSpec::to(r"^/usr/(?:lib64/(?:gcc/x86_64\-generic\-linux/11/(?:test2json|buildid|vet|go1)|gcc/x86_64\-generic\-linux/11/cgo|libgo(?:(?:lib)?begin)?\.a|libgo\.so)|bin/(?:x86_64\-generic\-linux\-)?gccgo)", "go"),
    RuleSpec::to(r"^/usr/lib64/libgo\.so\.[0-9\.]*", "go-lib"),
    RuleSpec::to(r"^/usr/lib64/go/11/x86_64-generic-linux/[a-zA-Z0-9\.\_\+\-\/]*\.gox$", "go-lib"),
    RuleSpec::to(r"^/usr/lib64/lib(?:sanit|ubsan|[alt]san)[a-zA-Z0-9\.\_\+\-\/]*", "libubsan"),
    RuleSpec::to(r"^/usr/share/man/man\d/[a-zA-Z0-9\.\_\+\-]*\.\d$", "doc"),
    RuleSpec::to(r"^/usr/share/info/[a-zA-Z0-9\.\_\+\-\/]*\.info$", "doc"),
];

const DB: &[RuleSpec] = &[
    RPM_MACROS,
    RuleSpec::to(r"/usr/lib64/libdb_cxx(?:\-5\.(?:3\.)?|\.)so", "cxx"),
];

const NSS: &[RuleSpec] = &[
    RPM_MACROS,
    RuleSpec::to(r"/usr/lib64/lib(?:(?:softokn|freebl)3\.chk|(?:softokn|freebl)3\.so|nss(?:dbm3\.(?:chk|so)|(?:util)?3\.so)|s(?:mime|sl)3\.so)", "lib"),
    RuleSpec::to(r"/usr/lib32/lib(?:(?:softokn|freebl)3\.chk|(?:softokn|freebl)3\.so|nss(?:dbm3\.(?:chk|so)|(?:util)?3\.so)|s(?:mime|sl)3\.so)", "lib32"),
];

const NCURSES: &[RuleSpec] = &[
    RPM_MACROS,
    RuleSpec::to(r"^/usr/lib64/libncurses\+\+w?\.so\.6(?:\.2)?$", "lib-plusplus"),
    RuleSpec::to(r"^/usr/lib64/lib(?:ncurses\.so\.6(?:\.2)?|(?:panel|tinfo|form|menu)\.so\.6(?:\.2)?)$", "lib-narrow"),
    RuleSpec::to(r"^/usr/share/man.*$", "docs"),
    RuleSpec::to(r"^/usr/share/terminfo/i/ibm.*$", "data-rare"),
];

const GLIBC: &[RuleSpec] = &[
    RPM_MACROS,
    RuleSpec::to(r"^/usr/bin/(?:catchsegv|sln)$", "bin"),
    RuleSpec::to(r"^/usr/bin/nscd$", "nscd"),
    RuleSpec::to(r"^/usr/lib64/libnss_(?:(?:compat|files|d(?:ns|b))(?:\-2\.33\.9000\.so|\.so(?:\.2)?)|hesiod(?:\-2\.33\.9000\.so|\.so(?:\.2)?))$", "extras"),
    RuleSpec::to(r"^/usr/bin/(?:pcprofiledump|iconvconfig|tzselect|sotruss|ge(?:t(?:conf|ent)|ncat)|rpcgen|xtrace|l(?:ocale|dd)|iconv|zdump|sprof|pldd|zic)$", "utils"),
    RuleSpec::to(r"^/usr/share/locale/(?:en_US|C)\.UTF\-8/[a-zA-Z0-9\.\_\+\-\/]*", "libc6").named(),
    RuleSpec::to(r"^/usr/lib64/audit/sotruss-lib\.so$", "libc6").named(),
    RuleSpec::to(r"^/usr/lib64/gconv/[a-zA-Z0-9\.\_\+\-\/]*", "libc6").named(),
    RuleSpec::to(r"^/usr/lib64/glibc/getconf/[a-zA-Z0-9\.\_\+\-\/]*", "libc6").named(),
    RuleSpec::to(r"^/usr/lib64/l(?:ib(?:BrokenLocale\-|(?:(?:nss_(?:(?:compat|files|d(?:ns|b))|hesiod)\-|pthread\-|resolv\-|m(?:vec)?\-|dl\-|c\-)|(?:(?:cryp|r)t|util|nsl|anl)\-))2\.33\.90{3}\.so|ib(?:BrokenLocale\.so\.1|thread_db\.so\.1|pthread\.so\.0|(?:(?:cryp|r)t|util|nsl|anl)\.so\.1|mvec\.so\.1|[cm]\.so\.6)|d\-(?:linux\-x86\-64\.so\.2|2\.33\.90{3}\.so)|ib(?:thread_db\-1\.0|pcprofile|SegFault|memusage)\.so|ibnss_(?:(?:compat|files|d(?:ns|b))|hesiod)\.so\.2|ib(?:nss_(?:(?:compat|files|d(?:ns|b))|hesiod)\.so|mvec\.so)|ib(?:resolv|dl)\.so\.2)$", "libc6").named(),
    RuleSpec::to(r"^/usr/lib64/haswel{2}/libm(?:\-2\.3{2}\.90{3}\.so|\.so\.6)$", "libc6").named(),
    RuleSpec::to(r"^/usr/share/defaults/etc/rpc$", "libc6-dev").named(),
    RuleSpec::to(r"^/usr/bin/ldconfig$", "libc6").named(),
    RuleSpec::to(r"^/usr/lib64/haswel{2}/lib(?:c(?:rypt(?:\-2\.3{2}\.90{3}\.so|\.so\.1)|(?:\-2\.3{2}\.90{3}\.so|\.so\.6))|mvec(?:\-2\.3{2}\.90{3}\.so|\.so\.1))$", "lib-avx2"),
    RuleSpec::to(r"^/usr/share/locale/[a-zA-Z0-9\.\_\+\-\/]*", "locale"),
    RuleSpec::to(r"^/usr/share/i18n/[a-zA-Z0-9\.\_\+\-\/]*", "locale"),
    RuleSpec::to(r"^/usr/bin/localedef$", "locale"),
    RuleSpec::to(r"^/usr/lib64/(?:[MSg]crt1|crt[1in])\.o$", "dev"),
    RuleSpec::to(r"^/usr/lib64/lib(?:BrokenLocale\.so|c(?:_nonshared\.a|\.so)|(?:nss_hesiod|ns(?:s_(?:file|dn)s|l)|thread_db|pthread|r(?:esolv|t)|crypt|util|(?:an|d)l|m)\.so)$", "dev"),
    RuleSpec::to(r"^/usr/lib32/[a-zA-Z0-9\.\_\+\-]*\.[ao]$", "dev32"),
    RuleSpec::to(r"^/usr/lib32/[a-zA-Z0-9\.\_\+\-]*\.so$", "libc32"),
    RuleSpec::to(r"^/usr/lib/ld-linux.so.2$", "libc32"),
    RuleSpec::to(r"^/usr/bin/lddlibc4$", "libc32"),
    RuleSpec::to(r"^/usr/lib32/gconv/[a-zA-Z0-9\.\_\+\-\/]*", "libc32"),
    RuleSpec::to(r"^/usr/lib32/glibc/getconf/[a-zA-Z0-9\.\_\+\-\/]*", "libc32"),
    RuleSpec::to(r"^/usr/lib32/audit/sotruss-lib\.so$", "libc32"),
    RuleSpec::to(r"^/usr/lib32/l(?:ib(?:BrokenLocale\.so\.1|(?:thread_db|(?:cryp|r)t|util|nsl|anl)\.so\.1|pthread\.so\.0|[cm]\.so\.6)|ib(?:nss_(?:compat|hesiod|files|d(?:ns|b))|resolv|dl)\.so\.2|d\-linux\.so\.2)$", "libc32"),
    RuleSpec::to(r"^/usr/share/info/libc\.info", "doc"),
    RuleSpec::to(r"^/usr/bin/makedb$", "extras"),
    RuleSpec::to(r"^/usr/bin/bench-[a-zA-Z0-9\.\_\+\-\/]*", "bench"),
    RuleSpec::to(r"^/usr/lib64/glibc/benchmarks/[a-zA-Z0-9\.\_\+\-\/]*", "bench"),
];

const GMP: &[RuleSpec] = &[
    RPM_MACROS,
    RuleSpec::to(r"^/usr/lib64/haswell/libgmp\.so\.(?:[0-9\.])*$", "lib-hsw"),
];

/// Names that carry a dedicated table
pub const PACKAGES_WITH_TABLES: &[&str] = &["gcc", "glibc", "ncurses", "nss", "db", "gmp"];

fn specs_for(package_name: &str) -> Option<&'static [RuleSpec]> {
    match package_name {
        "gcc" => Some(GCC),
        "db" => Some(DB),
        "nss" => Some(NSS),
        "ncurses" => Some(NCURSES),
        "glibc" => Some(GLIBC),
        "gmp" => Some(GMP),
        _ => None,
    }
}

/// Compiled table for `package_name`, if it has one
pub fn table_for(package_name: &str) -> Result<Option<RuleTable>, regex::Error> {
    specs_for(package_name)
        .map(RuleTable::compile)
        .transpose()
}
