//! Packaging policy flags and the compat / 32-bit-only exclusion vetoes

use regex::RegexSet;
use serde::{Deserialize, Serialize};

/// Policy flags that change how paths are classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierPolicy {
    /// Compatibility package: only versioned libraries, licenses and locales
    pub compat: bool,
    /// Only the 32-bit tree is packaged
    #[serde(rename = "32bit_only")]
    pub only_32bit: bool,
    /// Keep static archives in compat packages
    pub keepstatic: bool,
    /// Unversioned `.so` files go to `lib` instead of `dev`
    pub so_to_lib: bool,
    pub exclude_locales: bool,
    /// Every header under an `include/` directory goes to `dev`
    pub want_dev_split: bool,
}

impl Default for ClassifierPolicy {
    fn default() -> Self {
        Self {
            compat: false,
            only_32bit: false,
            keepstatic: false,
            so_to_lib: false,
            exclude_locales: false,
            want_dev_split: true,
        }
    }
}

const COMPAT_KEEP: &[&str] = &[
    r"^/(usr/|usr.*)lib/[a-zA-Z0-9\.\_\-\+]*\.so\.",
    r"^/(usr/|usr.*)lib64/[a-zA-Z0-9\.\_\-\+]*\.so\.",
    r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\-\+]*\.so\.",
    r"^/(usr/|usr.*)lib64/lib(asm|dw|elf)-[0-9.]+\.so",
    r"^/(usr/|usr.*)lib32/lib(asm|dw|elf)-[0-9.]+\.so",
    r"^/(usr/|usr.*)lib64/haswell/[a-zA-Z0-9\.\_\-\+]*\.so\.",
    r"^/(usr/|usr.*)share/package-licenses/",
    r"^/usr/share/locale/.*/(.*)\.mo",
];

const COMPAT_KEEP_STATIC: &[&str] = &[
    r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-\/]*\.a$",
    r"^/(usr/|usr.*)lib32/haswell/[a-zA-Z0-9\.\_\+\-]*\.a$",
    r"^/(usr/|usr.*)lib64/[a-zA-Z0-9\.\_\+\-\/]*\.a$",
    r"^/(usr/|usr.*)lib64/haswell/[a-zA-Z0-9\.\_\+\-]*\.a$",
];

const ONLY_32BIT_KEEP: &[&str] = &[
    r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-]*\.so\.",
    r"^/(usr/|usr.*)lib32/lib(asm|dw|elf)-[0-9.]+\.so",
    r"^/(usr/|usr.*)lib32/cmake/",
    r"^/(usr/|usr.*)lib32/qt5/mkspecs/",
    r"^/(usr/|usr.*)lib32/qt5/",
    r"^/(usr/|usr.*)lib32/libkdeinit5_[a-zA-Z0-9\.\_\+\-]*\.so$",
    r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-]*\.so$",
    r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-\/]*\.a$",
    r"^/(usr/|usr.*)lib32/haswell/[a-zA-Z0-9\.\_\+\-]*\.a$",
    r"^/(usr/|usr.*)lib32/pkgconfig/[a-zA-Z0-9\.\_\+\-]*\.pc$",
    r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-]*\.la$",
    r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-]*\.prl$",
    r"^/(usr/|usr.*)lib32/.*/[a-zA-Z0-9\.\_\+\-]*\.so",
    r"^/(usr/|usr.*)lib32/[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*$",
    r"^/(usr/|usr.*)lib/[a-zA-Z0-9\.\_\+\-\/]*/[a-zA-Z0-9\.\_\+\-\/]*$",
];

/// Which veto rejected a path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Veto {
    Compat,
    Only32Bit,
}

/// Allow-lists behind the compat and 32-bit-only policies.
///
/// Each veto is independent: a path outside an enabled policy's allow-list
/// is excluded, whatever the other policy says.
#[derive(Debug, Clone)]
pub struct ExclusionVetoes {
    compat: Option<RegexSet>,
    only_32bit: Option<RegexSet>,
}

impl ExclusionVetoes {
    pub fn new(policy: &ClassifierPolicy) -> Result<Self, regex::Error> {
        let compat = if policy.compat {
            let mut keep: Vec<&str> = COMPAT_KEEP.to_vec();
            if policy.keepstatic {
                keep.extend_from_slice(COMPAT_KEEP_STATIC);
            }
            Some(RegexSet::new(keep)?)
        } else {
            None
        };

        let only_32bit = if policy.only_32bit {
            Some(RegexSet::new(ONLY_32BIT_KEEP)?)
        } else {
            None
        };

        Ok(Self { compat, only_32bit })
    }

    /// The first veto that rejects `path`, if any
    pub fn check(&self, path: &str) -> Option<Veto> {
        if let Some(keep) = &self.compat {
            if !keep.is_match(path) {
                return Some(Veto::Compat);
            }
        }
        if let Some(keep) = &self.only_32bit {
            if !keep.is_match(path) {
                return Some(Veto::Only32Bit);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vetoes(compat: bool, only_32bit: bool, keepstatic: bool) -> ExclusionVetoes {
        ExclusionVetoes::new(&ClassifierPolicy {
            compat,
            only_32bit,
            keepstatic,
            ..ClassifierPolicy::default()
        })
        .unwrap()
    }

    #[test]
    fn test_no_policy_no_veto() {
        let v = vetoes(false, false, false);
        assert_eq!(v.check("/usr/bin/foo"), None);
    }

    #[test]
    fn test_compat_keeps_versioned_libraries() {
        let v = vetoes(true, false, false);
        assert_eq!(v.check("/usr/lib64/libfoo.so.1"), None);
        assert_eq!(v.check("/usr/share/package-licenses/foo/COPYING"), None);
        assert_eq!(v.check("/usr/bin/foo"), Some(Veto::Compat));
        assert_eq!(v.check("/usr/lib64/libfoo.a"), Some(Veto::Compat));
    }

    #[test]
    fn test_keepstatic_extends_compat() {
        let v = vetoes(true, false, true);
        assert_eq!(v.check("/usr/lib64/libfoo.a"), None);
    }

    #[test]
    fn test_only_32bit() {
        let v = vetoes(false, true, false);
        assert_eq!(v.check("/usr/lib32/libfoo.so.1"), None);
        assert_eq!(v.check("/usr/bin/foo"), Some(Veto::Only32Bit));
    }

    #[test]
    fn test_both_policies_either_vetoes() {
        let v = vetoes(true, true, false);
        // kept by 32-bit-only, rejected by compat
        assert_eq!(v.check("/usr/lib32/libfoo.so"), Some(Veto::Compat));
        // kept by compat, rejected by 32-bit-only
        assert_eq!(v.check("/usr/lib64/libfoo.so.1"), Some(Veto::Only32Bit));
        // kept by both
        assert_eq!(v.check("/usr/lib32/libfoo.so.1"), None);
    }
}
