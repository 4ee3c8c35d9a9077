//! Ordered detection rules.
//!
//! Each table is evaluated top to bottom and the first matching rule wins,
//! so the order of the entries is the priority order.

use super::{Arch, Download, Os, Probe};

/// A single `(predicate, result)` pair.
pub(crate) struct Rule<T: 'static> {
    pub name: &'static str,
    pub matches: fn(&Probe) -> bool,
    pub result: T,
}

/// Evaluate `rules` against `probe`, returning the first match.
pub(crate) fn first_match<'r, T>(rules: &'r [Rule<T>], probe: &Probe) -> Option<&'r Rule<T>> {
    rules.iter().find(|rule| (rule.matches)(probe))
}

pub(crate) static OS_RULES: &[Rule<Os>] = &[
    Rule {
        name: "windows",
        matches: is_windows,
        result: Os::Windows,
    },
    Rule {
        name: "macos",
        matches: is_macos,
        result: Os::MacOs,
    },
    Rule {
        name: "linux",
        matches: is_linux,
        result: Os::Linux,
    },
];

pub(crate) static WINDOWS_RULES: &[Rule<(Arch, Download)>] = &[
    Rule {
        name: "windows-arm64",
        matches: is_arm64,
        result: (Arch::Arm64, Download::ReleasesPage),
    },
    Rule {
        name: "windows-x64",
        matches: is_windows_64bit,
        result: (Arch::X64, Download::WindowsInstaller),
    },
    Rule {
        name: "windows-x86",
        matches: always,
        result: (Arch::X86, Download::ReleasesPage),
    },
];

pub(crate) static MACOS_RULES: &[Rule<(Arch, Download)>] = &[
    Rule {
        name: "macos-intel",
        matches: is_intel,
        result: (Arch::Intel, Download::ReleasesPage),
    },
    Rule {
        name: "macos-apple-silicon",
        matches: is_apple_silicon,
        result: (Arch::AppleSilicon, Download::ReleasesPage),
    },
    Rule {
        name: "macos-universal",
        matches: always,
        result: (Arch::Universal, Download::ReleasesPage),
    },
];

pub(crate) static LINUX_RULES: &[Rule<(Arch, Download)>] = &[
    Rule {
        name: "linux-arm64",
        matches: is_arm64,
        result: (Arch::Arm64, Download::AppImage),
    },
    Rule {
        name: "linux-arm",
        matches: is_arm,
        result: (Arch::Arm, Download::AppImage),
    },
    Rule {
        name: "linux-x64",
        matches: is_linux_64bit,
        result: (Arch::X64, Download::AppImage),
    },
    Rule {
        name: "linux-x86",
        matches: always,
        result: (Arch::X86, Download::AppImage),
    },
];

fn always(_: &Probe) -> bool {
    true
}

fn is_windows(p: &Probe) -> bool {
    p.ua_has("win") || p.platform_has("win")
}

fn is_macos(p: &Probe) -> bool {
    p.ua_has("mac") || p.platform_has("mac")
}

fn is_linux(p: &Probe) -> bool {
    p.ua_has("linux") || p.platform_has("linux")
}

fn is_arm64(p: &Probe) -> bool {
    p.ua_has("arm64") || p.ua_has("aarch64")
}

fn is_arm(p: &Probe) -> bool {
    p.ua_has("arm")
}

fn is_intel(p: &Probe) -> bool {
    p.ua_has("intel")
}

fn is_apple_silicon(p: &Probe) -> bool {
    p.ua_has("arm") || p.ua_has("apple silicon") || p.platform_has("arm")
}

/// Touch support and wide screens are treated as proxies for a modern
/// 64-bit machine when the user-agent itself says nothing.
fn is_windows_64bit(p: &Probe) -> bool {
    ["win64", "x64", "amd64", "wow64"]
        .iter()
        .any(|needle| p.ua_has(needle))
        || p.platform_has("win64")
        || p.platform_has("x64")
        || (p.ua_has("chrome") && !p.ua_has("wow64"))
        || p.max_touch_points > 0
        || p.screen_width >= 1920
}

fn is_linux_64bit(p: &Probe) -> bool {
    p.ua_has("x86_64")
        || p.ua_has("amd64")
        || p.platform_has("x86_64")
        || (!p.ua_has("i386") && !p.ua_has("i686"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Signals;

    fn probe(ua: &str, platform: &str) -> Probe {
        Probe::from(&Signals::new(ua, platform))
    }

    fn rule_name<T>(rules: &[Rule<T>], p: &Probe) -> Option<&'static str> {
        first_match(rules, p).map(|r| r.name)
    }

    #[test]
    fn test_os_rules_priority_windows_before_mac() {
        // "win" is checked first even when "mac" also appears
        let p = probe("something win mac linux", "");
        assert_eq!(rule_name(OS_RULES, &p), Some("windows"));
    }

    #[test]
    fn test_os_rules_platform_string_only() {
        assert_eq!(rule_name(OS_RULES, &probe("", "macintel")), Some("macos"));
        assert_eq!(
            rule_name(OS_RULES, &probe("", "linux x86_64")),
            Some("linux")
        );
        assert_eq!(rule_name(OS_RULES, &probe("curl/8.0", "")), None);
    }

    #[test]
    fn test_windows_rules_arm_beats_x64() {
        let p = probe("windows nt 10.0; win64; x64; arm64", "win32");
        assert_eq!(rule_name(WINDOWS_RULES, &p), Some("windows-arm64"));
    }

    #[test]
    fn test_windows_64bit_proxies() {
        let mut p = probe("windows nt 6.1", "win32");
        assert!(!is_windows_64bit(&p));

        p.max_touch_points = 5;
        assert!(is_windows_64bit(&p));

        p.max_touch_points = 0;
        p.screen_width = 1920;
        assert!(is_windows_64bit(&p));

        p.screen_width = 1919;
        assert!(!is_windows_64bit(&p));
    }

    #[test]
    fn test_windows_chrome_counts_as_64bit() {
        assert!(is_windows_64bit(&probe("windows nt 10.0 chrome/120", "")));
        // wow64 is itself a 64-bit marker
        assert!(is_windows_64bit(&probe("windows nt 10.0; wow64 chrome/120", "")));
    }

    #[test]
    fn test_windows_fallback_is_x86() {
        let p = probe("windows nt 6.1; msie 9.0", "win32");
        assert_eq!(rule_name(WINDOWS_RULES, &p), Some("windows-x86"));
    }

    #[test]
    fn test_macos_rules() {
        assert_eq!(
            rule_name(MACOS_RULES, &probe("macintosh; intel mac os x 10_15_7", "")),
            Some("macos-intel")
        );
        assert_eq!(
            rule_name(MACOS_RULES, &probe("macintosh; apple silicon", "")),
            Some("macos-apple-silicon")
        );
        assert_eq!(
            rule_name(MACOS_RULES, &probe("macintosh", "macarm")),
            Some("macos-apple-silicon")
        );
        assert_eq!(
            rule_name(MACOS_RULES, &probe("macintosh", "macppc")),
            Some("macos-universal")
        );
    }

    #[test]
    fn test_linux_rules() {
        assert_eq!(
            rule_name(LINUX_RULES, &probe("x11; linux aarch64", "")),
            Some("linux-arm64")
        );
        assert_eq!(
            rule_name(LINUX_RULES, &probe("x11; linux armv7l", "")),
            Some("linux-arm")
        );
        assert_eq!(
            rule_name(LINUX_RULES, &probe("x11; linux x86_64", "")),
            Some("linux-x64")
        );
        assert_eq!(
            rule_name(LINUX_RULES, &probe("x11; linux i686", "")),
            Some("linux-x86")
        );
        // An explicit 64-bit marker wins over a 32-bit one
        assert_eq!(
            rule_name(LINUX_RULES, &probe("x11; linux i686 on x86_64", "")),
            Some("linux-x64")
        );
    }
}
