//! Visitor platform detection.
//!
//! Guesses the operating system and architecture of a visitor from the
//! signals a browser exposes (user-agent, platform string, touch points and
//! screen width) and picks the matching download. The heuristics are
//! imprecise by nature; anything unrecognized degrades to `unknown` with no
//! download link instead of guessing.

mod rules;

use serde::Serialize;
use std::fmt;

use rules::{LINUX_RULES, MACOS_RULES, OS_RULES, WINDOWS_RULES, first_match};

/// Release listing, used whenever there is no single obvious installer.
pub const RELEASES_PAGE_URL: &str =
    "https://github.com/hndrwn-dk/s3-migration-scheduler/releases/latest";

/// Direct link to the 64-bit Windows installer.
pub const WINDOWS_X64_INSTALLER_URL: &str = "https://github.com/hndrwn-dk/s3-migration-scheduler/releases/download/v1.1.0/S3.Migration.Scheduler-1.1.0-win-x64.exe";

/// Direct link to the Linux AppImage.
pub const LINUX_APPIMAGE_URL: &str = "https://github.com/hndrwn-dk/s3-migration-scheduler/releases/download/v1.1.0/S3.Migration.Scheduler-1.1.0.AppImage";

/// Raw browser signals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signals {
    pub user_agent: String,
    pub platform: String,
    pub max_touch_points: u32,
    pub screen_width: u32,
}

impl Signals {
    pub fn new(user_agent: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            platform: platform.into(),
            ..Default::default()
        }
    }

    pub fn with_touch_points(mut self, max_touch_points: u32) -> Self {
        self.max_touch_points = max_touch_points;
        self
    }

    pub fn with_screen_width(mut self, screen_width: u32) -> Self {
        self.screen_width = screen_width;
        self
    }
}

/// Lowercased view of [`Signals`] that the rules match against.
#[derive(Debug, Clone)]
pub(crate) struct Probe {
    ua: String,
    platform: String,
    pub max_touch_points: u32,
    pub screen_width: u32,
}

impl Probe {
    pub fn ua_has(&self, needle: &str) -> bool {
        self.ua.contains(needle)
    }

    pub fn platform_has(&self, needle: &str) -> bool {
        self.platform.contains(needle)
    }
}

impl From<&Signals> for Probe {
    fn from(signals: &Signals) -> Self {
        Self {
            ua: signals.user_agent.to_lowercase(),
            platform: signals.platform.to_lowercase(),
            max_touch_points: signals.max_touch_points,
            screen_width: signals.screen_width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Windows,
    MacOs,
    Linux,
    Unknown,
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "windows",
            Os::MacOs => "macos",
            Os::Linux => "linux",
            Os::Unknown => "unknown",
        }
    }

    /// Human readable name, as shown in the detection banner.
    pub fn display_name(&self) -> &'static str {
        match self {
            Os::Windows => "Windows",
            Os::MacOs => "macOS",
            Os::Linux => "Linux",
            Os::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Arch {
    X86,
    X64,
    Arm,
    Arm64,
    Intel,
    AppleSilicon,
    Universal,
    Unknown,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X64 => "x64",
            Arch::Arm => "arm",
            Arch::Arm64 => "arm64",
            Arch::Intel => "intel",
            Arch::AppleSilicon => "apple-silicon",
            Arch::Universal => "universal",
            Arch::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which download a rule recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Download {
    ReleasesPage,
    WindowsInstaller,
    AppImage,
}

impl Download {
    fn url(&self) -> &'static str {
        match self {
            Download::ReleasesPage => RELEASES_PAGE_URL,
            Download::WindowsInstaller => WINDOWS_X64_INSTALLER_URL,
            Download::AppImage => LINUX_APPIMAGE_URL,
        }
    }
}

/// Best guess of the visitor's platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformGuess {
    pub os: Os,
    pub arch: Arch,
    pub recommended_download_url: Option<String>,
}

impl PlatformGuess {
    pub fn unknown() -> Self {
        Self {
            os: Os::Unknown,
            arch: Arch::Unknown,
            recommended_download_url: None,
        }
    }

    /// e.g. `Windows (x64)`
    pub fn display(&self) -> String {
        format!("{} ({})", self.os.display_name(), self.arch)
    }

    pub fn is_known(&self) -> bool {
        self.os != Os::Unknown
    }

    /// The link a "smart download" button should open.
    pub fn download_url(&self) -> &str {
        self.recommended_download_url
            .as_deref()
            .unwrap_or(RELEASES_PAGE_URL)
    }
}

/// Guess the platform from browser signals. Never fails.
#[tracing::instrument(skip_all)]
pub fn detect(signals: &Signals) -> PlatformGuess {
    let probe = Probe::from(signals);

    let Some(os_rule) = first_match(OS_RULES, &probe) else {
        return PlatformGuess::unknown();
    };

    let arch_rules = match os_rule.result {
        Os::Windows => WINDOWS_RULES,
        Os::MacOs => MACOS_RULES,
        Os::Linux => LINUX_RULES,
        Os::Unknown => return PlatformGuess::unknown(),
    };

    match first_match(arch_rules, &probe) {
        Some(rule) => {
            let (arch, download) = rule.result;
            log::debug!("Platform matched rules {} / {}", os_rule.name, rule.name);
            PlatformGuess {
                os: os_rule.result,
                arch,
                recommended_download_url: Some(download.url().to_string()),
            }
        }
        None => PlatformGuess {
            os: os_rule.result,
            arch: Arch::Unknown,
            recommended_download_url: None,
        },
    }
}

/// Trait for platform detection (useful for testing)
pub trait PlatformDetector: Send + Sync {
    fn detect(&self, signals: &Signals) -> PlatformGuess;
}

/// Detector backed by the ordered user-agent rules.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserAgentDetector;

impl PlatformDetector for UserAgentDetector {
    fn detect(&self, signals: &Signals) -> PlatformGuess {
        detect(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN64: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const SAFARI_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";

    #[test]
    fn test_windows_x64_gets_direct_installer() {
        let guess = detect(&Signals::new(CHROME_WIN64, "Win32"));
        assert_eq!(guess.os, Os::Windows);
        assert_eq!(guess.arch, Arch::X64);
        assert_eq!(
            guess.recommended_download_url.as_deref(),
            Some(WINDOWS_X64_INSTALLER_URL)
        );
    }

    #[test]
    fn test_windows_arm64_always_wins() {
        for ua in [
            "Mozilla/5.0 (Windows NT 10.0; ARM64) Edge/120",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; arm64)",
            "windows aarch64",
        ] {
            let guess = detect(&Signals::new(ua, "Win32").with_screen_width(2560));
            assert_eq!(guess.os, Os::Windows, "{}", ua);
            assert_eq!(guess.arch, Arch::Arm64, "{}", ua);
            assert_eq!(guess.download_url(), RELEASES_PAGE_URL);
        }
    }

    #[test]
    fn test_windows_x86_without_64bit_markers() {
        let guess = detect(
            &Signals::new("Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 5.1)", "Win32")
                .with_screen_width(1024),
        );
        assert_eq!(guess.arch, Arch::X86);
        assert_eq!(guess.download_url(), RELEASES_PAGE_URL);
    }

    #[test]
    fn test_windows_touch_implies_x64() {
        let guess = detect(
            &Signals::new("Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 5.1)", "Win32")
                .with_touch_points(10),
        );
        assert_eq!(guess.arch, Arch::X64);
    }

    #[test]
    fn test_macos() {
        let guess = detect(&Signals::new(SAFARI_MAC, "MacIntel"));
        assert_eq!(guess.os, Os::MacOs);
        assert_eq!(guess.arch, Arch::Intel);
        assert_eq!(
            guess.recommended_download_url.as_deref(),
            Some(RELEASES_PAGE_URL)
        );
        assert_eq!(guess.display(), "macOS (intel)");
    }

    #[test]
    fn test_linux_gets_appimage() {
        let guess = detect(&Signals::new(FIREFOX_LINUX, "Linux x86_64"));
        assert_eq!(guess.os, Os::Linux);
        assert_eq!(guess.arch, Arch::X64);
        assert_eq!(
            guess.recommended_download_url.as_deref(),
            Some(LINUX_APPIMAGE_URL)
        );
    }

    #[test]
    fn test_unknown_os() {
        let guess = detect(&Signals::new("some-bot/1.0", ""));
        assert_eq!(guess, PlatformGuess::unknown());
        assert!(!guess.is_known());
        assert_eq!(guess.recommended_download_url, None);
        // The button still has somewhere to go
        assert_eq!(guess.download_url(), RELEASES_PAGE_URL);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let guess = detect(&Signals::new("WINDOWS NT 10.0; WIN64", ""));
        assert_eq!(guess.os, Os::Windows);
        assert_eq!(guess.arch, Arch::X64);
    }

    #[test]
    fn test_display_and_serialize() {
        let guess = detect(&Signals::new(CHROME_WIN64, "Win32"));
        assert_eq!(guess.display(), "Windows (x64)");

        let json = serde_json::to_value(&guess).unwrap();
        assert_eq!(json["os"], "windows");
        assert_eq!(json["arch"], "x64");

        let mac = PlatformGuess {
            os: Os::MacOs,
            arch: Arch::AppleSilicon,
            recommended_download_url: None,
        };
        let json = serde_json::to_value(&mac).unwrap();
        assert_eq!(json["os"], "macos");
        assert_eq!(json["arch"], "apple-silicon");
    }

    #[test]
    fn test_user_agent_detector_delegates() {
        let detector = UserAgentDetector;
        let signals = Signals::new(FIREFOX_LINUX, "");
        assert_eq!(detector.detect(&signals), detect(&signals));
    }
}
