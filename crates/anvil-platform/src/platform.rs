//! Target and host platform model.
//!
//! A `Platform` is constructed from an optional command-line token; an
//! absent token resolves to the running host. Exactly one of the `is_*`
//! predicates is true for any instance.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// A supported target or host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Linux,
    Macos,
    Bsd,
    Ios,
    Android,
    Raspberrypi,
    Tizen,
    Pnacl,
}

impl Platform {
    /// All supported platforms, in canonical listing order.
    pub const ALL: [Platform; 9] = [
        Platform::Windows,
        Platform::Linux,
        Platform::Macos,
        Platform::Bsd,
        Platform::Ios,
        Platform::Android,
        Platform::Raspberrypi,
        Platform::Tizen,
        Platform::Pnacl,
    ];

    /// Resolve a platform from an optional token.
    ///
    /// `None` or an empty token resolves to the running host.
    pub fn from_token(token: Option<&str>) -> Result<Self, PlatformError> {
        match token {
            None | Some("") => Ok(Self::host()),
            Some(tok) => tok.parse(),
        }
    }

    /// The platform of the running host.
    #[cfg(target_os = "windows")]
    pub const fn host() -> Self {
        Platform::Windows
    }

    #[cfg(target_os = "macos")]
    pub const fn host() -> Self {
        Platform::Macos
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    pub const fn host() -> Self {
        Platform::Linux
    }

    /// Canonical token for this platform.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Bsd => "bsd",
            Platform::Ios => "ios",
            Platform::Android => "android",
            Platform::Raspberrypi => "raspberrypi",
            Platform::Tizen => "tizen",
            Platform::Pnacl => "pnacl",
        }
    }

    pub fn is_windows(&self) -> bool {
        *self == Platform::Windows
    }

    pub fn is_linux(&self) -> bool {
        *self == Platform::Linux
    }

    pub fn is_macos(&self) -> bool {
        *self == Platform::Macos
    }

    pub fn is_bsd(&self) -> bool {
        *self == Platform::Bsd
    }

    pub fn is_ios(&self) -> bool {
        *self == Platform::Ios
    }

    pub fn is_android(&self) -> bool {
        *self == Platform::Android
    }

    pub fn is_raspberrypi(&self) -> bool {
        *self == Platform::Raspberrypi
    }

    pub fn is_tizen(&self) -> bool {
        *self == Platform::Tizen
    }

    pub fn is_pnacl(&self) -> bool {
        *self == Platform::Pnacl
    }

    /// True for the Apple platforms (macos, ios), which share the Mach-O
    /// toolchain conventions (lipo fusion, frameworks, bundles).
    pub fn is_apple(&self) -> bool {
        matches!(self, Platform::Macos | Platform::Ios)
    }

    /// True for targets where test cases must be packaged into a single
    /// binary instead of one executable per case.
    pub fn requires_single_test_binary(&self) -> bool {
        matches!(
            self,
            Platform::Ios | Platform::Android | Platform::Tizen | Platform::Pnacl
        )
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Platform {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or_else(|| PlatformError::UnsupportedPlatform {
                token: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
