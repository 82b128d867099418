//! CPU architecture model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// A supported CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    #[serde(rename = "x86")]
    X86,
    #[serde(rename = "x86-64")]
    X86_64,
    #[serde(rename = "arm6")]
    Arm6,
    #[serde(rename = "arm7")]
    Arm7,
    #[serde(rename = "arm64")]
    Arm64,
    #[serde(rename = "mips")]
    Mips,
    #[serde(rename = "mips64")]
    Mips64,
    #[serde(rename = "generic")]
    Generic,
}

impl Arch {
    /// All supported architectures, in canonical listing order.
    pub const ALL: [Arch; 8] = [
        Arch::X86,
        Arch::X86_64,
        Arch::Arm6,
        Arch::Arm7,
        Arch::Arm64,
        Arch::Mips,
        Arch::Mips64,
        Arch::Generic,
    ];

    /// The architecture of the running host.
    #[cfg(target_arch = "x86_64")]
    pub const fn host() -> Self {
        Arch::X86_64
    }

    #[cfg(target_arch = "x86")]
    pub const fn host() -> Self {
        Arch::X86
    }

    #[cfg(target_arch = "aarch64")]
    pub const fn host() -> Self {
        Arch::Arm64
    }

    #[cfg(not(any(target_arch = "x86_64", target_arch = "x86", target_arch = "aarch64")))]
    pub const fn host() -> Self {
        Arch::Generic
    }

    /// Canonical token for this architecture.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Arch::X86 => "x86",
            Arch::X86_64 => "x86-64",
            Arch::Arm6 => "arm6",
            Arch::Arm7 => "arm7",
            Arch::Arm64 => "arm64",
            Arch::Mips => "mips",
            Arch::Mips64 => "mips64",
            Arch::Generic => "generic",
        }
    }

    /// Identifier-safe form of the token, for use in ninja variable names.
    pub const fn ninja_name(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            other => other.as_str(),
        }
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for Arch {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|a| a.as_str() == s)
            .copied()
            .ok_or_else(|| PlatformError::UnsupportedArchitecture {
                token: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
