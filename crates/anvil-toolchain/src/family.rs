//! Toolchain family model.
//!
//! A family is the compiler/archiver/linker suite driving a build. It
//! decides executable defaults, artifact name decoration, and the depfile
//! style used for incremental rebuilds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use anvil_platform::Platform;

use crate::error::ToolchainError;

/// A supported toolchain family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolchainFamily {
    Gcc,
    Clang,
    Msvc,
}

impl ToolchainFamily {
    /// All supported families, in canonical listing order.
    pub const ALL: [ToolchainFamily; 3] = [
        ToolchainFamily::Gcc,
        ToolchainFamily::Clang,
        ToolchainFamily::Msvc,
    ];

    /// Default family for a target platform.
    pub fn default_for(target: Platform) -> Self {
        if target.is_windows() {
            ToolchainFamily::Msvc
        } else if target.is_apple() {
            ToolchainFamily::Clang
        } else {
            ToolchainFamily::Gcc
        }
    }

    /// Resolve a family from an optional token, falling back to the
    /// target-platform default.
    pub fn resolve(token: Option<&str>, target: Platform) -> Result<Self, ToolchainError> {
        match token {
            None | Some("") => Ok(Self::default_for(target)),
            Some(tok) => tok.parse(),
        }
    }

    /// Canonical token for this family.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ToolchainFamily::Gcc => "gcc",
            ToolchainFamily::Clang => "clang",
            ToolchainFamily::Msvc => "msvc",
        }
    }

    /// Default compiler executable.
    pub const fn default_cc(&self) -> &'static str {
        match self {
            ToolchainFamily::Gcc => "gcc",
            ToolchainFamily::Clang => "clang",
            ToolchainFamily::Msvc => "cl",
        }
    }

    /// Default archiver executable.
    pub const fn default_ar(&self) -> &'static str {
        match self {
            ToolchainFamily::Gcc => "ar",
            ToolchainFamily::Clang => "ar",
            ToolchainFamily::Msvc => "lib",
        }
    }

    /// Default linker executable. The gcc-like families link through the
    /// compiler driver.
    pub const fn default_link(&self) -> &'static str {
        match self {
            ToolchainFamily::Gcc => "gcc",
            ToolchainFamily::Clang => "clang",
            ToolchainFamily::Msvc => "link",
        }
    }

    /// True for families using the gcc depfile protocol.
    pub const fn uses_gcc_deps(&self) -> bool {
        !matches!(self, ToolchainFamily::Msvc)
    }

    /// Object file name for a source file stem.
    pub fn objname(&self, stem: &str) -> String {
        match self {
            ToolchainFamily::Msvc => format!("{stem}.obj"),
            _ => format!("{stem}.o"),
        }
    }

    /// Static library file name for a module name.
    pub fn staticlib_name(&self, name: &str) -> String {
        match self {
            ToolchainFamily::Msvc => format!("{name}.lib"),
            _ => format!("lib{name}.a"),
        }
    }

    /// Executable file name for a binary name.
    pub fn binname(&self, name: &str) -> String {
        match self {
            ToolchainFamily::Msvc => format!("{name}.exe"),
            _ => name.to_string(),
        }
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for ToolchainFamily {
    type Err = ToolchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|f| f.as_str() == s)
            .copied()
            .ok_or_else(|| ToolchainError::UnsupportedToolchain {
                token: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

impl fmt::Display for ToolchainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
