//! Build configuration model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PlatformError;

/// A build configuration. Each maps to a fixed compiler/linker flag set,
/// resolved by the toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildConfig {
    /// No optimization, full debug information, assertions enabled.
    Debug,
    /// Optimized with debug information retained.
    Release,
    /// Optimized with profiling instrumentation hooks.
    Profile,
    /// Fully optimized and stripped for distribution.
    Deploy,
}

impl BuildConfig {
    /// All supported configurations, in canonical listing order.
    pub const ALL: [BuildConfig; 4] = [
        BuildConfig::Debug,
        BuildConfig::Release,
        BuildConfig::Profile,
        BuildConfig::Deploy,
    ];

    /// Canonical token for this configuration.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BuildConfig::Debug => "debug",
            BuildConfig::Release => "release",
            BuildConfig::Profile => "profile",
            BuildConfig::Deploy => "deploy",
        }
    }

    fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for BuildConfig {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| PlatformError::UnsupportedConfiguration {
                token: s.to_string(),
                supported: Self::supported_list(),
            })
    }
}

impl fmt::Display for BuildConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_tokens() {
        for config in BuildConfig::ALL {
            assert_eq!(config.as_str().parse::<BuildConfig>().unwrap(), config);
        }
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = "optimized".parse::<BuildConfig>().unwrap_err();
        assert!(matches!(
            err,
            PlatformError::UnsupportedConfiguration { ref token, .. } if token == "optimized"
        ));
    }
}
