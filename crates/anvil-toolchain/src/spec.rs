//! Toolchain construction inputs.
//!
//! Everything the toolchain needs is passed in explicitly; in particular
//! environment overrides are gathered once by the caller and handed over
//! as plain data, so the toolchain itself never reads process state.

use std::path::PathBuf;

use anvil_platform::Platform;

/// Named build flags that module descriptions and the command line can set.
///
/// Toolchain-specific passthrough flags go into `extra` as
/// (variable, flags) pairs appended to the matching flag variable.
#[derive(Debug, Clone, Default)]
pub struct BuildVariables {
    /// Merge all test cases into a single binary.
    pub monolithic: bool,
    /// Instrument compile and link steps for code coverage.
    pub coverage: bool,
    /// Bundle identifier written into app bundle manifests.
    pub bundle_identifier: Option<String>,
    /// Passthrough flags, keyed by flag variable (`cflags`, `arflags`,
    /// `linkflags`).
    pub extra: Vec<(String, String)>,
}

impl BuildVariables {
    /// Concatenated passthrough flags for one flag variable.
    pub fn extra_for(&self, key: &str) -> Vec<String> {
        self.extra
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

/// Explicit executable and flag overrides, normally captured from the
/// environment (`CC`, `AR`, `LINK`, `CFLAGS`, `ARFLAGS`, `LINKFLAGS`)
/// once at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub cc: Option<String>,
    pub ar: Option<String>,
    pub link: Option<String>,
    pub cflags: Option<String>,
    pub arflags: Option<String>,
    pub linkflags: Option<String>,
}

impl EnvOverrides {
    /// True when no override is set.
    pub fn is_empty(&self) -> bool {
        self.cc.is_none()
            && self.ar.is_none()
            && self.link.is_none()
            && self.cflags.is_none()
            && self.arflags.is_none()
            && self.linkflags.is_none()
    }

    /// Render the captured overrides as `KEY=value` pairs for the graph
    /// preamble.
    pub fn describe(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::new();
        if let Some(v) = &self.cc {
            pairs.push(("CC", v.as_str()));
        }
        if let Some(v) = &self.ar {
            pairs.push(("AR", v.as_str()));
        }
        if let Some(v) = &self.link {
            pairs.push(("LINK", v.as_str()));
        }
        if let Some(v) = &self.cflags {
            pairs.push(("CFLAGS", v.as_str()));
        }
        if let Some(v) = &self.arflags {
            pairs.push(("ARFLAGS", v.as_str()));
        }
        if let Some(v) = &self.linkflags {
            pairs.push(("LINKFLAGS", v.as_str()));
        }
        pairs
    }
}

/// Construction inputs for a [`crate::Toolchain`].
#[derive(Debug, Clone)]
pub struct ToolchainSpec {
    /// Project name, used for the project compile define.
    pub project: String,
    /// Explicit toolchain family token; `None` picks the target default.
    pub family: Option<String>,
    /// Platform the generator runs on.
    pub host: Platform,
    /// Platform the build targets.
    pub target: Platform,
    /// Requested architecture tokens; empty means host architecture.
    pub archs: Vec<String>,
    /// Requested configuration tokens; empty means `release`.
    pub configs: Vec<String>,
    /// Project-wide include paths.
    pub includepaths: Vec<String>,
    /// Sibling libraries this project depends on (include path convention
    /// `../<lib>_lib`).
    pub dependlibs: Vec<String>,
    /// Library search paths for linking.
    pub libpaths: Vec<String>,
    /// Named build flags.
    pub variables: BuildVariables,
    /// Captured executable and flag overrides.
    pub overrides: EnvOverrides,
    /// Directory against which declared source paths are checked.
    pub root: PathBuf,
}

impl ToolchainSpec {
    /// A minimal spec for the given project and target, with everything
    /// else defaulted.
    pub fn new(project: &str, host: Platform, target: Platform) -> Self {
        Self {
            project: project.to_string(),
            family: None,
            host,
            target,
            archs: Vec::new(),
            configs: Vec::new(),
            includepaths: Vec::new(),
            dependlibs: Vec::new(),
            libpaths: Vec::new(),
            variables: BuildVariables::default(),
            overrides: EnvOverrides::default(),
            root: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extra_flags_are_keyed() {
        let vars = BuildVariables {
            extra: vec![
                ("cflags".to_string(), "-DfOO=1".to_string()),
                ("linkflags".to_string(), "-lrt".to_string()),
                ("cflags".to_string(), "-DBAR=2".to_string()),
            ],
            ..Default::default()
        };
        assert_eq!(vars.extra_for("cflags"), vec!["-DfOO=1", "-DBAR=2"]);
        assert_eq!(vars.extra_for("linkflags"), vec!["-lrt"]);
        assert!(vars.extra_for("arflags").is_empty());
    }

    #[test]
    fn describe_lists_only_set_overrides() {
        let overrides = EnvOverrides {
            cc: Some("/opt/cc".to_string()),
            cflags: Some("-O1".to_string()),
            ..Default::default()
        };
        assert_eq!(
            overrides.describe(),
            vec![("CC", "/opt/cc"), ("CFLAGS", "-O1")]
        );
        assert!(EnvOverrides::default().is_empty());
        assert!(!overrides.is_empty());
    }
}
