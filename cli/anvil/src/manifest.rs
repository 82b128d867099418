//! `anvil.toml` manifest parsing.
//!
//! The manifest is the module description: pure data declaring which
//! libraries, binaries, app bundles, and test cases to emit. Artifact
//! entries are processed in declaration order; `deps` entries refer to
//! libraries declared earlier in the same manifest.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// The top-level manifest structure for an anvil project.
#[derive(Debug, Clone, Deserialize)]
pub struct AnvilManifest {
    /// Project metadata (required).
    pub project: ProjectConfig,
    /// Static libraries, in emission order.
    #[serde(default, rename = "lib")]
    pub libs: Vec<LibConfig>,
    /// Executables.
    #[serde(default, rename = "bin")]
    pub bins: Vec<BinConfig>,
    /// Application bundles.
    #[serde(default, rename = "app")]
    pub apps: Vec<BinConfig>,
    /// Test suite.
    #[serde(default)]
    pub test: Option<TestConfig>,
}

/// Project metadata section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Project name (required).
    pub name: String,
    /// Sibling libraries this project depends on.
    #[serde(default)]
    pub dependlibs: Vec<String>,
    /// Library search paths for linking.
    #[serde(default)]
    pub libpaths: Vec<String>,
    /// Project-wide include paths.
    #[serde(default)]
    pub includepaths: Vec<String>,
}

/// A static library declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct LibConfig {
    /// Module name; also the source subdirectory.
    pub module: String,
    /// Source files relative to `basepath/module`.
    pub sources: Vec<String>,
    #[serde(default)]
    pub basepath: Option<String>,
    /// Configuration override tokens.
    #[serde(default)]
    pub configs: Vec<String>,
    #[serde(default)]
    pub includepaths: Vec<String>,
}

/// An executable or app bundle declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct BinConfig {
    pub module: String,
    pub sources: Vec<String>,
    /// Output binary name; defaults to the module name.
    #[serde(default)]
    pub binname: Option<String>,
    #[serde(default)]
    pub basepath: Option<String>,
    /// Names of previously declared libraries this artifact depends on.
    #[serde(default)]
    pub deps: Vec<String>,
    /// Libraries to link.
    #[serde(default)]
    pub libs: Vec<String>,
    /// Frameworks to link on apple targets.
    #[serde(default)]
    pub frameworks: Vec<String>,
    /// Bundle resources (app entries only).
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub configs: Vec<String>,
    #[serde(default)]
    pub includepaths: Vec<String>,
}

/// The test suite section.
#[derive(Debug, Clone, Deserialize)]
pub struct TestConfig {
    /// Logical test cases.
    #[serde(default, rename = "case")]
    pub cases: Vec<CaseConfig>,
    /// Libraries every test binary links.
    #[serde(default)]
    pub libs: Vec<String>,
    /// Names of previously declared libraries the tests depend on.
    #[serde(default)]
    pub deps: Vec<String>,
    /// Bundle resources for the monolithic test app.
    #[serde(default)]
    pub resources: Vec<String>,
}

/// One test case declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseConfig {
    /// Case name; also the source subdirectory under `test/`.
    pub name: String,
    /// Source files relative to `test/<name>/`.
    pub sources: Vec<String>,
}

impl AnvilManifest {
    /// Load and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let manifest: AnvilManifest =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(manifest)
    }
}
