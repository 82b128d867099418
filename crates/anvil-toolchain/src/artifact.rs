//! Artifact descriptions.
//!
//! An artifact is one named unit of build output (static library,
//! executable, or app bundle). Descriptions are constructed transiently by
//! module descriptions, consumed immediately by the toolchain to emit
//! graph edges, then discarded.

use anvil_platform::BuildConfig;

/// Description of one artifact to emit.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSpec {
    /// Module name; also the source subdirectory when non-empty.
    pub module: String,
    /// Source files, relative to `basepath/module`.
    pub sources: Vec<String>,
    /// Output binary name; defaults to the module name.
    pub binname: Option<String>,
    /// Base path prepended to the module directory.
    pub basepath: Option<String>,
    /// Graph outputs of other artifacts this one implicitly depends on.
    pub implicit_deps: Vec<String>,
    /// Libraries to link.
    pub libs: Vec<String>,
    /// Additional libraries appended after `libs`.
    pub extralibs: Vec<String>,
    /// Frameworks to link on apple targets.
    pub frameworks: Vec<String>,
    /// Resource files packaged into app bundles.
    pub resources: Vec<String>,
    /// Configuration override; empty uses the toolchain's configurations.
    pub configs: Vec<BuildConfig>,
    /// Additional include paths for this artifact only.
    pub includepaths: Vec<String>,
}

impl ArtifactSpec {
    pub fn new(module: &str, sources: &[&str]) -> Self {
        Self {
            module: module.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn with_binname(mut self, binname: &str) -> Self {
        self.binname = Some(binname.to_string());
        self
    }

    pub fn with_basepath(mut self, basepath: &str) -> Self {
        self.basepath = Some(basepath.to_string());
        self
    }

    pub fn with_implicit_deps(mut self, deps: &[String]) -> Self {
        self.implicit_deps = deps.to_vec();
        self
    }

    pub fn with_libs(mut self, libs: &[&str]) -> Self {
        self.libs = libs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_extralibs(mut self, libs: &[&str]) -> Self {
        self.extralibs = libs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_frameworks(mut self, frameworks: &[&str]) -> Self {
        self.frameworks = frameworks.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_resources(mut self, resources: &[&str]) -> Self {
        self.resources = resources.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_configs(mut self, configs: &[BuildConfig]) -> Self {
        self.configs = configs.to_vec();
        self
    }

    pub fn with_includepaths(mut self, paths: &[&str]) -> Self {
        self.includepaths = paths.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Output binary name, defaulting to the module name.
    pub fn output_name(&self) -> &str {
        match &self.binname {
            Some(name) => name,
            None => &self.module,
        }
    }

    /// Display name for error reporting: the module when named, else the
    /// output binary name.
    pub fn display_name(&self) -> &str {
        if self.module.is_empty() {
            self.output_name()
        } else {
            &self.module
        }
    }
}
