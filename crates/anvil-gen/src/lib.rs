//! Generator facade.
//!
//! Ties the resolved configuration together: constructs host and target
//! platforms and the toolchain, writes the graph preamble (required ninja
//! version, recorded invocation arguments, resolved configuration,
//! captured environment overrides), then exposes the artifact-emission
//! operations to module descriptions. Generation is a single synchronous
//! pass; emission order is preserved exactly as issued.

use std::io::Write;
use std::path::PathBuf;

use anvil_platform::Platform;
use anvil_syntax::NinjaWriter;
use anvil_toolchain::error::Result;
use anvil_toolchain::{
    ArtifactSpec, BuildVariables, EnvOverrides, GenerationReport, Toolchain, ToolchainSpec,
};

/// Resolved command-line configuration handed to the generator.
///
/// Environment overrides are gathered once by the caller; nothing here is
/// read implicitly mid-generation.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Target platform token; `None` means host.
    pub target: Option<String>,
    /// Host platform token; `None` means the running host.
    pub host: Option<String>,
    /// Toolchain family token; `None` means the target default.
    pub toolchain: Option<String>,
    /// Requested configurations; empty means `release`.
    pub configs: Vec<String>,
    /// Requested architectures; empty means the host architecture.
    pub archs: Vec<String>,
    /// Additional include paths.
    pub includepaths: Vec<String>,
    /// Merge all test cases into one binary.
    pub monolithic: bool,
    /// Instrument for code coverage.
    pub coverage: bool,
    /// Bundle identifier for app bundle manifests.
    pub bundle_identifier: Option<String>,
    /// Captured environment overrides.
    pub overrides: EnvOverrides,
    /// Raw invocation arguments, recorded in the graph preamble.
    pub args: Vec<String>,
    /// Directory declared source paths are checked against.
    pub root: PathBuf,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            target: None,
            host: None,
            toolchain: None,
            configs: Vec::new(),
            archs: Vec::new(),
            includepaths: Vec::new(),
            monolithic: false,
            coverage: false,
            bundle_identifier: None,
            overrides: EnvOverrides::default(),
            args: Vec::new(),
            root: PathBuf::from("."),
        }
    }
}

/// One logical test case: a module under the test basepath.
#[derive(Debug, Clone)]
pub struct TestCase {
    /// Case name; also the source subdirectory under `test/`.
    pub name: String,
    /// Source files relative to `test/<name>/`.
    pub sources: Vec<String>,
}

impl TestCase {
    pub fn new(name: &str, sources: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Test suite description consumed by [`Generator::tests`].
#[derive(Debug, Clone, Default)]
pub struct TestSuite {
    /// The logical test cases.
    pub cases: Vec<TestCase>,
    /// Libraries every test binary links.
    pub libs: Vec<String>,
    /// Graph outputs the test binaries implicitly depend on.
    pub implicit_deps: Vec<String>,
    /// Bundle resources for the monolithic app on targets that use one.
    pub resources: Vec<String>,
}

/// Top-level generation orchestrator.
#[derive(Debug)]
pub struct Generator<W: Write> {
    project: String,
    host: Platform,
    target: Platform,
    toolchain: Toolchain,
    writer: NinjaWriter<W>,
}

impl<W: Write> Generator<W> {
    /// Construct platforms and toolchain from the options and write the
    /// graph preamble: required version, recorded arguments, resolved
    /// configuration, toolchain variables, rule templates.
    pub fn new(
        project: &str,
        dependlibs: &[String],
        libpaths: &[String],
        options: GeneratorOptions,
        out: W,
    ) -> Result<Self> {
        let target = Platform::from_token(options.target.as_deref())?;
        let host = Platform::from_token(options.host.as_deref())?;

        let toolchain = Toolchain::new(ToolchainSpec {
            project: project.to_string(),
            family: options.toolchain.clone(),
            host,
            target,
            archs: options.archs.clone(),
            configs: options.configs.clone(),
            includepaths: options.includepaths.clone(),
            dependlibs: dependlibs.to_vec(),
            libpaths: libpaths.to_vec(),
            variables: BuildVariables {
                monolithic: options.monolithic,
                coverage: options.coverage,
                bundle_identifier: options.bundle_identifier.clone(),
                extra: Vec::new(),
            },
            overrides: options.overrides.clone(),
            root: options.root.clone(),
        })?;

        let mut writer = NinjaWriter::new(out);
        writer.variable("ninja_required_version", "1.3")?;
        writer.newline()?;

        writer.comment("invocation arguments")?;
        writer.variable("configure_args", &quote_args(&options.args))?;
        writer.newline()?;

        writer.comment("configure options")?;
        writer.variable("configure_target", target.as_str())?;
        writer.variable("configure_host", host.as_str())?;
        writer.variable("configure_toolchain", toolchain.family().as_str())?;
        writer.variable("configure_archs", &join_display(toolchain.archs()))?;
        writer.variable("configure_configs", &join_display(toolchain.configs()))?;
        writer.variable("configure_includepaths", &options.includepaths.join(" "))?;
        if !toolchain.overrides().is_empty() {
            let env: Vec<String> = toolchain
                .overrides()
                .describe()
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            writer.variable("configure_env", &env.join(" "))?;
        }
        writer.newline()?;

        toolchain.write_variables(&mut writer)?;
        toolchain.write_rules(&mut writer)?;

        Ok(Self {
            project: project.to_string(),
            host,
            target,
            toolchain,
            writer,
        })
    }

    pub fn host(&self) -> Platform {
        self.host
    }

    pub fn target(&self) -> Platform {
        self.target
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Emit a static library; returns its final graph outputs.
    pub fn lib(&mut self, artifact: &ArtifactSpec) -> Result<Vec<String>> {
        self.toolchain.lib(&mut self.writer, artifact)
    }

    /// Emit an executable; returns its final graph outputs.
    pub fn bin(&mut self, artifact: &ArtifactSpec) -> Result<Vec<String>> {
        self.toolchain.bin(&mut self.writer, artifact)
    }

    /// Emit an application bundle; returns its final graph outputs.
    pub fn app(&mut self, artifact: &ArtifactSpec) -> Result<Vec<String>> {
        self.toolchain.app(&mut self.writer, artifact)
    }

    /// Include paths for locating shared test harness sources.
    pub fn test_includepaths(&self) -> Vec<String> {
        if self.project == "foundation" {
            vec!["test".to_string()]
        } else {
            vec!["test".to_string(), "../foundation_lib/test".to_string()]
        }
    }

    /// True when test cases aggregate into one binary, either by request
    /// or because the target requires single-binary packaging.
    pub fn test_monolithic(&self) -> bool {
        self.toolchain.is_monolithic() || self.target.requires_single_test_binary()
    }

    /// Emit the test suite.
    ///
    /// In monolithic mode the case source lists are concatenated into one
    /// `test-all` artifact (an app bundle on ios, an executable elsewhere)
    /// before the normal pipeline runs; otherwise each case becomes its
    /// own `test-<case>` executable.
    pub fn tests(&mut self, suite: &TestSuite) -> Result<Vec<String>> {
        let includepaths = self.test_includepaths();
        let includepaths: Vec<&str> = includepaths.iter().map(|s| s.as_str()).collect();
        let libs: Vec<&str> = suite.libs.iter().map(|s| s.as_str()).collect();

        if self.test_monolithic() {
            let sources: Vec<String> = suite
                .cases
                .iter()
                .flat_map(|case| {
                    case.sources
                        .iter()
                        .map(move |src| format!("{}/{}", case.name, src))
                })
                .collect();
            let sources: Vec<&str> = sources.iter().map(|s| s.as_str()).collect();
            let resources: Vec<&str> = suite.resources.iter().map(|s| s.as_str()).collect();
            let artifact = ArtifactSpec::new("", &sources)
                .with_binname("test-all")
                .with_basepath("test")
                .with_implicit_deps(&suite.implicit_deps)
                .with_libs(&libs)
                .with_resources(&resources)
                .with_includepaths(&includepaths);
            if self.target.is_ios() {
                self.app(&artifact)
            } else {
                self.bin(&artifact)
            }
        } else {
            let mut outputs = Vec::new();
            for case in &suite.cases {
                let sources: Vec<&str> = case.sources.iter().map(|s| s.as_str()).collect();
                let artifact = ArtifactSpec::new(&case.name, &sources)
                    .with_binname(&format!("test-{}", case.name))
                    .with_basepath("test")
                    .with_implicit_deps(&suite.implicit_deps)
                    .with_libs(&libs)
                    .with_includepaths(&includepaths);
                outputs.extend(self.bin(&artifact)?);
            }
            Ok(outputs)
        }
    }

    /// Counts of everything emitted so far.
    pub fn report(&self) -> GenerationReport {
        self.toolchain.report().clone()
    }
}

/// Shell-quote recorded invocation arguments so a reader can re-run them.
fn quote_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '\'') {
                arg.clone()
            } else {
                format!("'{}'", arg.replace('\'', "'\\''"))
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_display<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn options(root: &Path, target: &str) -> GeneratorOptions {
        GeneratorOptions {
            target: Some(target.to_string()),
            archs: vec!["x86-64".to_string()],
            args: vec![format!("--target={target}")],
            root: root.to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn recorded_arguments_with_spaces_are_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = Vec::new();
        let mut opts = options(dir.path(), "linux");
        opts.args = vec![
            "--target=linux".to_string(),
            "--define=NAME WITH SPACES".to_string(),
        ];
        Generator::new("window", &[], &[], opts, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(
            text.contains("configure_args = --target=linux '--define=NAME WITH SPACES'")
        );
    }

    fn suite(cases: &[TestCase]) -> TestSuite {
        TestSuite {
            cases: cases.to_vec(),
            libs: vec!["test".to_string(), "window".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn preamble_records_invocation_and_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = Vec::new();
        Generator::new(
            "window",
            &["foundation".to_string()],
            &[],
            options(dir.path(), "linux"),
            &mut buf,
        )
        .unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "ninja_required_version = 1.3");
        assert!(text.contains("configure_args = --target=linux"));
        assert!(text.contains("configure_target = linux"));
        assert!(text.contains("configure_toolchain = gcc"));
        assert!(text.contains("configure_archs = x86-64"));
        assert!(text.contains("configure_configs = release"));
        // Dependent-library include convention is resolved into variables.
        assert!(text.contains("-I../foundation_lib"));
        // Rules follow variables.
        let vars_at = text.find("cflags = ").unwrap();
        let rules_at = text.find("rule cc").unwrap();
        assert!(vars_at < rules_at);
    }

    #[test]
    fn captured_environment_appears_in_preamble() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path(), "linux");
        opts.overrides = EnvOverrides {
            cc: Some("/opt/cc".to_string()),
            linkflags: Some("-static".to_string()),
            ..Default::default()
        };
        let mut buf = Vec::new();
        Generator::new("window", &[], &[], opts, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("configure_env = CC=/opt/cc LINKFLAGS=-static"));
        assert!(text.contains("cc = /opt/cc"));
    }

    #[test]
    fn monolithic_flag_merges_test_cases_into_one_artifact() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "test/window/main.c");
        touch(dir.path(), "test/all/main.c");
        let mut opts = options(dir.path(), "linux");
        opts.monolithic = true;
        let mut buf = Vec::new();
        let mut generator = Generator::new("window", &[], &[], opts, &mut buf).unwrap();
        assert!(generator.test_monolithic());

        let cases = [
            TestCase::new("window", &["main.c"]),
            TestCase::new("all", &["main.c"]),
        ];
        generator.tests(&suite(&cases)).unwrap();
        let report = generator.report();
        assert_eq!(report.artifacts, 1);
        // Both case sources compile into the single artifact.
        assert_eq!(report.compile_edges, 2);
        assert_eq!(report.link_edges, 1);

        drop(generator);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("test/window/main.c"));
        assert!(text.contains("test/all/main.c"));
        assert!(text.contains("test-all"));
        assert!(!text.contains("test-window"));
    }

    #[test]
    fn android_target_forces_single_test_binary() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "test/window/main.c");
        touch(dir.path(), "test/all/main.c");
        let mut opts = options(dir.path(), "android");
        opts.archs = vec!["arm7".to_string()];
        let mut buf = Vec::new();
        let mut generator = Generator::new("window", &[], &[], opts, &mut buf).unwrap();
        assert!(generator.test_monolithic());

        let cases = [
            TestCase::new("window", &["main.c"]),
            TestCase::new("all", &["main.c"]),
        ];
        generator.tests(&suite(&cases)).unwrap();
        assert_eq!(generator.report().artifacts, 1);
    }

    #[test]
    fn desktop_target_builds_one_binary_per_case() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "test/window/main.c");
        touch(dir.path(), "test/event/main.c");
        let mut buf = Vec::new();
        let mut generator =
            Generator::new("window", &[], &[], options(dir.path(), "linux"), &mut buf).unwrap();
        assert!(!generator.test_monolithic());

        let cases = [
            TestCase::new("window", &["main.c"]),
            TestCase::new("event", &["main.c"]),
        ];
        let outputs = generator.tests(&suite(&cases)).unwrap();
        assert_eq!(generator.report().artifacts, 2);
        assert!(outputs
            .iter()
            .any(|o| o.ends_with("test-window")));
        assert!(outputs.iter().any(|o| o.ends_with("test-event")));
    }

    #[test]
    fn test_includepaths_convention() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = Vec::new();
        let generator =
            Generator::new("window", &[], &[], options(dir.path(), "linux"), &mut buf).unwrap();
        assert_eq!(
            generator.test_includepaths(),
            vec!["test", "../foundation_lib/test"]
        );

        let mut buf = Vec::new();
        let generator =
            Generator::new("foundation", &[], &[], options(dir.path(), "linux"), &mut buf)
                .unwrap();
        assert_eq!(generator.test_includepaths(), vec!["test"]);
    }

    #[test]
    fn unsupported_platform_token_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut buf = Vec::new();
        let err = Generator::new("window", &[], &[], options(dir.path(), "beos"), &mut buf)
            .unwrap_err();
        assert!(err.to_string().contains("unsupported platform 'beos'"));
    }

    #[test]
    fn regeneration_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "window/event.c");
        touch(dir.path(), "window/window.c");
        let emit = || {
            let mut buf = Vec::new();
            let mut generator = Generator::new(
                "window",
                &["foundation".to_string()],
                &[],
                options(dir.path(), "linux"),
                &mut buf,
            )
            .unwrap();
            let lib = ArtifactSpec::new("window", &["event.c", "window.c"]);
            generator.lib(&lib).unwrap();
            drop(generator);
            String::from_utf8(buf).unwrap()
        };
        assert_eq!(emit(), emit());
    }
}
