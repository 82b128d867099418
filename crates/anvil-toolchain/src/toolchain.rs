//! The toolchain: flag resolution and build-edge emission.
//!
//! A `Toolchain` is constructed once per generation pass from a
//! [`ToolchainSpec`], writes its global variables and rule templates to the
//! graph, and then translates artifact descriptions into compile, archive,
//! link, fusion, and packaging edges. Call order is a hard precondition:
//! `write_variables`, then `write_rules`, then any number of
//! `lib`/`bin`/`app` calls.

use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;

use anvil_platform::{Arch, BuildConfig, Platform};
use anvil_syntax::{NinjaWriter, RuleOptions};

use crate::artifact::ArtifactSpec;
use crate::error::{Result, ToolchainError};
use crate::family::ToolchainFamily;
use crate::report::GenerationReport;
use crate::spec::{BuildVariables, EnvOverrides, ToolchainSpec};

/// Toolchain for one (host, target, archs, configs) resolution.
#[derive(Debug)]
pub struct Toolchain {
    project: String,
    family: ToolchainFamily,
    host: Platform,
    target: Platform,
    archs: Vec<Arch>,
    configs: Vec<BuildConfig>,
    includepaths: Vec<String>,
    dependlibs: Vec<String>,
    libpaths: Vec<String>,
    variables: BuildVariables,
    overrides: EnvOverrides,
    root: PathBuf,
    /// Claimed graph outputs, keyed by path, valued by claiming module.
    outputs: HashMap<String, String>,
    report: GenerationReport,
}

impl Toolchain {
    /// Resolve a toolchain from its construction inputs.
    ///
    /// Empty architecture and configuration lists default to the host
    /// architecture and `release`; every token is validated against the
    /// supported sets.
    pub fn new(spec: ToolchainSpec) -> Result<Self> {
        let family = ToolchainFamily::resolve(spec.family.as_deref(), spec.target)?;

        let archs = if spec.archs.is_empty() {
            vec![Arch::host()]
        } else {
            spec.archs
                .iter()
                .map(|tok| tok.parse::<Arch>())
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        let configs = if spec.configs.is_empty() {
            vec![BuildConfig::Release]
        } else {
            spec.configs
                .iter()
                .map(|tok| tok.parse::<BuildConfig>())
                .collect::<std::result::Result<Vec<_>, _>>()?
        };

        Ok(Self {
            project: spec.project,
            family,
            host: spec.host,
            target: spec.target,
            archs,
            configs,
            includepaths: spec.includepaths,
            dependlibs: spec.dependlibs,
            libpaths: spec.libpaths,
            variables: spec.variables,
            overrides: spec.overrides,
            root: spec.root,
            outputs: HashMap::new(),
            report: GenerationReport::default(),
        })
    }

    pub fn family(&self) -> ToolchainFamily {
        self.family
    }

    pub fn host(&self) -> Platform {
        self.host
    }

    pub fn target(&self) -> Platform {
        self.target
    }

    pub fn archs(&self) -> &[Arch] {
        &self.archs
    }

    pub fn configs(&self) -> &[BuildConfig] {
        &self.configs
    }

    pub fn includepaths(&self) -> &[String] {
        &self.includepaths
    }

    pub fn is_monolithic(&self) -> bool {
        self.variables.monolithic
    }

    pub fn overrides(&self) -> &EnvOverrides {
        &self.overrides
    }

    /// Counts of everything emitted so far.
    pub fn report(&self) -> &GenerationReport {
        &self.report
    }

    /// True when multi-architecture outputs are fused into one universal
    /// binary per configuration. Fusion uses lipo, which only exists for
    /// the Mach-O targets; other platforms keep per-arch outputs.
    pub fn fuses_archs(&self) -> bool {
        self.archs.len() > 1 && self.target.is_apple()
    }

    // ------------------------------------------------------------------
    // Graph preamble
    // ------------------------------------------------------------------

    /// Emit one global variable per resolved setting, so build edges can
    /// reference them symbolically.
    pub fn write_variables<W: Write>(&self, writer: &mut NinjaWriter<W>) -> Result<()> {
        writer.variable("toolchain", self.family.as_str())?;
        writer.variable(
            "cc",
            self.overrides
                .cc
                .as_deref()
                .unwrap_or(self.family.default_cc()),
        )?;
        writer.variable(
            "ar",
            self.overrides
                .ar
                .as_deref()
                .unwrap_or(self.family.default_ar()),
        )?;
        writer.variable(
            "link",
            self.overrides
                .link
                .as_deref()
                .unwrap_or(self.family.default_link()),
        )?;

        let mut includes: Vec<String> = self.includepaths.clone();
        for lib in &self.dependlibs {
            includes.push(format!("../{lib}_lib"));
        }
        writer.variable("includepaths", &self.include_flags(&includes))?;
        writer.variable("libpaths", &self.libpath_flags(&self.libpaths))?;

        writer.variable("cflags", &self.base_cflags().join(" "))?;
        writer.variable("arflags", &self.base_arflags().join(" "))?;
        writer.variable("linkflags", &self.base_linkflags().join(" "))?;

        for config in &self.configs {
            writer.variable(
                &format!("cflags_{config}"),
                &self.config_cflags(*config).join(" "),
            )?;
            writer.variable(
                &format!("linkflags_{config}"),
                &self.config_linkflags(*config).join(" "),
            )?;
        }
        for arch in &self.archs {
            writer.variable(
                &format!("carchflags_{}", arch.ninja_name()),
                &self.arch_cflags(*arch).join(" "),
            )?;
            writer.variable(
                &format!("ararchflags_{}", arch.ninja_name()),
                &self.arch_arflags(*arch).join(" "),
            )?;
            writer.variable(
                &format!("linkarchflags_{}", arch.ninja_name()),
                &self.arch_linkflags(*arch).join(" "),
            )?;
        }

        // Per-edge override slots, defined empty so that every variable a
        // rule references exists before its first use.
        for slot in [
            "moreincludepaths",
            "carchflags",
            "cconfigflags",
            "ararchflags",
            "linkarchflags",
            "linkconfigflags",
            "archlibpaths",
            "libs",
            "frameworks",
            "outdir",
        ] {
            writer.variable(slot, "")?;
        }
        writer.variable(
            "bundleidentifier",
            self.variables.bundle_identifier.as_deref().unwrap_or(""),
        )?;
        writer.newline()?;
        Ok(())
    }

    /// Emit the compile/archive/link rule templates for the resolved
    /// family, plus fusion and packaging rules where the target supports
    /// them.
    pub fn write_rules<W: Write>(&self, writer: &mut NinjaWriter<W>) -> Result<()> {
        if self.family.uses_gcc_deps() {
            writer.rule(
                "cc",
                "$cc -MMD -MF $out.d $includepaths $moreincludepaths $cflags \
                 $carchflags $cconfigflags -c $in -o $out",
                &RuleOptions {
                    description: Some("CC $out".to_string()),
                    depfile: Some("$out.d".to_string()),
                    deps: Some("gcc".to_string()),
                    ..Default::default()
                },
            )?;
            writer.rule(
                "ar",
                "rm -f $out && $ar crs $ararchflags $arflags $out $in",
                &RuleOptions {
                    description: Some("AR $out".to_string()),
                    ..Default::default()
                },
            )?;
            writer.rule(
                "link",
                "$link $archlibpaths $libpaths $linkarchflags $linkconfigflags \
                 $linkflags -o $out $in $libs $frameworks",
                &RuleOptions {
                    description: Some("LINK $out".to_string()),
                    ..Default::default()
                },
            )?;
        } else {
            writer.rule(
                "cc",
                "$cc /showIncludes $includepaths $moreincludepaths $cflags \
                 $carchflags $cconfigflags /c $in /Fo$out",
                &RuleOptions {
                    description: Some("CC $out".to_string()),
                    deps: Some("msvc".to_string()),
                    ..Default::default()
                },
            )?;
            writer.rule(
                "ar",
                "$ar /nologo $ararchflags $arflags /OUT:$out $in",
                &RuleOptions {
                    description: Some("LIB $out".to_string()),
                    ..Default::default()
                },
            )?;
            writer.rule(
                "link",
                "$link /nologo $archlibpaths $libpaths $linkarchflags \
                 $linkconfigflags $linkflags /OUT:$out $in $libs",
                &RuleOptions {
                    description: Some("LINK $out".to_string()),
                    ..Default::default()
                },
            )?;
        }

        if self.target.is_apple() {
            writer.rule(
                "lipo",
                "lipo -create -output $out $in",
                &RuleOptions {
                    description: Some("LIPO $out".to_string()),
                    ..Default::default()
                },
            )?;
            writer.rule(
                "copy",
                "cp -f $in $out",
                &RuleOptions {
                    description: Some("COPY $out".to_string()),
                    ..Default::default()
                },
            )?;
            writer.rule(
                "plist",
                "sed -e s/\\$$(BUNDLE_IDENTIFIER)/$bundleidentifier/g $in | \
                 plutil -convert binary1 -o $out -",
                &RuleOptions {
                    description: Some("PLIST $out".to_string()),
                    ..Default::default()
                },
            )?;
            writer.rule(
                "xcassets",
                "actool --output-format human-readable-text --compile $outdir $in",
                &RuleOptions {
                    description: Some("XCASSETS $out".to_string()),
                    ..Default::default()
                },
            )?;
        }
        writer.newline()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Artifact emission
    // ------------------------------------------------------------------

    /// Emit a static library: per (arch × config) one compile edge per
    /// source and one archive edge, plus one fusion edge per configuration
    /// when multiple architectures fuse. Returns the final library graph
    /// paths for use as implicit deps of other artifacts.
    pub fn lib<W: Write>(
        &mut self,
        writer: &mut NinjaWriter<W>,
        artifact: &ArtifactSpec,
    ) -> Result<Vec<String>> {
        self.check_sources(artifact)?;
        let configs = self.artifact_configs(artifact);
        if configs.is_empty() {
            return Ok(Vec::new());
        }
        let name = self.family.staticlib_name(artifact.output_name());
        let mut outputs = Vec::new();
        for config in configs {
            let mut archlibs = Vec::new();
            for arch in self.archs.clone() {
                let objs = self.compile_sources(writer, artifact, config, arch)?;
                let lib = format!("{}/{}", self.libdir(config, Some(arch)), name);
                self.claim_output(&lib, artifact.display_name())?;
                writer.build(
                    &[lib.clone()],
                    "ar",
                    &objs,
                    &[],
                    &[],
                    &[(
                        "ararchflags".to_string(),
                        format!("$ararchflags_{}", arch.ninja_name()),
                    )],
                )?;
                self.report.archive_edges += 1;
                archlibs.push(lib);
            }
            if self.fuses_archs() {
                let fused = format!("{}/{}", self.libdir(config, None), name);
                self.fuse(writer, &archlibs, &fused, artifact.display_name())?;
                outputs.push(fused);
            } else {
                outputs.extend(archlibs);
            }
        }
        self.report.artifacts += 1;
        Ok(outputs)
    }

    /// Emit an executable: per (arch × config) compile edges and one link
    /// edge, plus fusion when applicable. Never emits packaging edges.
    pub fn bin<W: Write>(
        &mut self,
        writer: &mut NinjaWriter<W>,
        artifact: &ArtifactSpec,
    ) -> Result<Vec<String>> {
        self.check_sources(artifact)?;
        let configs = self.artifact_configs(artifact);
        if configs.is_empty() {
            return Ok(Vec::new());
        }
        let name = self.family.binname(artifact.output_name());
        let mut outputs = Vec::new();
        for config in configs {
            let mut archbins = Vec::new();
            for arch in self.archs.clone() {
                let objs = self.compile_sources(writer, artifact, config, arch)?;
                let bin = format!("{}/{}", self.bindir(config, Some(arch)), name);
                self.link_edge(writer, artifact, config, arch, &objs, &bin)?;
                archbins.push(bin);
            }
            if self.fuses_archs() {
                let fused = format!("{}/{}", self.bindir(config, None), name);
                self.fuse(writer, &archbins, &fused, artifact.display_name())?;
                outputs.push(fused);
            } else {
                outputs.extend(archbins);
            }
        }
        self.report.artifacts += 1;
        Ok(outputs)
    }

    /// Emit an application bundle: the `bin` pipeline into the bundle
    /// executable location, one packaging edge per resource, and one
    /// bundle-manifest edge. On targets without bundle conventions this
    /// degrades to plain `bin` semantics.
    pub fn app<W: Write>(
        &mut self,
        writer: &mut NinjaWriter<W>,
        artifact: &ArtifactSpec,
    ) -> Result<Vec<String>> {
        if !self.target.is_apple() {
            return self.bin(writer, artifact);
        }
        self.check_sources(artifact)?;
        let configs = self.artifact_configs(artifact);
        if configs.is_empty() {
            return Ok(Vec::new());
        }
        let name = self.family.binname(artifact.output_name());
        let mut outputs = Vec::new();
        for config in configs {
            let bundle = format!("{}/{}.app", self.bindir(config, None), artifact.output_name());
            let exe = format!("{bundle}/{name}");
            if self.archs.len() == 1 {
                let arch = self.archs[0];
                let objs = self.compile_sources(writer, artifact, config, arch)?;
                self.link_edge(writer, artifact, config, arch, &objs, &exe)?;
            } else {
                let mut archbins = Vec::new();
                for arch in self.archs.clone() {
                    let objs = self.compile_sources(writer, artifact, config, arch)?;
                    let staged = format!("{}/{}", self.bindir(config, Some(arch)), name);
                    self.link_edge(writer, artifact, config, arch, &objs, &staged)?;
                    archbins.push(staged);
                }
                self.fuse(writer, &archbins, &exe, artifact.display_name())?;
            }

            for resource in &artifact.resources {
                let src = self.source_rel(artifact, resource);
                if resource.ends_with(".plist") {
                    // The bundle manifest assembly step.
                    let out = format!("{bundle}/Info.plist");
                    self.claim_output(&out, artifact.display_name())?;
                    writer.build(&[out], "plist", &[src], &[], &[], &[])?;
                } else if resource.ends_with(".xcassets") {
                    let out = format!("{bundle}/Assets.car");
                    self.claim_output(&out, artifact.display_name())?;
                    writer.build(
                        &[out],
                        "xcassets",
                        &[src],
                        &[],
                        &[],
                        &[("outdir".to_string(), bundle.clone())],
                    )?;
                } else {
                    let filename = resource.rsplit('/').next().unwrap_or(resource.as_str());
                    let out = format!("{bundle}/{filename}");
                    self.claim_output(&out, artifact.display_name())?;
                    writer.build(&[out], "copy", &[src], &[], &[], &[])?;
                }
                self.report.package_edges += 1;
            }
            outputs.push(exe);
        }
        self.report.artifacts += 1;
        Ok(outputs)
    }

    // ------------------------------------------------------------------
    // Emission internals
    // ------------------------------------------------------------------

    fn compile_sources<W: Write>(
        &mut self,
        writer: &mut NinjaWriter<W>,
        artifact: &ArtifactSpec,
        config: BuildConfig,
        arch: Arch,
    ) -> Result<Vec<String>> {
        let objdir = self.objdir(artifact, config, arch);
        let mut vars = vec![
            (
                "carchflags".to_string(),
                format!("$carchflags_{}", arch.ninja_name()),
            ),
            ("cconfigflags".to_string(), format!("$cflags_{config}")),
        ];
        if !artifact.includepaths.is_empty() {
            vars.push((
                "moreincludepaths".to_string(),
                self.include_flags(&artifact.includepaths),
            ));
        }

        let mut objs = Vec::new();
        for source in &artifact.sources {
            let src = self.source_rel(artifact, source);
            let obj = format!("{}/{}", objdir, self.family.objname(&strip_extension(source)));
            self.claim_output(&obj, artifact.display_name())?;
            writer.build(&[obj.clone()], "cc", &[src], &[], &[], &vars)?;
            self.report.compile_edges += 1;
            objs.push(obj);
        }
        Ok(objs)
    }

    fn link_edge<W: Write>(
        &mut self,
        writer: &mut NinjaWriter<W>,
        artifact: &ArtifactSpec,
        config: BuildConfig,
        arch: Arch,
        objs: &[String],
        output: &str,
    ) -> Result<()> {
        self.claim_output(output, artifact.display_name())?;
        let mut vars = vec![
            (
                "linkarchflags".to_string(),
                format!("$linkarchflags_{}", arch.ninja_name()),
            ),
            ("linkconfigflags".to_string(), format!("$linkflags_{config}")),
        ];
        let mut searchpaths = vec![self.libdir(config, Some(arch))];
        if self.fuses_archs() {
            searchpaths.push(self.libdir(config, None));
        }
        vars.push(("archlibpaths".to_string(), self.libpath_flags(&searchpaths)));

        let libs: Vec<String> = artifact
            .libs
            .iter()
            .chain(artifact.extralibs.iter())
            .map(|lib| self.lib_flag(lib))
            .collect();
        if !libs.is_empty() {
            vars.push(("libs".to_string(), libs.join(" ")));
        }
        if self.target.is_apple() && !artifact.frameworks.is_empty() {
            let frameworks: Vec<String> = artifact
                .frameworks
                .iter()
                .map(|f| format!("-framework {f}"))
                .collect();
            vars.push(("frameworks".to_string(), frameworks.join(" ")));
        }

        writer.build(
            &[output.to_string()],
            "link",
            objs,
            &artifact.implicit_deps,
            &[],
            &vars,
        )?;
        self.report.link_edges += 1;
        Ok(())
    }

    fn fuse<W: Write>(
        &mut self,
        writer: &mut NinjaWriter<W>,
        inputs: &[String],
        output: &str,
        module: &str,
    ) -> Result<()> {
        self.claim_output(output, module)?;
        writer.build(&[output.to_string()], "lipo", inputs, &[], &[], &[])?;
        self.report.fuse_edges += 1;
        Ok(())
    }

    /// Record an output path, failing when another artifact already
    /// produces it.
    fn claim_output(&mut self, output: &str, module: &str) -> Result<()> {
        if let Some(first) = self.outputs.insert(output.to_string(), module.to_string()) {
            return Err(ToolchainError::ConflictingOutput {
                output: output.to_string(),
                first,
                second: module.to_string(),
            });
        }
        Ok(())
    }

    /// Verify every declared source and resource exists before emitting
    /// any edge for this artifact.
    fn check_sources(&self, artifact: &ArtifactSpec) -> Result<()> {
        for file in artifact.sources.iter().chain(artifact.resources.iter()) {
            let rel = self.source_rel(artifact, file);
            if !self.root.join(&rel).exists() {
                return Err(ToolchainError::MissingSource {
                    path: PathBuf::from(rel),
                });
            }
        }
        Ok(())
    }

    /// Configurations an artifact builds for: its override restricted to
    /// the requested set, or the full requested set when unspecified.
    fn artifact_configs(&self, artifact: &ArtifactSpec) -> Vec<BuildConfig> {
        if artifact.configs.is_empty() {
            self.configs.clone()
        } else {
            artifact
                .configs
                .iter()
                .filter(|c| self.configs.contains(c))
                .copied()
                .collect()
        }
    }

    // ------------------------------------------------------------------
    // Path layout
    // ------------------------------------------------------------------

    fn source_rel(&self, artifact: &ArtifactSpec, file: &str) -> String {
        let mut parts = Vec::new();
        if let Some(basepath) = &artifact.basepath {
            parts.push(basepath.as_str());
        }
        if !artifact.module.is_empty() {
            parts.push(&artifact.module);
        }
        parts.push(file);
        parts.join("/")
    }

    fn objdir(&self, artifact: &ArtifactSpec, config: BuildConfig, arch: Arch) -> String {
        let mut parts = vec!["obj".to_string(), config.to_string(), arch.to_string()];
        if let Some(basepath) = &artifact.basepath {
            parts.push(basepath.clone());
        }
        parts.push(artifact.display_name().to_string());
        parts.join("/")
    }

    fn libdir(&self, config: BuildConfig, arch: Option<Arch>) -> String {
        match arch {
            Some(arch) => format!("lib/{}/{}/{}", self.target, config, arch),
            None => format!("lib/{}/{}", self.target, config),
        }
    }

    fn bindir(&self, config: BuildConfig, arch: Option<Arch>) -> String {
        match arch {
            Some(arch) => format!("bin/{}/{}/{}", self.target, config, arch),
            None => format!("bin/{}/{}", self.target, config),
        }
    }

    // ------------------------------------------------------------------
    // Flag resolution
    // ------------------------------------------------------------------

    fn project_define(&self) -> String {
        let ident: String = self
            .project
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{ident}_COMPILE=1")
    }

    fn include_flags(&self, paths: &[String]) -> String {
        let prefix = if self.family.uses_gcc_deps() { "-I" } else { "/I" };
        paths
            .iter()
            .map(|p| format!("{prefix}{p}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn libpath_flags(&self, paths: &[String]) -> String {
        paths
            .iter()
            .map(|p| {
                if self.family.uses_gcc_deps() {
                    format!("-L{p}")
                } else {
                    format!("/LIBPATH:{p}")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn lib_flag(&self, lib: &str) -> String {
        if self.family.uses_gcc_deps() {
            format!("-l{lib}")
        } else {
            format!("{lib}.lib")
        }
    }

    fn base_cflags(&self) -> Vec<String> {
        let mut flags: Vec<String> = if self.family.uses_gcc_deps() {
            vec![
                format!("-D{}", self.project_define()),
                "-funit-at-a-time".to_string(),
                "-fstrict-aliasing".to_string(),
                "-fno-math-errno".to_string(),
                "-ffinite-math-only".to_string(),
                "-funsafe-math-optimizations".to_string(),
                "-fno-trapping-math".to_string(),
                "-ffast-math".to_string(),
                "-W".to_string(),
                "-Wall".to_string(),
                "-Werror".to_string(),
            ]
        } else {
            vec![
                format!("/D{}", self.project_define()),
                "/W4".to_string(),
                "/WX".to_string(),
                "/Zi".to_string(),
                "/Oi".to_string(),
                "/fp:fast".to_string(),
            ]
        };
        if self.variables.coverage && self.family.uses_gcc_deps() {
            flags.push("-fprofile-arcs".to_string());
            flags.push("-ftest-coverage".to_string());
        }
        flags.extend(self.variables.extra_for("cflags"));
        if let Some(cflags) = &self.overrides.cflags {
            flags.push(cflags.clone());
        }
        flags
    }

    fn base_arflags(&self) -> Vec<String> {
        let mut flags = self.variables.extra_for("arflags");
        if let Some(arflags) = &self.overrides.arflags {
            flags.push(arflags.clone());
        }
        flags
    }

    fn base_linkflags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        if self.variables.coverage && self.family.uses_gcc_deps() {
            flags.push("--coverage".to_string());
        }
        flags.extend(self.variables.extra_for("linkflags"));
        if let Some(linkflags) = &self.overrides.linkflags {
            flags.push(linkflags.clone());
        }
        flags
    }

    fn config_cflags(&self, config: BuildConfig) -> Vec<String> {
        let flags: &[&str] = if self.family.uses_gcc_deps() {
            match config {
                BuildConfig::Debug => &["-O0", "-g", "-DBUILD_DEBUG=1"],
                BuildConfig::Release => &["-O3", "-g", "-funroll-loops", "-DBUILD_RELEASE=1"],
                BuildConfig::Profile => &["-O3", "-g", "-DBUILD_PROFILE=1"],
                BuildConfig::Deploy => &["-O3", "-DBUILD_DEPLOY=1"],
            }
        } else {
            match config {
                BuildConfig::Debug => &["/Od", "/MDd", "/DBUILD_DEBUG=1"],
                BuildConfig::Release => &["/O2", "/Ob2", "/Ot", "/GL", "/MD", "/DBUILD_RELEASE=1"],
                BuildConfig::Profile => &["/O2", "/Ob2", "/Ot", "/GL", "/MD", "/DBUILD_PROFILE=1"],
                BuildConfig::Deploy => &["/O2", "/Ob2", "/Ot", "/GL", "/MD", "/DBUILD_DEPLOY=1"],
            }
        };
        flags.iter().map(|f| f.to_string()).collect()
    }

    fn config_linkflags(&self, config: BuildConfig) -> Vec<String> {
        if self.family.uses_gcc_deps() {
            match config {
                // Strip symbols from distribution binaries.
                BuildConfig::Deploy if !self.target.is_apple() => vec!["-Wl,-s".to_string()],
                BuildConfig::Deploy => vec!["-Wl,-dead_strip".to_string()],
                _ => Vec::new(),
            }
        } else {
            match config {
                BuildConfig::Debug => vec!["/DEBUG".to_string()],
                _ => vec!["/LTCG".to_string()],
            }
        }
    }

    fn arch_cflags(&self, arch: Arch) -> Vec<String> {
        if !self.family.uses_gcc_deps() {
            return Vec::new();
        }
        if self.target.is_apple() {
            let name = match arch {
                Arch::X86 => "i386",
                Arch::X86_64 => "x86_64",
                Arch::Arm6 => "armv6",
                Arch::Arm7 => "armv7",
                Arch::Arm64 => "arm64",
                _ => return Vec::new(),
            };
            vec!["-arch".to_string(), name.to_string()]
        } else {
            match arch {
                Arch::X86 => vec!["-m32".to_string()],
                Arch::X86_64 => vec!["-m64".to_string()],
                Arch::Mips => vec!["-mabi=32".to_string()],
                Arch::Mips64 => vec!["-mabi=64".to_string()],
                _ => Vec::new(),
            }
        }
    }

    fn arch_arflags(&self, arch: Arch) -> Vec<String> {
        if self.family.uses_gcc_deps() {
            Vec::new()
        } else {
            match arch {
                Arch::X86 => vec!["/MACHINE:X86".to_string()],
                Arch::X86_64 => vec!["/MACHINE:X64".to_string()],
                _ => Vec::new(),
            }
        }
    }

    fn arch_linkflags(&self, arch: Arch) -> Vec<String> {
        if self.family.uses_gcc_deps() {
            self.arch_cflags(arch)
        } else {
            self.arch_arflags(arch)
        }
    }
}

/// Strip the file extension from a source path, keeping any directory
/// components.
fn strip_extension(source: &str) -> String {
    let dir_end = source.rfind('/').map_or(0, |i| i + 1);
    match source[dir_end..].rfind('.') {
        Some(dot) if dot > 0 => source[..dir_end + dot].to_string(),
        _ => source.to_string(),
    }
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

    fn spec_with(root: &Path, target: Platform) -> ToolchainSpec {
        let mut spec = ToolchainSpec::new("window", Platform::host(), target);
        spec.root = root.to_path_buf();
        spec
    }

    fn render<F>(toolchain: &mut Toolchain, emit: F) -> String
    where
        F: FnOnce(&mut Toolchain, &mut NinjaWriter<&mut Vec<u8>>) -> Result<()>,
    {
        let mut buf = Vec::new();
        let mut writer = NinjaWriter::new(&mut buf);
        toolchain.write_variables(&mut writer).unwrap();
        toolchain.write_rules(&mut writer).unwrap();
        emit(toolchain, &mut writer).unwrap();
        String::from_utf8(buf).unwrap()
    }

    /// Build lines, unwrapped from ` $` continuations.
    fn edges(text: &str) -> Vec<String> {
        text.replace(" $\n", " ")
            .lines()
            .filter(|l| l.starts_with("build "))
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn archive_inputs_are_exactly_the_compile_outputs() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "window/a.c");
        touch(dir.path(), "window/b.c");
        let mut spec = spec_with(dir.path(), Platform::Linux);
        spec.archs = vec!["x86-64".to_string()];
        spec.configs = vec!["release".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();

        let artifact = ArtifactSpec::new("window", &["a.c", "b.c"]);
        let text = render(&mut tc, |tc, w| tc.lib(w, &artifact).map(|_| ()));

        let edges = edges(&text);
        let compiles: Vec<&String> = edges.iter().filter(|e| e.contains(": cc ")).collect();
        assert_eq!(compiles.len(), 2);
        let archives: Vec<&String> = edges.iter().filter(|e| e.contains(": ar ")).collect();
        assert_eq!(archives.len(), 1);
        let archive = archives[0];
        assert!(archive.starts_with("build lib/linux/release/x86-64/libwindow.a: ar "));
        assert!(archive.contains("obj/release/x86-64/window/a.o"));
        assert!(archive.contains("obj/release/x86-64/window/b.o"));
        assert_eq!(tc.report().compile_edges, 2);
        assert_eq!(tc.report().archive_edges, 1);
        assert_eq!(tc.report().fuse_edges, 0);
    }

    #[test]
    fn lib_returns_outputs_for_implicit_deps() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "window/a.c");
        let mut spec = spec_with(dir.path(), Platform::Linux);
        spec.archs = vec!["x86-64".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();

        let artifact = ArtifactSpec::new("window", &["a.c"]);
        let mut buf = Vec::new();
        let mut writer = NinjaWriter::new(&mut buf);
        let outputs = tc.lib(&mut writer, &artifact).unwrap();
        assert_eq!(outputs, vec!["lib/linux/release/x86-64/libwindow.a"]);
    }

    #[test]
    fn disjoint_config_restriction_emits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "window/a.c");
        let mut spec = spec_with(dir.path(), Platform::Linux);
        spec.archs = vec!["x86-64".to_string()];
        spec.configs = vec!["release".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();

        let artifact = ArtifactSpec::new("window", &["a.c"]).with_configs(&[BuildConfig::Deploy]);
        let mut buf = Vec::new();
        let mut writer = NinjaWriter::new(&mut buf);
        let outputs = tc.lib(&mut writer, &artifact).unwrap();
        assert!(outputs.is_empty());
        assert!(buf.is_empty());
        assert_eq!(tc.report().artifacts, 0);
    }

    #[test]
    fn two_archs_fuse_once_per_config_on_apple() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "window/a.c");
        let mut spec = spec_with(dir.path(), Platform::Macos);
        spec.archs = vec!["x86-64".to_string(), "arm64".to_string()];
        spec.configs = vec!["debug".to_string(), "release".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();

        let artifact = ArtifactSpec::new("window", &["a.c"]);
        let text = render(&mut tc, |tc, w| tc.lib(w, &artifact).map(|_| ()));

        let edges = edges(&text);
        assert_eq!(edges.iter().filter(|e| e.contains(": cc ")).count(), 4);
        assert_eq!(edges.iter().filter(|e| e.contains(": ar ")).count(), 4);
        let fuses: Vec<&String> = edges.iter().filter(|e| e.contains(": lipo ")).collect();
        assert_eq!(fuses.len(), 2);
        assert!(fuses
            .iter()
            .any(|e| e.starts_with("build lib/macos/debug/libwindow.a: lipo ")));
        assert!(fuses
            .iter()
            .any(|e| e.starts_with("build lib/macos/release/libwindow.a: lipo ")));
    }

    #[test]
    fn single_arch_emits_no_fuse_edge() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "window/a.c");
        let mut spec = spec_with(dir.path(), Platform::Macos);
        spec.archs = vec!["arm64".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();

        let artifact = ArtifactSpec::new("window", &["a.c"]);
        let text = render(&mut tc, |tc, w| tc.lib(w, &artifact).map(|_| ()));
        assert!(!edges(&text).iter().any(|e| e.contains(": lipo ")));
        assert_eq!(tc.report().fuse_edges, 0);
    }

    #[test]
    fn unsupported_arch_fails_construction() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = spec_with(dir.path(), Platform::Linux);
        spec.archs = vec!["sparc".to_string()];
        let err = Toolchain::new(spec).unwrap_err();
        assert!(matches!(
            err,
            ToolchainError::Platform(anvil_platform::PlatformError::UnsupportedArchitecture {
                ref token,
                ..
            }) if token == "sparc"
        ));
    }

    #[test]
    fn missing_source_emits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "window/a.c");
        let mut spec = spec_with(dir.path(), Platform::Linux);
        spec.archs = vec!["x86-64".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();

        let artifact = ArtifactSpec::new("window", &["a.c", "gone.c"]);
        let mut buf = Vec::new();
        let mut writer = NinjaWriter::new(&mut buf);
        let err = tc.lib(&mut writer, &artifact).unwrap_err();
        assert!(matches!(
            err,
            ToolchainError::MissingSource { ref path } if path.ends_with("window/gone.c")
        ));
        assert!(buf.is_empty());
        assert_eq!(tc.report().total_edges(), 0);
    }

    #[test]
    fn conflicting_outputs_name_both_modules() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "test/first/main.c");
        touch(dir.path(), "test/second/main.c");
        let mut spec = spec_with(dir.path(), Platform::Linux);
        spec.archs = vec!["x86-64".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();

        let mut buf = Vec::new();
        let mut writer = NinjaWriter::new(&mut buf);
        let first = ArtifactSpec::new("first", &["main.c"])
            .with_basepath("test")
            .with_binname("test-all");
        let second = ArtifactSpec::new("second", &["main.c"])
            .with_basepath("test")
            .with_binname("test-all");
        tc.bin(&mut writer, &first).unwrap();
        let err = tc.bin(&mut writer, &second).unwrap_err();
        match err {
            ToolchainError::ConflictingOutput {
                output,
                first,
                second,
            } => {
                assert_eq!(output, "bin/linux/release/x86-64/test-all");
                assert_eq!(first, "first");
                assert_eq!(second, "second");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bin_emits_no_packaging_edges() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "tools/blast/main.c");
        let mut spec = spec_with(dir.path(), Platform::Linux);
        spec.archs = vec!["x86-64".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();

        let artifact = ArtifactSpec::new("blast", &["main.c"])
            .with_basepath("tools")
            .with_libs(&["window", "foundation"]);
        let text = render(&mut tc, |tc, w| tc.bin(w, &artifact).map(|_| ()));
        let edges = edges(&text);
        assert!(!edges
            .iter()
            .any(|e| e.contains(": copy ") || e.contains(": plist ") || e.contains(": xcassets ")));
        assert_eq!(tc.report().package_edges, 0);
        // Requested libraries appear on the link edge variables.
        assert!(text.contains("libs = -lwindow -lfoundation"));
    }

    #[test]
    fn app_packages_resources_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "test/all/main.c");
        touch(dir.path(), "test/all/ios/test-all.plist");
        touch(dir.path(), "test/all/ios/Images.xcassets");
        touch(dir.path(), "test/all/ios/test-all.xib");
        let mut spec = spec_with(dir.path(), Platform::Ios);
        spec.archs = vec!["arm64".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();

        let artifact = ArtifactSpec::new("all", &["main.c"])
            .with_basepath("test")
            .with_binname("test-all")
            .with_resources(&[
                "ios/test-all.plist",
                "ios/Images.xcassets",
                "ios/test-all.xib",
            ]);
        let text = render(&mut tc, |tc, w| tc.app(w, &artifact).map(|_| ()));
        let edges = edges(&text);
        assert_eq!(edges.iter().filter(|e| e.contains(": plist ")).count(), 1);
        assert_eq!(edges.iter().filter(|e| e.contains(": xcassets ")).count(), 1);
        assert_eq!(edges.iter().filter(|e| e.contains(": copy ")).count(), 1);
        assert!(edges
            .iter()
            .any(|e| e.starts_with("build bin/ios/release/test-all.app/Info.plist: plist ")));
        assert_eq!(tc.report().package_edges, 3);
    }

    #[test]
    fn app_on_non_apple_degrades_to_bin() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "test/all/main.c");
        let mut spec = spec_with(dir.path(), Platform::Android);
        spec.archs = vec!["arm7".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();

        let artifact = ArtifactSpec::new("all", &["main.c"])
            .with_basepath("test")
            .with_binname("test-all");
        let text = render(&mut tc, |tc, w| tc.app(w, &artifact).map(|_| ()));
        let edges = edges(&text);
        assert!(edges.iter().any(|e| e.contains(": link ")));
        assert!(!edges.iter().any(|e| e.contains(": plist ")));
        assert_eq!(tc.report().link_edges, 1);
    }

    #[test]
    fn environment_overrides_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = spec_with(dir.path(), Platform::Linux);
        spec.overrides = EnvOverrides {
            cc: Some("/opt/cross/bin/cc".to_string()),
            cflags: Some("-mtune=native".to_string()),
            ..Default::default()
        };
        let tc = Toolchain::new(spec).unwrap();

        let mut buf = Vec::new();
        let mut writer = NinjaWriter::new(&mut buf);
        tc.write_variables(&mut writer).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("cc = /opt/cross/bin/cc\n"));
        // Override flags come after every computed flag.
        let cflags_line = text
            .lines()
            .find(|l| l.starts_with("cflags = "))
            .unwrap();
        assert!(cflags_line.ends_with("-mtune=native"));
    }

    #[test]
    fn empty_lists_default_to_host_arch_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let spec = spec_with(dir.path(), Platform::Linux);
        let tc = Toolchain::new(spec).unwrap();
        assert_eq!(tc.archs(), &[Arch::host()]);
        assert_eq!(tc.configs(), &[BuildConfig::Release]);
    }

    #[test]
    fn regeneration_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "window/a.c");
        let emit = || {
            let mut spec = spec_with(dir.path(), Platform::Linux);
            spec.archs = vec!["x86".to_string(), "x86-64".to_string()];
            spec.configs = vec!["debug".to_string(), "release".to_string()];
            let mut tc = Toolchain::new(spec).unwrap();
            let artifact = ArtifactSpec::new("window", &["a.c"]);
            render(&mut tc, |tc, w| tc.lib(w, &artifact).map(|_| ()))
        };
        assert_eq!(emit(), emit());
    }

    #[test]
    fn every_referenced_variable_is_defined_before_use() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "window/a.c");
        touch(dir.path(), "test/all/main.c");
        let mut spec = spec_with(dir.path(), Platform::Macos);
        spec.archs = vec!["x86-64".to_string(), "arm64".to_string()];
        spec.configs = vec!["debug".to_string(), "deploy".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();

        let text = render(&mut tc, |tc, w| {
            let lib = ArtifactSpec::new("window", &["a.c"]);
            let outs = tc.lib(w, &lib)?;
            let bin = ArtifactSpec::new("all", &["main.c"])
                .with_basepath("test")
                .with_binname("test-all")
                .with_implicit_deps(&outs)
                .with_libs(&["window"]);
            tc.bin(w, &bin).map(|_| ())
        });

        let mut defined = std::collections::HashSet::new();
        for builtin in ["in", "out"] {
            defined.insert(builtin.to_string());
        }
        let unwrapped = text.replace(" $\n", " ");
        for line in unwrapped.lines() {
            let trimmed = line.trim_start();
            // References on this line must already be defined.
            let mut rest = trimmed;
            while let Some(pos) = rest.find('$') {
                rest = &rest[pos + 1..];
                if rest.starts_with('$') || rest.starts_with(' ') || rest.starts_with(':') {
                    rest = &rest[1..];
                    continue;
                }
                let name: String = rest
                    .chars()
                    .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                    .collect();
                if !name.is_empty() {
                    assert!(
                        defined.contains(&name),
                        "variable ${name} referenced before definition in: {trimmed}"
                    );
                }
            }
            // Definitions become visible for subsequent lines.
            if let Some(eq) = trimmed.find(" = ") {
                let name = &trimmed[..eq];
                if !name.contains(' ') {
                    defined.insert(name.to_string());
                }
            } else if let Some(stripped) = trimmed.strip_suffix(" =") {
                if !stripped.contains(' ') {
                    defined.insert(stripped.to_string());
                }
            }
        }
    }

    #[test]
    fn msvc_names_and_rules() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "window/a.c");
        let mut spec = spec_with(dir.path(), Platform::Windows);
        spec.archs = vec!["x86-64".to_string()];
        let mut tc = Toolchain::new(spec).unwrap();
        assert_eq!(tc.family(), ToolchainFamily::Msvc);

        let artifact = ArtifactSpec::new("window", &["a.c"]);
        let text = render(&mut tc, |tc, w| tc.lib(w, &artifact).map(|_| ()));
        assert!(text.contains("/showIncludes"));
        assert!(text.contains("deps = msvc"));
        let edges = edges(&text);
        assert!(edges
            .iter()
            .any(|e| e.starts_with("build lib/windows/release/x86-64/window.lib: ar ")));
        assert!(edges
            .iter()
            .any(|e| e.contains("obj/release/x86-64/window/a.obj")));
    }

    #[test]
    fn coverage_instruments_compile_and_link() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = spec_with(dir.path(), Platform::Linux);
        spec.variables.coverage = true;
        let tc = Toolchain::new(spec).unwrap();

        let mut buf = Vec::new();
        let mut writer = NinjaWriter::new(&mut buf);
        tc.write_variables(&mut writer).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("-fprofile-arcs -ftest-coverage"));
        assert!(text.contains("linkflags = --coverage"));
    }
}
