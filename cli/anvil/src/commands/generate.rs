//! `anvil generate` — load the manifest, resolve the toolchain, emit
//! `build.ninja`.

use std::collections::HashMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use anvil_gen::{Generator, GeneratorOptions, TestCase, TestSuite};
use anvil_platform::BuildConfig;
use anvil_toolchain::{ArtifactSpec, EnvOverrides, GenerationReport};

use crate::manifest::{AnvilManifest, BinConfig};

/// Capture the executable and flag overrides from the environment, once.
fn gather_overrides() -> EnvOverrides {
    let var = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
    EnvOverrides {
        cc: var("CC"),
        ar: var("AR"),
        link: var("LINK"),
        cflags: var("CFLAGS"),
        arflags: var("ARFLAGS"),
        linkflags: var("LINKFLAGS"),
    }
}

/// Run the generation pass.
#[allow(clippy::too_many_arguments)]
pub fn run(
    manifest_path: &Path,
    output_path: &Path,
    target: Option<&str>,
    host: Option<&str>,
    toolchain: Option<&str>,
    configs: &[String],
    archs: &[String],
    includepaths: &[String],
    monolithic: bool,
    coverage: bool,
    report_format: Option<&str>,
) -> Result<()> {
    let manifest = AnvilManifest::load(manifest_path)?;
    let root = manifest_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut all_includepaths = manifest.project.includepaths.clone();
    all_includepaths.extend(includepaths.iter().cloned());

    let options = GeneratorOptions {
        target: target.map(str::to_string),
        host: host.map(str::to_string),
        toolchain: toolchain.map(str::to_string),
        configs: configs.to_vec(),
        archs: archs.to_vec(),
        includepaths: all_includepaths,
        monolithic,
        coverage,
        bundle_identifier: None,
        overrides: gather_overrides(),
        args: std::env::args().skip(1).collect(),
        root,
    };

    let file = fs::File::create(output_path)
        .with_context(|| format!("creating {}", output_path.display()))?;
    match emit(&manifest, options, BufWriter::new(file)) {
        Ok(report) => {
            print_report(output_path, &report, report_format)?;
            Ok(())
        }
        Err(err) => {
            // Never leave a half-written graph behind.
            let _ = fs::remove_file(output_path);
            Err(err)
        }
    }
}

/// Emit every artifact the manifest declares, in declaration order.
fn emit<W: Write>(
    manifest: &AnvilManifest,
    options: GeneratorOptions,
    out: W,
) -> Result<GenerationReport> {
    let mut generator = Generator::new(
        &manifest.project.name,
        &manifest.project.dependlibs,
        &manifest.project.libpaths,
        options,
        out,
    )?;

    let mut lib_outputs: HashMap<String, Vec<String>> = HashMap::new();
    for lib in &manifest.libs {
        let sources: Vec<&str> = lib.sources.iter().map(|s| s.as_str()).collect();
        let includepaths: Vec<&str> = lib.includepaths.iter().map(|s| s.as_str()).collect();
        let mut artifact = ArtifactSpec::new(&lib.module, &sources)
            .with_configs(&parse_configs(&lib.configs)?)
            .with_includepaths(&includepaths);
        if let Some(basepath) = &lib.basepath {
            artifact = artifact.with_basepath(basepath);
        }
        let outputs = generator.lib(&artifact)?;
        lib_outputs.insert(lib.module.clone(), outputs);
    }

    for bin in &manifest.bins {
        let artifact = bin_artifact(bin, &lib_outputs)?;
        generator.bin(&artifact)?;
    }
    for app in &manifest.apps {
        let artifact = bin_artifact(app, &lib_outputs)?;
        generator.app(&artifact)?;
    }

    if let Some(test) = &manifest.test {
        let suite = TestSuite {
            cases: test
                .cases
                .iter()
                .map(|case| {
                    let sources: Vec<&str> = case.sources.iter().map(|s| s.as_str()).collect();
                    TestCase::new(&case.name, &sources)
                })
                .collect(),
            libs: test.libs.clone(),
            implicit_deps: resolve_deps(&test.deps, &lib_outputs)?,
            resources: test.resources.clone(),
        };
        generator.tests(&suite)?;
    }

    Ok(generator.report())
}

fn bin_artifact(
    config: &BinConfig,
    lib_outputs: &HashMap<String, Vec<String>>,
) -> Result<ArtifactSpec> {
    let sources: Vec<&str> = config.sources.iter().map(|s| s.as_str()).collect();
    let libs: Vec<&str> = config.libs.iter().map(|s| s.as_str()).collect();
    let frameworks: Vec<&str> = config.frameworks.iter().map(|s| s.as_str()).collect();
    let resources: Vec<&str> = config.resources.iter().map(|s| s.as_str()).collect();
    let includepaths: Vec<&str> = config.includepaths.iter().map(|s| s.as_str()).collect();

    let mut artifact = ArtifactSpec::new(&config.module, &sources)
        .with_implicit_deps(&resolve_deps(&config.deps, lib_outputs)?)
        .with_libs(&libs)
        .with_frameworks(&frameworks)
        .with_resources(&resources)
        .with_configs(&parse_configs(&config.configs)?)
        .with_includepaths(&includepaths);
    if let Some(binname) = &config.binname {
        artifact = artifact.with_binname(binname);
    }
    if let Some(basepath) = &config.basepath {
        artifact = artifact.with_basepath(basepath);
    }
    Ok(artifact)
}

/// Resolve `deps` names to the graph outputs of previously emitted
/// libraries.
fn resolve_deps(
    deps: &[String],
    lib_outputs: &HashMap<String, Vec<String>>,
) -> Result<Vec<String>> {
    let mut resolved = Vec::new();
    for dep in deps {
        match lib_outputs.get(dep) {
            Some(outputs) => resolved.extend(outputs.iter().cloned()),
            None => bail!("unknown dependency '{dep}': no such library declared earlier"),
        }
    }
    Ok(resolved)
}

fn parse_configs(tokens: &[String]) -> Result<Vec<BuildConfig>> {
    tokens
        .iter()
        .map(|tok| tok.parse::<BuildConfig>().map_err(Into::into))
        .collect()
}

fn print_report(
    output_path: &Path,
    report: &GenerationReport,
    format: Option<&str>,
) -> Result<()> {
    match format {
        Some("json") => println!("{}", serde_json::to_string_pretty(report)?),
        Some("human") | None => println!(
            "wrote {}: {} artifacts, {} edges ({} compile, {} archive, {} link, {} fuse, {} package)",
            output_path.display(),
            report.artifacts,
            report.total_edges(),
            report.compile_edges,
            report.archive_edges,
            report.link_edges,
            report.fuse_edges,
            report.package_edges,
        ),
        Some(other) => bail!("unknown report format '{other}' (expected human or json)"),
    }
    Ok(())
}
