//! Anvil CLI — ninja build-file generator for multi-platform C projects.

mod commands;
mod manifest;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "anvil", version, about = "Ninja build-file generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate build.ninja from the project manifest
    Generate {
        /// Target platform (e.g. linux, macos, ios, android)
        #[arg(long)]
        target: Option<String>,
        /// Host platform (defaults to the running host)
        #[arg(long)]
        host: Option<String>,
        /// Toolchain family (gcc, clang, msvc)
        #[arg(long)]
        toolchain: Option<String>,
        /// Build configuration (repeatable; default release)
        #[arg(short = 'c', long = "config")]
        configs: Vec<String>,
        /// Target architecture (repeatable; default host arch)
        #[arg(short = 'a', long = "arch")]
        archs: Vec<String>,
        /// Additional include path (repeatable)
        #[arg(short = 'i', long = "includepath")]
        includepaths: Vec<String>,
        /// Build all test cases as one binary
        #[arg(long)]
        monolithic: bool,
        /// Instrument for code coverage
        #[arg(long)]
        coverage: bool,
        /// Project manifest to read
        #[arg(long, default_value = "anvil.toml")]
        file: PathBuf,
        /// Graph file to write
        #[arg(long, default_value = "build.ninja")]
        output: PathBuf,
        /// Report format (human, json)
        #[arg(long)]
        report: Option<String>,
    },
    /// List supported platforms, architectures, configurations, toolchains
    Targets,
    /// Remove generated build files and output directories
    Clean,
}

fn main() {
    let cli = Cli::parse();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            target,
            host,
            toolchain,
            configs,
            archs,
            includepaths,
            monolithic,
            coverage,
            file,
            output,
            report,
        } => commands::generate::run(
            &file,
            &output,
            target.as_deref(),
            host.as_deref(),
            toolchain.as_deref(),
            &configs,
            &archs,
            &includepaths,
            monolithic,
            coverage,
            report.as_deref(),
        ),

        Commands::Targets => commands::targets::run(),

        Commands::Clean => {
            let cwd = std::env::current_dir()?;
            commands::clean::run(&cwd)
        }
    }
}
