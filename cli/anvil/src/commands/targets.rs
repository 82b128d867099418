//! `anvil targets` — list the supported enumerated sets.

use anyhow::Result;

use anvil_platform::{Arch, BuildConfig, Platform};
use anvil_toolchain::ToolchainFamily;

/// Print every supported platform, architecture, configuration, and
/// toolchain family.
pub fn run() -> Result<()> {
    println!("Platforms:");
    for platform in Platform::ALL {
        println!("  {platform}");
    }
    println!();
    println!("Architectures:");
    for arch in Arch::ALL {
        println!("  {arch}");
    }
    println!();
    println!("Configurations:");
    for config in BuildConfig::ALL {
        println!("  {config}");
    }
    println!();
    println!("Toolchains:");
    for family in ToolchainFamily::ALL {
        println!("  {family} (default for {})", default_targets(family));
    }
    Ok(())
}

fn default_targets(family: ToolchainFamily) -> String {
    let targets: Vec<&str> = Platform::ALL
        .iter()
        .filter(|p| ToolchainFamily::default_for(**p) == family)
        .map(|p| p.as_str())
        .collect();
    targets.join(", ")
}
