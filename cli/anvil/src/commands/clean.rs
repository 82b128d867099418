//! `anvil clean` — remove the generated graph and ninja output
//! directories.

use std::fs;
use std::path::Path;

use anyhow::Result;

/// Remove `build.ninja` and the `obj`/`lib`/`bin` output trees.
pub fn run(project_dir: &Path) -> Result<()> {
    let graph = project_dir.join("build.ninja");
    if graph.exists() {
        fs::remove_file(&graph)?;
        println!("Removed {}", graph.display());
    }

    for out_dir in ["obj", "lib", "bin"] {
        let dir = project_dir.join(out_dir);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
            println!("Removed {}", dir.display());
        }
    }
    Ok(())
}
