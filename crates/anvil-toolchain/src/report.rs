//! Generation run report.

use serde::Serialize;

/// Counts of emitted artifacts and build edges for one generation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    /// Artifacts emitted (libraries, binaries, app bundles).
    pub artifacts: usize,
    /// Compile edges.
    pub compile_edges: usize,
    /// Static-library archive edges.
    pub archive_edges: usize,
    /// Link edges.
    pub link_edges: usize,
    /// Multi-architecture fusion edges.
    pub fuse_edges: usize,
    /// Resource packaging and bundle manifest edges.
    pub package_edges: usize,
}

impl GenerationReport {
    /// Total number of build edges emitted.
    pub fn total_edges(&self) -> usize {
        self.compile_edges
            + self.archive_edges
            + self.link_edges
            + self.fuse_edges
            + self.package_edges
    }
}
