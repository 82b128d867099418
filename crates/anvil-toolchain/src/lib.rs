//! Toolchain abstraction and build-graph emission engine.
//!
//! The [`Toolchain`] maps platform- and architecture-independent artifact
//! descriptions into concrete compiler/archiver/linker build edges:
//! per-(architecture × configuration) flag resolution, multi-architecture
//! fat-binary fusion, and resource/bundle packaging for app targets.

pub mod artifact;
pub mod error;
pub mod family;
pub mod report;
pub mod spec;
pub mod toolchain;

pub use artifact::ArtifactSpec;
pub use error::ToolchainError;
pub use family::ToolchainFamily;
pub use report::GenerationReport;
pub use spec::{BuildVariables, EnvOverrides, ToolchainSpec};
pub use toolchain::Toolchain;
