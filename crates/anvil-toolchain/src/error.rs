//! Errors raised during toolchain resolution and build-graph emission.

use std::io;
use std::path::PathBuf;

use anvil_platform::PlatformError;

/// Errors that can occur while resolving a toolchain or emitting edges.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// Unknown toolchain family token.
    #[error("unsupported toolchain '{token}' (supported: {supported})")]
    UnsupportedToolchain {
        /// The offending token.
        token: String,
        /// Comma-separated list of supported tokens.
        supported: String,
    },

    /// A platform, architecture, or configuration token was rejected.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// A declared source or resource file does not exist.
    #[error("missing source file: {}", path.display())]
    MissingSource {
        /// The path that was not found, relative to the generation root.
        path: PathBuf,
    },

    /// Two artifacts would produce the same graph output.
    #[error("conflicting output '{output}' emitted by both '{first}' and '{second}'")]
    ConflictingOutput {
        /// The colliding output path.
        output: String,
        /// Module that claimed the output first.
        first: String,
        /// Module that attempted to claim it again.
        second: String,
    },

    /// Writing the graph file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for toolchain operations.
pub type Result<T> = std::result::Result<T, ToolchainError>;
