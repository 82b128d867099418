//! Error types for platform model construction.

/// Errors raised when a token falls outside one of the closed model sets.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// Unknown target or host platform token.
    #[error("unsupported platform '{token}' (supported: {supported})")]
    UnsupportedPlatform {
        /// The offending token.
        token: String,
        /// Comma-separated list of supported tokens.
        supported: String,
    },

    /// Unknown architecture token.
    #[error("unsupported architecture '{token}' (supported: {supported})")]
    UnsupportedArchitecture {
        /// The offending token.
        token: String,
        /// Comma-separated list of supported tokens.
        supported: String,
    },

    /// Unknown build configuration token.
    #[error("unsupported configuration '{token}' (supported: {supported})")]
    UnsupportedConfiguration {
        /// The offending token.
        token: String,
        /// Comma-separated list of supported tokens.
        supported: String,
    },
}

/// Result type for platform model operations.
pub type Result<T> = std::result::Result<T, PlatformError>;
