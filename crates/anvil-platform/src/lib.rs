//! Platform, architecture, and build-configuration models for the anvil
//! build generator.
//!
//! Everything here is a closed set: tokens are validated at construction
//! and downstream code branches on enum values, never on strings.

pub mod arch;
pub mod config;
pub mod error;
pub mod platform;

pub use arch::Arch;
pub use config::BuildConfig;
pub use error::PlatformError;
pub use platform::Platform;
