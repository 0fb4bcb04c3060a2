//! # formkit-core
//!
//! Core types, settings, and error types for the formkit data-model layer.
//! This crate has no framework dependencies and provides the foundation for all
//! other crates.
//!
//! ## Modules
//!
//! - [`error`] - Error severities, error lists, and the crate-wide error enum
//! - [`value`] - The dynamically-typed [`Value`] carried by properties
//! - [`header`] - Typed reference values used by enumerated properties
//! - [`settings`] - Conversion defaults and global configuration
//! - [`settings_loader`] - Loading settings from TOML, JSON, and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`utils`] - Text helpers (message formatting, casing)

pub mod error;
pub mod header;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod utils;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use error::{ErrorList, ErrorMessage, ErrorSeverity, FormkitError, FormkitResult};
pub use header::Header;
pub use settings::{Settings, SETTINGS};
pub use value::{Value, ValueFormat};
