//! Utility functions for formkit.
//!
//! - [`text`]: message templating and identifier-to-label conversions.

pub mod text;
