//! # formkit-test
//!
//! Testing utilities for formkit. Provides lookup loaders that record and
//! control their loads, a static lookup source for the remote loader, a
//! call-counting validator probe, and fixtures for headers, tables and
//! operator lists.

pub mod fixtures;
pub mod loaders;
pub mod probes;

pub use fixtures::{header, header_with, init_test_logging, operators_table, table, OPERATORS};
pub use loaders::{DeferredLoader, RecordingLoader, StaticSource};
pub use probes::CountingValidator;
