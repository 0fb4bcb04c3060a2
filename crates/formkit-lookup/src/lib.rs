//! # formkit-lookup
//!
//! Reference data for enumerated properties. This crate provides:
//!
//! - [`table`] - Self-indexing [`LookupTable`]s of headers
//! - [`cache`] - The [`LookupCache`] with coalesced, at-most-once loading per type
//! - [`loader`] - The [`CacheLoader`] capability and the provider-backed,
//!   local (parameterized), and remote loaders
//!
//! Everything here is single-threaded: tables and caches are shared through
//! `Rc`, and asynchronous loads run on a local task set.

#![allow(clippy::future_not_send)]

pub mod cache;
pub mod loader;
pub mod table;

pub use cache::{LookupCache, ReadyCallback};
pub use loader::{
    BaseCacheLoader, CacheLoader, LocalCacheLoader, LookupSource, Parameters, RemoteCacheLoader,
    TableProvider, TableRequest, TableSink,
};
pub use table::{group_attribute, LookupTable};
