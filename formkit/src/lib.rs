//! # formkit
//!
//! A reactive data-model layer for interactive forms.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `formkit` to get the whole model, or depend on
//! individual crates for finer-grained control.
//!
//! ```
//! use formkit::prelude::*;
//!
//! let person = DataObject::builder("Person")
//!     .property("Name", PropertyDef::text().required(true))
//!     .property("Age", PropertyDef::positive_integer())
//!     .build();
//!
//! person.data_property("Age").unwrap().set_internal_value(Value::Int(-5));
//! person.validate(true);
//! assert_eq!(person.validation_errors().errors_text(), "Name is required.\nAge cannot be less than 0.");
//! ```

/// Values, headers, settings, logging and error types.
pub use formkit_core as core;

/// Synchronous change notification.
#[cfg(feature = "signals")]
pub use formkit_signals as signals;

/// Lookup tables, the lookup cache and cache loaders.
#[cfg(feature = "lookup")]
pub use formkit_lookup as lookup;

/// Data properties, data objects, lists and rows.
#[cfg(feature = "model")]
pub use formkit_model as model;

/// Testing utilities.
#[cfg(feature = "testing")]
pub use formkit_test as test;

// Re-export commonly used third-party crates.
pub use async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use tracing_subscriber;

/// The types most forms need.
pub mod prelude {
    pub use formkit_core::{ErrorList, FormkitError, FormkitResult, Header, Settings, Value, ValueFormat, SETTINGS};

    #[cfg(feature = "lookup")]
    pub use formkit_lookup::{CacheLoader, LocalCacheLoader, LookupCache, LookupTable, RemoteCacheLoader};

    #[cfg(feature = "model")]
    pub use formkit_model::{
        AccessLevel, DataObject, DataProperty, DataRow, ExportOptions, ListSortField, Modified, ObjectHandler,
        PropertyDef, PropertyKind, SelectionMode,
    };
}
