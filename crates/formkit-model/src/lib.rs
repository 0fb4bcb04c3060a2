//! # formkit-model
//!
//! The reactive data model of formkit. This crate provides:
//!
//! - [`property`] - Typed [`DataProperty`] fields with four value projections,
//!   enumerated and operator kinds, cascading filters and readiness
//! - [`validators`] - The [`PropertyValidator`] trait and the built-in validators
//! - [`object`] - The [`DataObject`] tree: plain objects, object lists, data
//!   lists and criteria objects, with JSON import/export and async operations
//! - [`row`] - Lightweight [`DataRow`]s of data lists and row selection
//! - [`sort`] - Sort criteria
//! - [`state`] - Access levels and the tri-state [`Modified`] flag
//!
//! The model is single-threaded. Members hold weak references to their
//! parents, and change notification runs synchronously through
//! [`formkit_signals::Signal`].

#![allow(clippy::future_not_send)]

pub mod object;
pub mod property;
pub mod row;
pub mod sort;
pub mod state;
pub mod validators;

pub use object::{
    DataObject, DataObjectBuilder, DefaultHandler, ExportOptions, FieldCriteria, ImportOptions,
    Member, ObjectChange, ObjectFactory, ObjectHandler,
};
pub use property::{
    CascadeNullMode, DataProperty, PropertyChange, PropertyDef, PropertyKind, WAIT_LOOKUP,
};
pub use row::{DataRow, SelectionMode};
pub use sort::{ListSortField, SortDirection};
pub use state::{AccessLevel, Modified};
pub use validators::{
    default_validators, DateTimeValidator, FnValidator, MaximumValidator, MinimumValidator,
    NumberValidator, PropertyValidator, RequiredValidator, SizeValidator,
};
