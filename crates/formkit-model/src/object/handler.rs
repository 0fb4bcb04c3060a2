//! Per-object behavior hooks.
//!
//! A [`DataObject`] has no subclasses; the behavior a concrete form adds on
//! top of the generic tree (cross-field validation, how data is read, saved
//! or deleted) lives in an [`ObjectHandler`] attached at build time.

use async_trait::async_trait;
use formkit_core::{ErrorList, FormkitResult};
use serde_json::Value as Json;

use super::DataObject;

/// Hooks invoked by a [`DataObject`] during its lifecycle.
///
/// Every method has a default that does nothing, so a handler only
/// implements what it needs.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use formkit_core::{ErrorList, FormkitResult};
/// use formkit_model::{DataObject, ObjectHandler};
///
/// #[derive(Debug)]
/// struct Customer;
///
/// #[async_trait(?Send)]
/// impl ObjectHandler for Customer {
///     fn validate_self(&self, obj: &DataObject, errors: &mut ErrorList) {
///         if obj.data_property("Email").is_some_and(|p| p.is_null()) {
///             errors.add_warning("no_email", "No email address on file.");
///         }
///     }
///
///     async fn do_read(&self, _obj: &DataObject) -> FormkitResult<Option<serde_json::Value>> {
///         Ok(Some(serde_json::json!({ "Email": "ann@example.com" })))
///     }
/// }
/// ```
#[async_trait(?Send)]
pub trait ObjectHandler {
    /// Called once every member of the object is wired to it.
    fn on_initialized(&self, _obj: &DataObject) {}

    /// Checks the object as a whole after its members were validated.
    fn validate_self(&self, _obj: &DataObject, _errors: &mut ErrorList) {}

    /// Reads the object's data. A returned payload is imported into the
    /// object; `None` means the handler populated it already.
    async fn do_read(&self, _obj: &DataObject) -> FormkitResult<Option<Json>> {
        Ok(None)
    }

    /// Saves the object's data.
    async fn do_save(&self, _obj: &DataObject) -> FormkitResult<()> {
        Ok(())
    }

    /// Deletes the object.
    async fn do_delete(&self, _obj: &DataObject) -> FormkitResult<()> {
        Ok(())
    }
}

/// The handler of objects built without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandler;

impl ObjectHandler for DefaultHandler {}
