//! Object lists: homogeneous sequences of child data objects.
//!
//! An object list builds a template item from its factory at construction.
//! The template never becomes a live item; it answers the editable, visible
//! and required questions of every item's properties instead, so those
//! checks do not depend on the number of items.

use std::cell::RefCell;
use std::rc::Rc;

use formkit_core::{FormkitError, FormkitResult};
use serde_json::Value as Json;

use super::{DataObject, ExportOptions, ObjectChange, ObjectKind};
use crate::property::DataProperty;
use crate::state::Modified;

/// Creates the items of an object list.
pub type ObjectFactory = Rc<dyn Fn() -> Rc<DataObject>>;

pub(crate) struct ListState {
    factory: ObjectFactory,
    pub(super) template: Rc<DataObject>,
    items: RefCell<Vec<Rc<DataObject>>>,
}

impl ListState {
    pub(super) fn new(factory: ObjectFactory) -> Self {
        let template = factory();
        Self {
            factory,
            template,
            items: RefCell::new(Vec::new()),
        }
    }

    pub(super) fn items(&self) -> Vec<Rc<DataObject>> {
        self.items.borrow().clone()
    }

    pub(super) fn template_property(&self, prop: &DataProperty) -> Option<Rc<DataProperty>> {
        self.template.data_property(prop.name())
    }
}

impl DataObject {
    fn list_state(&self) -> Option<&ListState> {
        match &self.kind {
            ObjectKind::List(list) => Some(list),
            _ => None,
        }
    }

    /// Whether this object is an object list.
    pub const fn is_list(&self) -> bool {
        matches!(self.kind, ObjectKind::List(_))
    }

    /// The template item of an object list.
    pub fn template(&self) -> Option<&Rc<Self>> {
        self.list_state().map(|list| &list.template)
    }

    /// The items of an object list, in order.
    pub fn items(&self) -> Vec<Rc<Self>> {
        self.list_state().map(ListState::items).unwrap_or_default()
    }

    /// Makes a new item without adding it to the list.
    pub fn new_item(&self) -> Option<Rc<Self>> {
        self.list_state().map(|list| (list.factory)())
    }

    /// Appends an item. The list becomes `Dirty` if the item was never
    /// populated.
    pub fn add_item(&self, item: Rc<Self>) {
        let (Some(list), Some(this)) = (self.list_state(), self.rc()) else {
            return;
        };
        item.set_parent(&this);
        let unset = item.modified() == Modified::Unset;
        list.items.borrow_mut().push(item);
        if unset {
            self.set_modified(Modified::Dirty);
        }
        self.invalidate();
        self.changed.send(&ObjectChange::Items);
    }

    /// Removes an item, marking the list `Dirty`. Returns `false` if the
    /// item is not in the list.
    pub fn remove_item(&self, item: &Rc<Self>) -> bool {
        let Some(list) = self.list_state() else {
            return false;
        };
        let removed = {
            let mut items = list.items.borrow_mut();
            let before = items.len();
            items.retain(|i| !Rc::ptr_eq(i, item));
            items.len() != before
        };
        if removed {
            item.clear_parent();
            self.set_modified(Modified::Dirty);
            self.invalidate();
            self.changed.send(&ObjectChange::Items);
        }
        removed
    }

    pub(super) fn clear_items(&self) {
        let Some(list) = self.list_state() else {
            return;
        };
        let removed = std::mem::take(&mut *list.items.borrow_mut());
        if removed.is_empty() {
            return;
        }
        for item in &removed {
            item.clear_parent();
        }
        self.set_modified(Modified::Dirty);
        self.invalidate();
        self.changed.send(&ObjectChange::Items);
    }

    pub(super) fn import_items(&self, list: &ListState, json: &Json) -> FormkitResult<()> {
        let Json::Array(values) = json else {
            return Err(FormkitError::Serialization(format!(
                "expected an array for list '{self}', got {json}"
            )));
        };
        let Some(this) = self.rc() else {
            return Ok(());
        };
        let mut items = Vec::with_capacity(values.len());
        for value in values {
            let item = (list.factory)();
            item.from_json(value)?;
            item.set_parent(&this);
            items.push(item);
        }
        let old = std::mem::replace(&mut *list.items.borrow_mut(), items);
        for item in &old {
            item.clear_parent();
        }
        self.invalidate();
        self.changed.send(&ObjectChange::Items);
        Ok(())
    }

    pub(super) fn export_items(&self, list: &ListState, options: &ExportOptions) -> Json {
        Json::Array(list.items().iter().map(|item| item.export(options)).collect())
    }
}
