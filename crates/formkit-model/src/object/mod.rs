//! Data objects.
//!
//! A [`DataObject`] is a node of the form tree: an ordered manifest of named
//! [`DataProperty`] and child `DataObject` members, built once by a
//! [`DataObjectBuilder`]. The same type also represents the specialized
//! nodes:
//!
//! - object lists, a sequence of child objects made by a factory
//!   (see [`DataObject::list`]);
//! - data lists, a sortable and selectable sequence of lightweight
//!   [`DataRow`](crate::DataRow)s with optional search criteria;
//! - criteria objects, which hold search filters.
//!
//! ## Construction order
//!
//! Members are created first. Once all of them exist, the build wires each
//! member's name and parent and then runs its post-initialization, so a
//! member may look up any sibling by name at that point. The handler's
//! `on_initialized` runs last, and the modification state of the whole
//! tree is reset to `Unset` afterwards.
//!
//! ## Delegation
//!
//! A property asks its parent whether it is editable, visible and
//! required; the parent asks its own parent, and so on up to the root. A
//! read-only container therefore makes every descendant read-only.

mod criteria;
mod data_list;
mod handler;
mod list;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use formkit_core::logging::model_span;
use formkit_core::{ErrorList, FormkitError, FormkitResult, Value, ValueFormat};
use formkit_signals::Signal;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value as Json;
use tracing::Instrument;

use crate::property::{DataProperty, PropertyDef};
use crate::row::SelectionMode;
use crate::sort::ListSortField;
use crate::state::{AccessLevel, Modified};

pub use criteria::FieldCriteria;
pub use handler::{DefaultHandler, ObjectHandler};
pub use list::ObjectFactory;

use data_list::DataListState;
use list::ListState;

/// Characters left as-is in URL components.
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// A member of a data object.
#[derive(Debug, Clone)]
pub enum Member {
    /// A data property.
    Property(Rc<DataProperty>),
    /// A child object, object list or data list.
    Object(Rc<DataObject>),
}

/// What changed on a data object, sent through [`DataObject::changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectChange {
    /// The object's own modification flag.
    Modified,
    /// The own editable flag.
    Editable,
    /// The access level.
    AccessLevel,
    /// The validation errors.
    ValidationErrors,
    /// The items of an object list.
    Items,
    /// The rows of a data list.
    Rows,
    /// The sort criteria of a data list.
    SortCriteria,
    /// The row selection of a data list.
    Selection,
    /// The applied criteria of a data list.
    AppliedCriteria,
}

/// Options for exporting a data object to JSON.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Only members whose wire name is a key of this object are exported.
    /// For a list, the first element of an array contract applies to every
    /// item.
    pub contract: Option<Json>,
    /// Leaves out properties whose transport value is null, blank text or
    /// an empty list.
    pub ignore_empty: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            contract: None,
            ignore_empty: true,
        }
    }
}

impl ExportOptions {
    /// Exports every member, including empty ones.
    pub const fn all() -> Self {
        Self {
            contract: None,
            ignore_empty: false,
        }
    }

    /// Restricts the export to the members of `contract`.
    #[must_use]
    pub fn with_contract(mut self, contract: Json) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Sets whether empty values are left out.
    #[must_use]
    pub const fn ignore_empty(mut self, ignore_empty: bool) -> Self {
        self.ignore_empty = ignore_empty;
        self
    }

    fn includes(&self, key: &str) -> bool {
        match &self.contract {
            Some(Json::Object(map)) => map.contains_key(key),
            _ => true,
        }
    }

    fn for_child(&self, key: &str) -> Self {
        Self {
            contract: self
                .contract
                .as_ref()
                .and_then(|c| c.get(key))
                .filter(|c| c.is_object() || c.is_array())
                .cloned(),
            ignore_empty: self.ignore_empty,
        }
    }

    fn for_item(&self) -> Self {
        let contract = match &self.contract {
            Some(Json::Array(items)) => items.first().cloned(),
            _ => None,
        };
        Self {
            contract,
            ignore_empty: self.ignore_empty,
        }
    }
}

/// Options for importing JSON into a data object.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// For data lists: re-select the rows that match a previously selected
    /// row by key.
    pub preserve_selection: bool,
}

pub(crate) enum ObjectKind {
    Plain,
    Criteria,
    List(ListState),
    DataList(DataListState),
}

/// A node of the form tree.
pub struct DataObject {
    this: Weak<Self>,
    name: RefCell<String>,
    parent: RefCell<Weak<Self>>,
    access_level: Cell<AccessLevel>,
    editable: Cell<bool>,
    modified: Cell<Modified>,
    track_modifications: Cell<bool>,
    is_new: Cell<bool>,
    validated: Cell<bool>,
    errors: RefCell<ErrorList>,
    members: Vec<(String, Member)>,
    handler: Rc<dyn ObjectHandler>,
    ready_callbacks: RefCell<Vec<Rc<dyn Fn()>>>,
    kind: ObjectKind,
    changed: Signal<ObjectChange>,
}

impl fmt::Debug for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataObject")
            .field("name", &self.name.borrow())
            .field("members", &self.members.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("modified", &self.modified.get())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DataObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name.borrow())
    }
}

// ── Builder ──────────────────────────────────────────────────────────

enum KindDecl {
    Plain,
    Criteria,
    List(ObjectFactory),
    DataList {
        criteria: Option<Rc<DataObject>>,
        sort: Vec<ListSortField>,
        selection: SelectionMode,
    },
}

/// Declares the members and options of a [`DataObject`].
///
/// # Examples
///
/// ```
/// use formkit_core::Value;
/// use formkit_model::{DataObject, PropertyDef};
///
/// let customer = DataObject::builder("Customer")
///     .property("Name", PropertyDef::text().required(true))
///     .property("Age", PropertyDef::positive_integer())
///     .build();
///
/// customer.from_json(&serde_json::json!({ "Name": "Ann", "Age": "42" })).unwrap();
/// assert_eq!(customer.data_property("Age").unwrap().internal_value(), Value::Int(42));
/// ```
#[must_use]
pub struct DataObjectBuilder {
    name: String,
    members: Vec<(String, Member)>,
    handler: Option<Rc<dyn ObjectHandler>>,
    access_level: AccessLevel,
    editable: bool,
    track_modifications: bool,
    kind: KindDecl,
}

impl DataObjectBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            handler: None,
            access_level: AccessLevel::Full,
            editable: true,
            track_modifications: true,
            kind: KindDecl::Plain,
        }
    }

    /// Adds a property.
    pub fn property(mut self, name: impl Into<String>, def: PropertyDef) -> Self {
        let name = name.into();
        let prop = DataProperty::new(name.clone(), def);
        self.members.push((name, Member::Property(prop)));
        self
    }

    /// Adds a child object, object list or data list.
    pub fn child(mut self, name: impl Into<String>, child: Rc<DataObject>) -> Self {
        self.members.push((name.into(), Member::Object(child)));
        self
    }

    /// Adds a child object list whose items are made by `factory`.
    pub fn list(self, name: impl Into<String>, factory: impl Fn() -> Rc<DataObject> + 'static) -> Self {
        let name = name.into();
        let list = DataObject::list(name.clone(), factory);
        self.child(name, list)
    }

    /// Sets the lifecycle hooks.
    pub fn handler(mut self, handler: Rc<dyn ObjectHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Sets the initial access level.
    pub const fn access_level(mut self, level: AccessLevel) -> Self {
        self.access_level = level;
        self
    }

    /// Sets the initial own editable flag.
    pub const fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Sets whether the object reports modifications.
    pub const fn track_modifications(mut self, track: bool) -> Self {
        self.track_modifications = track;
        self
    }

    /// Makes the object a criteria object holding search filters.
    pub fn search_criteria(mut self) -> Self {
        self.kind = KindDecl::Criteria;
        self
    }

    /// Makes the object a data list. Its properties describe the columns
    /// of its rows.
    pub fn data_list(mut self) -> Self {
        if !matches!(self.kind, KindDecl::DataList { .. }) {
            self.kind = KindDecl::DataList {
                criteria: None,
                sort: Vec::new(),
                selection: SelectionMode::None,
            };
        }
        self
    }

    /// Makes the object a data list searched with `criteria`.
    pub fn criteria_object(self, criteria: Rc<DataObject>) -> Self {
        let mut builder = self.data_list();
        if let KindDecl::DataList { criteria: c, .. } = &mut builder.kind {
            *c = Some(criteria);
        }
        builder
    }

    /// Makes the object a data list with initial sort criteria.
    pub fn sort_criteria(self, sort: Vec<ListSortField>) -> Self {
        let mut builder = self.data_list();
        if let KindDecl::DataList { sort: s, .. } = &mut builder.kind {
            *s = sort;
        }
        builder
    }

    /// Makes the object a data list with a row selection mode.
    pub fn selection_mode(self, mode: SelectionMode) -> Self {
        let mut builder = self.data_list();
        if let KindDecl::DataList { selection, .. } = &mut builder.kind {
            *selection = mode;
        }
        builder
    }

    /// Creates the object and runs its post-initialization.
    pub fn build(self) -> Rc<DataObject> {
        let kind = match self.kind {
            KindDecl::Plain => ObjectKind::Plain,
            KindDecl::Criteria => ObjectKind::Criteria,
            KindDecl::List(factory) => ObjectKind::List(ListState::new(factory)),
            KindDecl::DataList {
                criteria,
                sort,
                selection,
            } => ObjectKind::DataList(DataListState::new(criteria, sort, selection)),
        };
        let obj = Rc::new_cyclic(|this| DataObject {
            this: this.clone(),
            name: RefCell::new(self.name),
            parent: RefCell::new(Weak::new()),
            access_level: Cell::new(self.access_level),
            editable: Cell::new(self.editable),
            modified: Cell::new(Modified::Unset),
            track_modifications: Cell::new(self.track_modifications),
            is_new: Cell::new(true),
            validated: Cell::new(false),
            errors: RefCell::new(ErrorList::new()),
            members: self.members,
            handler: self
                .handler
                .unwrap_or_else(|| Rc::new(DefaultHandler) as Rc<dyn ObjectHandler>),
            ready_callbacks: RefCell::new(Vec::new()),
            kind,
            changed: Signal::new(),
        });
        obj.initialize();
        obj
    }
}

impl DataObject {
    /// Starts declaring a plain data object.
    pub fn builder(name: impl Into<String>) -> DataObjectBuilder {
        DataObjectBuilder::new(name)
    }

    /// Creates an object list whose items are made by `factory`.
    pub fn list(name: impl Into<String>, factory: impl Fn() -> Rc<Self> + 'static) -> Rc<Self> {
        let mut builder = DataObjectBuilder::new(name);
        builder.kind = KindDecl::List(Rc::new(factory));
        builder.build()
    }

    fn initialize(self: &Rc<Self>) {
        self.initialize_members();
        if let ObjectKind::DataList(state) = &self.kind {
            if let Some(criteria) = &state.criteria {
                criteria.set_parent(self);
                criteria.initialize_members();
            }
        }
        self.handler.on_initialized(self);
        self.set_modified(Modified::Unset);
    }

    fn initialize_members(self: &Rc<Self>) {
        for (slot, member) in &self.members {
            match member {
                Member::Property(p) => p.set_parent(self),
                Member::Object(o) => {
                    o.set_name(slot);
                    o.set_parent(self);
                }
            }
        }
        for (_, member) in &self.members {
            match member {
                Member::Property(p) => p.on_initialized(),
                Member::Object(o) => o.initialize_members(),
            }
        }
    }

    // ── Identity ─────────────────────────────────────────────────────

    /// The name of the object within its parent.
    pub fn name(&self) -> String {
        self.name.borrow().clone()
    }

    fn set_name(&self, name: &str) {
        name.clone_into(&mut self.name.borrow_mut());
    }

    /// The owning object, if any.
    pub fn parent(&self) -> Option<Rc<Self>> {
        self.parent.borrow().upgrade()
    }

    pub(crate) fn set_parent(&self, parent: &Rc<Self>) {
        *self.parent.borrow_mut() = Rc::downgrade(parent);
        if let ObjectKind::List(list) = &self.kind {
            list.template.set_parent(parent);
        }
    }

    pub(crate) fn clear_parent(&self) {
        *self.parent.borrow_mut() = Weak::new();
    }

    pub(crate) fn rc(&self) -> Option<Rc<Self>> {
        self.this.upgrade()
    }

    /// The signal that announces changes of the object's own state.
    pub const fn changed(&self) -> &Signal<ObjectChange> {
        &self.changed
    }

    /// The lifecycle hooks.
    pub fn handler(&self) -> &Rc<dyn ObjectHandler> {
        &self.handler
    }

    /// The members in declaration order, keyed by name.
    pub fn members(&self) -> &[(String, Member)] {
        &self.members
    }

    /// The properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = &Rc<DataProperty>> {
        self.members.iter().filter_map(|(_, m)| match m {
            Member::Property(p) => Some(p),
            Member::Object(_) => None,
        })
    }

    /// The child objects in declaration order.
    pub fn child_objects(&self) -> impl Iterator<Item = &Rc<Self>> {
        self.members.iter().filter_map(|(_, m)| match m {
            Member::Object(o) => Some(o),
            Member::Property(_) => None,
        })
    }

    fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|(n, _)| n == name).map(|(_, m)| m)
    }

    /// Finds a property by `name`, also trying `{name}Property`.
    pub fn data_property(&self, name: &str) -> Option<Rc<DataProperty>> {
        [format!("{name}Property"), name.to_string()]
            .iter()
            .find_map(|n| match self.member(n) {
                Some(Member::Property(p)) => Some(Rc::clone(p)),
                _ => None,
            })
    }

    /// Finds a child object by `name`, also trying `{name}Object` and
    /// `{name}List`.
    pub fn child_object(&self, name: &str) -> Option<Rc<Self>> {
        [format!("{name}Object"), format!("{name}List"), name.to_string()]
            .iter()
            .find_map(|n| match self.member(n) {
                Some(Member::Object(o)) => Some(Rc::clone(o)),
                _ => None,
            })
    }

    /// Whether the object has not been read or saved yet.
    pub fn is_new(&self) -> bool {
        self.is_new.get()
    }

    /// Sets whether the object is new.
    pub fn set_new(&self, is_new: bool) {
        self.is_new.set(is_new);
    }

    // ── Access and delegation ────────────────────────────────────────

    /// The access level.
    pub fn access_level(&self) -> AccessLevel {
        self.access_level.get()
    }

    /// Sets the access level.
    pub fn set_access_level(&self, level: AccessLevel) {
        if self.access_level.replace(level) != level {
            self.invalidate_tree();
            self.changed.send(&ObjectChange::AccessLevel);
        }
    }

    /// Sets the own editable flag. An object list forwards it to its
    /// template.
    pub fn set_editable(&self, editable: bool) {
        if let ObjectKind::List(list) = &self.kind {
            list.template.set_editable(editable);
            self.invalidate_tree();
        } else if self.editable.replace(editable) != editable {
            self.invalidate_tree();
            self.changed.send(&ObjectChange::Editable);
        }
    }

    /// Drops the validation memo of the object, everything below it, and
    /// its ancestors. Used when a change alters which properties are
    /// editable or required.
    fn invalidate_tree(&self) {
        self.clear_validated_below();
        self.invalidate();
    }

    fn clear_validated_below(&self) {
        self.validated.set(false);
        match &self.kind {
            ObjectKind::List(list) => {
                for item in list.items() {
                    item.clear_validated_below();
                }
            }
            ObjectKind::DataList(state) => {
                if let Some(criteria) = &state.criteria {
                    criteria.clear_validated_below();
                }
            }
            ObjectKind::Plain | ObjectKind::Criteria => {}
        }
        for (_, member) in &self.members {
            match member {
                Member::Property(p) => p.clear_validated(),
                Member::Object(o) => o.clear_validated_below(),
            }
        }
    }

    /// Own flag, the parent's editability, and an access level above
    /// read-only.
    pub fn is_editable(&self) -> bool {
        if let ObjectKind::List(list) = &self.kind {
            return list.template.is_editable();
        }
        self.editable.get()
            && self.access_level() > AccessLevel::ReadOnly
            && self.parent().map_or(true, |p| p.is_editable())
    }

    /// Decides whether a member property may be edited.
    pub fn is_property_editable(&self, prop: &DataProperty) -> bool {
        if let ObjectKind::List(list) = &self.kind {
            return list.template_property(prop).map_or(true, |p| p.is_editable());
        }
        self.is_editable() && self.parent().map_or(true, |p| p.is_property_editable(prop))
    }

    /// Decides whether a member property is shown.
    pub fn is_property_visible(&self, prop: &DataProperty) -> bool {
        if let ObjectKind::List(list) = &self.kind {
            return list.template_property(prop).map_or(true, |p| p.is_visible());
        }
        self.parent().map_or(true, |p| p.is_property_visible(prop))
    }

    /// Decides whether a member property is required.
    pub fn is_property_required(&self, prop: &DataProperty) -> bool {
        if let ObjectKind::List(list) = &self.kind {
            return list.template_property(prop).map_or(true, |p| p.is_required());
        }
        self.parent().map_or(true, |p| p.is_property_required(prop))
    }

    // ── Modification ─────────────────────────────────────────────────

    /// Whether the object reports modifications.
    pub fn tracks_modifications(&self) -> bool {
        self.track_modifications.get()
    }

    /// Sets whether the object reports modifications.
    pub fn set_track_modifications(&self, track: bool) {
        self.track_modifications.set(track);
    }

    /// The own flag folded with every member's state. An object that does
    /// not track modifications always reads `Clean`.
    pub fn modified(&self) -> Modified {
        if !self.track_modifications.get() {
            return Modified::Clean;
        }
        let own = self.modified.get();
        if let ObjectKind::List(list) = &self.kind {
            return list.items().iter().fold(own, |acc, item| acc.or(item.modified()));
        }
        self.members.iter().fold(own, |acc, (_, member)| {
            acc.or(match member {
                Member::Property(p) => p.modified(),
                Member::Object(o) => o.modified(),
            })
        })
    }

    /// Sets the own flag. `Clean` and `Unset` also reset every member.
    pub fn set_modified(&self, modified: Modified) {
        if self.modified.replace(modified) != modified {
            self.changed.send(&ObjectChange::Modified);
        }
        if modified.is_dirty() {
            return;
        }
        if let ObjectKind::List(list) = &self.kind {
            for item in list.items() {
                item.set_modified(modified);
            }
            return;
        }
        for (_, member) in &self.members {
            match member {
                Member::Property(p) => p.set_modified(modified),
                Member::Object(o) => o.set_modified(modified),
            }
        }
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Whether the object has been validated since its data last changed.
    pub fn is_validated(&self) -> bool {
        self.validated.get()
    }

    pub(crate) fn invalidate(&self) {
        self.validated.set(false);
        if let Some(parent) = self.parent() {
            parent.invalidate();
        }
    }

    /// Validates the members, merges their errors, and runs the handler's
    /// self-check. Without `force`, an already validated object is left
    /// alone.
    pub fn validate(&self, force: bool) {
        if force {
            self.validated.set(false);
        }
        if self.validated.get() {
            return;
        }

        let mut errors = ErrorList::new();
        match &self.kind {
            ObjectKind::List(list) => {
                for item in list.items() {
                    item.validate(force);
                    errors.merge_with(&item.validation_errors());
                }
            }
            ObjectKind::DataList(state) => {
                if let Some(criteria) = &state.criteria {
                    criteria.validate(force);
                    errors.merge_with(&criteria.validation_errors());
                }
            }
            ObjectKind::Plain | ObjectKind::Criteria => {
                for (_, member) in &self.members {
                    match member {
                        Member::Property(p) => {
                            p.validate(force);
                            errors.merge_with(&p.validation_errors());
                        }
                        Member::Object(o) => {
                            o.validate(force);
                            errors.merge_with(&o.validation_errors());
                        }
                    }
                }
            }
        }
        self.handler.validate_self(self, &mut errors);

        tracing::trace!(object = %self, errors = errors.len(), "object validated");
        *self.errors.borrow_mut() = errors;
        self.validated.set(true);
        self.changed.send(&ObjectChange::ValidationErrors);
    }

    /// The errors found by the last validation.
    pub fn validation_errors(&self) -> ErrorList {
        self.errors.borrow().clone()
    }

    // ── Reset ────────────────────────────────────────────────────────

    /// Clears the data: every property value of a plain object, every item
    /// of an object list, and every row and the criteria of a data list.
    pub fn reset(&self) {
        match &self.kind {
            ObjectKind::List(_) => self.clear_items(),
            ObjectKind::DataList(_) => self.reset_list(true),
            ObjectKind::Plain | ObjectKind::Criteria => {
                for (_, member) in &self.members {
                    match member {
                        Member::Property(p) => p.reset(),
                        Member::Object(o) => o.reset(),
                    }
                }
            }
        }
        self.errors.borrow_mut().clear();
        self.changed.send(&ObjectChange::ValidationErrors);
    }

    // ── Readiness ────────────────────────────────────────────────────

    /// Returns `true` if no member is waiting for anything.
    pub fn is_ready(&self) -> bool {
        let members_ready = self.members.iter().all(|(_, member)| match member {
            Member::Property(p) => p.is_ready(),
            Member::Object(o) => o.is_ready(),
        });
        members_ready
            && match &self.kind {
                ObjectKind::List(list) => {
                    list.template.is_ready() && list.items().iter().all(|i| i.is_ready())
                }
                ObjectKind::DataList(state) => state.criteria.as_ref().map_or(true, |c| c.is_ready()),
                ObjectKind::Plain | ObjectKind::Criteria => true,
            }
    }

    /// Runs `callback` once the whole tree is ready: right away if it is,
    /// otherwise when the last wait item is removed. Registering the same
    /// callback twice runs it once.
    pub fn on_ready(&self, callback: Rc<dyn Fn()>) {
        if self.is_ready() {
            callback();
            return;
        }
        let mut callbacks = self.ready_callbacks.borrow_mut();
        if !callbacks.iter().any(|cb| Rc::ptr_eq(cb, &callback)) {
            callbacks.push(callback);
        }
    }

    /// Lets the root of the tree run its ready callbacks if every member
    /// is ready.
    pub fn check_if_ready(&self) {
        if let Some(parent) = self.parent() {
            parent.check_if_ready();
        } else if self.is_ready() {
            let callbacks = std::mem::take(&mut *self.ready_callbacks.borrow_mut());
            for callback in callbacks {
                callback();
            }
        }
    }

    // ── JSON ─────────────────────────────────────────────────────────

    /// Imports wire data with default options.
    pub fn from_json(&self, json: &Json) -> FormkitResult<()> {
        self.import(json, ImportOptions::default())
    }

    /// Imports wire data.
    ///
    /// Fields are matched to properties by name or `{name}Property`, and to
    /// child objects by name, `{name}Object` or `{name}List`. Every imported
    /// property ends up `Clean`. Unknown fields are ignored.
    pub fn import(&self, json: &Json, options: ImportOptions) -> FormkitResult<()> {
        match &self.kind {
            ObjectKind::List(list) => self.import_items(list, json),
            ObjectKind::DataList(state) => self.import_rows(state, json, options),
            ObjectKind::Criteria => {
                self.import_members(json)?;
                self.clear_blank_operators();
                Ok(())
            }
            ObjectKind::Plain => self.import_members(json),
        }
    }

    fn import_members(&self, json: &Json) -> FormkitResult<()> {
        let Json::Object(map) = json else {
            return Err(FormkitError::Serialization(format!(
                "expected an object for '{self}', got {json}"
            )));
        };
        for (key, value) in map {
            if let Some(p) = self.data_property(key) {
                p.set_value(Value::from_json(value), ValueFormat::Transport);
                p.set_modified(Modified::Clean);
            } else if let Some(child) = self.child_object(key) {
                if !value.is_null() {
                    child.from_json(value)?;
                }
            } else {
                tracing::trace!(object = %self, field = %key, "ignoring unknown field");
            }
        }
        Ok(())
    }

    /// Exports wire data with default options.
    pub fn to_json(&self) -> Json {
        self.export(&ExportOptions::default())
    }

    /// Exports wire data.
    ///
    /// Properties are keyed by name; child objects by their name without
    /// an `Object` or `List` suffix.
    pub fn export(&self, options: &ExportOptions) -> Json {
        match &self.kind {
            ObjectKind::List(list) => self.export_items(list, &options.for_item()),
            ObjectKind::DataList(state) => self.export_rows(state, &options.for_item()),
            ObjectKind::Plain | ObjectKind::Criteria => self.export_members(options),
        }
    }

    fn export_members(&self, options: &ExportOptions) -> Json {
        let mut res = serde_json::Map::new();
        for (slot, member) in &self.members {
            match member {
                Member::Property(p) => {
                    if !options.includes(p.name()) {
                        continue;
                    }
                    let value = p.transport_value();
                    if options.ignore_empty && is_empty_value(&value) {
                        continue;
                    }
                    res.insert(p.name().to_string(), value.to_json());
                }
                Member::Object(o) => {
                    let key = wire_name(slot);
                    if options.includes(key) {
                        res.insert(key.to_string(), o.export(&options.for_child(key)));
                    }
                }
            }
        }
        Json::Object(res)
    }

    // ── URLs ─────────────────────────────────────────────────────────

    /// Encodes the non-empty property values as a URL query string. A
    /// multi-valued property repeats its name once per value.
    pub fn to_url_params(&self) -> String {
        let mut pairs = Vec::new();
        for p in self.properties() {
            let value = p.transport_value();
            if is_empty_value(&value) {
                continue;
            }
            let key = encode_component(p.name());
            match value {
                Value::List(items) => {
                    for item in items.iter().filter(|v| !is_empty_value(v)) {
                        pairs.push(format!("{key}={}", encode_component(&url_text(item))));
                    }
                }
                other => pairs.push(format!("{key}={}", encode_component(&url_text(&other)))),
            }
        }
        pairs.join("&")
    }

    /// Replaces `{Name}` placeholders in `template` with the encoded
    /// transport values of the named properties. Unknown names are left in
    /// place.
    pub fn format_url(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start + 1..];
            let Some(end) = tail.find('}') else {
                out.push_str(&rest[start..]);
                return out;
            };
            let name = &tail[..end];
            match self.data_property(name) {
                Some(p) => {
                    let value = p.transport_value();
                    let text = match &value {
                        Value::List(items) => items.iter().map(url_text).collect::<Vec<_>>().join(","),
                        other => url_text(other),
                    };
                    out.push_str(&encode_component(&text));
                }
                None => {
                    out.push('{');
                    out.push_str(name);
                    out.push('}');
                }
            }
            rest = &tail[end + 1..];
        }
        out.push_str(rest);
        out
    }

    /// Imports a URL query string such as `Name=Ann&Tag=a&Tag=b`. Repeated
    /// names become lists.
    pub fn from_query(&self, query: &str) -> FormkitResult<()> {
        let mut map = serde_json::Map::new();
        for pair in query.trim_start_matches('?').split('&').filter(|s| !s.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = decode_component(key);
            let value = Json::String(decode_component(value));
            match map.get_mut(&key) {
                Some(Json::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Json::Array(vec![first, value]);
                }
                None => {
                    map.insert(key, value);
                }
            }
        }
        self.from_json(&Json::Object(map))
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Reads the object through its handler and imports the returned data.
    pub async fn read_async(&self) -> FormkitResult<()> {
        self.read().instrument(model_span("read", &self.name())).await
    }

    async fn read(&self) -> FormkitResult<()> {
        if let Some(json) = self.handler.do_read(self).await? {
            self.from_json(&json)?;
        }
        self.is_new.set(false);
        tracing::debug!("object read");
        Ok(())
    }

    /// Validates the object and, if it has no errors, saves it through its
    /// handler. A rejected save returns [`FormkitError::Validation`] and
    /// never reaches the handler.
    pub async fn save_async(&self) -> FormkitResult<()> {
        self.save().instrument(model_span("save", &self.name())).await
    }

    async fn save(&self) -> FormkitResult<()> {
        self.validate(true);
        let errors = self.validation_errors();
        if errors.has_errors() {
            tracing::warn!(errors = errors.len(), "save rejected by validation");
            return Err(FormkitError::Validation(errors));
        }
        self.handler.do_save(self).await?;
        self.is_new.set(false);
        self.set_modified(Modified::Clean);
        tracing::debug!("object saved");
        Ok(())
    }

    /// Deletes the object through its handler.
    pub async fn delete_async(&self) -> FormkitResult<()> {
        let span = model_span("delete", &self.name());
        self.handler.do_delete(self).instrument(span).await?;
        tracing::debug!(object = %self, "object deleted");
        Ok(())
    }
}

/// Null, blank text and empty lists are left out of compact exports.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::List(items) => items.is_empty(),
        _ => false,
    }
}

fn wire_name(slot: &str) -> &str {
    slot.strip_suffix("Object")
        .or_else(|| slot.strip_suffix("List"))
        .filter(|s| !s.is_empty())
        .unwrap_or(slot)
}

fn url_text(value: &Value) -> String {
    match value.to_json() {
        Json::String(s) => s,
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, URL_COMPONENT).to_string()
}

fn decode_component(text: &str) -> String {
    percent_decode_str(&text.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn person() -> Rc<DataObject> {
        DataObject::builder("Person")
            .property("Name", PropertyDef::text().required(true))
            .property("Age", PropertyDef::positive_integer())
            .property("Tags", PropertyDef::text().multi_valued(true))
            .build()
    }

    #[test]
    fn test_members_are_wired() {
        let obj = person();
        let name = obj.data_property("Name").unwrap();
        assert!(Rc::ptr_eq(&name.parent().unwrap(), &obj));
        assert_eq!(obj.properties().count(), 3);
        assert_eq!(obj.modified(), Modified::Unset);
    }

    #[test]
    fn test_property_alias_lookup() {
        let obj = DataObject::builder("Order")
            .property("TotalProperty", PropertyDef::money())
            .build();
        assert!(obj.data_property("Total").is_some());
        assert!(obj.data_property("TotalProperty").is_some());
        assert!(obj.data_property("Other").is_none());
    }

    #[test]
    fn test_import_marks_clean() {
        let obj = person();
        obj.from_json(&json!({"Name": "Ann", "Age": 30, "Unknown": 1})).unwrap();
        assert_eq!(obj.modified(), Modified::Clean);
        obj.data_property("Name").unwrap().set_internal_value(Value::from("Bob"));
        assert_eq!(obj.modified(), Modified::Dirty);
        obj.set_modified(Modified::Clean);
        assert_eq!(obj.data_property("Name").unwrap().modified(), Modified::Clean);
    }

    #[test]
    fn test_import_rejects_non_object() {
        let obj = person();
        let err = obj.from_json(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, FormkitError::Serialization(_)));
    }

    #[test]
    fn test_export_ignores_empty_by_default() {
        let obj = person();
        obj.from_json(&json!({"Name": "Ann"})).unwrap();
        assert_eq!(obj.to_json(), json!({"Name": "Ann"}));
        assert_eq!(
            obj.export(&ExportOptions::all()),
            json!({"Name": "Ann", "Age": null, "Tags": null})
        );
    }

    #[test]
    fn test_export_keeps_zero() {
        let obj = person();
        obj.from_json(&json!({"Age": 0})).unwrap();
        assert_eq!(obj.to_json(), json!({"Age": 0}));
    }

    #[test]
    fn test_export_contract() {
        let obj = person();
        obj.from_json(&json!({"Name": "Ann", "Age": 30})).unwrap();
        let options = ExportOptions::default().with_contract(json!({"Age": null}));
        assert_eq!(obj.export(&options), json!({"Age": 30}));
    }

    #[test]
    fn test_read_only_container_vetoes_descendants() {
        let address = DataObject::builder("Address")
            .property("City", PropertyDef::text())
            .build();
        let obj = DataObject::builder("Customer").child("AddressObject", address).build();
        let city = obj.child_object("Address").unwrap().data_property("City").unwrap();
        assert!(city.is_editable());
        obj.set_editable(false);
        assert!(!city.is_editable());
        obj.set_editable(true);
        obj.set_access_level(AccessLevel::ReadOnly);
        assert!(!city.is_editable());
    }

    #[test]
    fn test_child_export_name_strips_suffix() {
        let address = DataObject::builder("Address")
            .property("City", PropertyDef::text())
            .build();
        let obj = DataObject::builder("Customer").child("AddressObject", address).build();
        obj.from_json(&json!({"Address": {"City": "Paris"}})).unwrap();
        assert_eq!(obj.to_json(), json!({"Address": {"City": "Paris"}}));
        assert_eq!(obj.child_object("Address").unwrap().name(), "AddressObject");
    }

    #[test]
    fn test_validate_merges_and_memoizes() {
        let obj = person();
        obj.validate(false);
        assert!(obj.is_validated());
        assert_eq!(obj.validation_errors().errors_text(), "Name is required.");
        obj.data_property("Name").unwrap().set_internal_value(Value::from("Ann"));
        assert!(!obj.is_validated());
        obj.validate(false);
        assert!(obj.validation_errors().is_empty());
    }

    #[test]
    fn test_untracked_object_reads_clean() {
        let obj = DataObject::builder("Filter")
            .property("Name", PropertyDef::text())
            .track_modifications(false)
            .build();
        obj.data_property("Name").unwrap().set_internal_value(Value::from("x"));
        obj.data_property("Name").unwrap().set_internal_value(Value::from("y"));
        assert_eq!(obj.modified(), Modified::Clean);
    }

    #[test]
    fn test_on_ready_fires_once() {
        let obj = person();
        let name = obj.data_property("Name").unwrap();
        name.add_wait_item("x");
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        let callback: Rc<dyn Fn()> = Rc::new(move || c.set(c.get() + 1));
        obj.on_ready(Rc::clone(&callback));
        obj.on_ready(callback);
        assert_eq!(count.get(), 0);
        name.remove_wait_item("x");
        assert_eq!(count.get(), 1);
        obj.check_if_ready();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_url_params_and_query() {
        let obj = person();
        obj.from_json(&json!({"Name": "Ann Lee", "Age": 30, "Tags": ["a&b", "c"]})).unwrap();
        assert_eq!(obj.to_url_params(), "Name=Ann%20Lee&Age=30&Tags=a%26b&Tags=c");

        let copy = person();
        copy.from_query("?Name=Ann+Lee&Age=30&Tags=a%26b&Tags=c").unwrap();
        assert_eq!(copy.to_json(), obj.to_json());
    }

    #[test]
    fn test_format_url() {
        let obj = person();
        obj.from_json(&json!({"Name": "A/B", "Age": 7})).unwrap();
        assert_eq!(
            obj.format_url("person/{Name}/age/{Age}?x={Other}"),
            "person/A%2FB/age/7?x={Other}"
        );
        assert_eq!(obj.format_url("open {brace"), "open {brace");
    }

    #[test]
    fn test_wire_name() {
        assert_eq!(wire_name("AddressObject"), "Address");
        assert_eq!(wire_name("LinesList"), "Lines");
        assert_eq!(wire_name("List"), "List");
    }
}
