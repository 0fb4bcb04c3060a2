//! Data properties.
//!
//! A [`DataProperty`] is a single typed, validatable, format-convertible field
//! of a [`DataObject`]. It stores its value in the typed internal form and
//! derives the other projections from it on demand:
//!
//! | Projection | Method | Example for a money property |
//! |---|---|---|
//! | Internal | [`DataProperty::internal_value`] | `Value::Decimal(1234.5)` |
//! | Transport | [`DataProperty::transport_value`] | `Value::Decimal(1234.5)` |
//! | EditString | [`DataProperty::edit_string`] | `"1234.5"` |
//! | DisplayString | [`DataProperty::display_string`] | `"$1,234.50"` |
//!
//! ## Modification tracking
//!
//! The first assignment moves [`Modified`] from `Unset` to `Clean`. Every
//! later change while the property is editable moves it to `Dirty` and
//! re-validates the property immediately.
//!
//! ## Derived flags
//!
//! `is_editable`, `is_visible` and `is_required` combine the property's own
//! flag, the parent object's delegation decision and the access level. Only
//! the own flags can be set.

mod convert;
mod enumeration;
mod kind;
mod operator;

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use formkit_core::utils::text::pascal_to_words;
use formkit_core::{ErrorList, Value, ValueFormat, SETTINGS};
use formkit_signals::Signal;
use once_cell::unsync::OnceCell;
use regex::Regex;

use crate::object::DataObject;
use crate::state::{AccessLevel, Modified};
use crate::validators::{default_validators, PropertyValidator};

pub use kind::{CascadeNullMode, PropertyDef, PropertyKind};
pub use operator::{
    ATTR_ADDL_PROPS, ATTR_EXCLUDE_TYPE, ATTR_MULTI_VALUE, ATTR_NULL_CHECK, ATTR_SORT_ORDER, ATTR_TYPE,
};

use enumeration::EnumBinding;
use operator::OperatorBinding;

/// The wait item an enumerated property registers while its lookup table
/// is loading.
pub const WAIT_LOOKUP: &str = "lookup";

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

/// What changed on a property, sent through [`DataProperty::changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyChange {
    /// The internal value, and with it every projection.
    Value,
    /// The modification state.
    Modified,
    /// The own editable flag.
    Editable,
    /// The own visible flag.
    Visible,
    /// The own required flag.
    Required,
    /// The access level.
    AccessLevel,
    /// The list of possible values.
    PossibleValues,
    /// The validation errors.
    ValidationErrors,
}

/// A single typed field of a data object.
pub struct DataProperty {
    this: Weak<Self>,
    uid: u64,
    name: String,
    def: PropertyDef,
    parent: RefCell<Weak<DataObject>>,
    access_level: Cell<AccessLevel>,
    editable: Cell<bool>,
    visible: Cell<bool>,
    required: Cell<bool>,
    value: RefCell<Value>,
    modified: Cell<Modified>,
    validated: Cell<bool>,
    errors: RefCell<ErrorList>,
    validators: RefCell<Vec<Rc<dyn PropertyValidator>>>,
    possible_values: RefCell<Option<Vec<Value>>>,
    wait_items: RefCell<BTreeSet<String>>,
    separators: OnceCell<Option<Regex>>,
    enum_binding: Option<EnumBinding>,
    operator: Option<OperatorBinding>,
    changed: Signal<PropertyChange>,
}

impl fmt::Debug for DataProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataProperty")
            .field("name", &self.name)
            .field("kind", &self.def.kind)
            .field("value", &self.value.borrow())
            .field("modified", &self.modified.get())
            .finish_non_exhaustive()
    }
}

/// Displays the label, or the words of the name if no label is set.
impl fmt::Display for DataProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl DataProperty {
    /// Creates a standalone property. Properties declared on a
    /// [`DataObject`] are created by its builder instead.
    pub fn new(name: impl Into<String>, mut def: PropertyDef) -> Rc<Self> {
        let mut validators = default_validators(def.kind);
        validators.append(&mut def.validators);

        let prop = Rc::new_cyclic(|this: &Weak<Self>| {
            let enum_binding = def.kind.is_enum().then(|| {
                EnumBinding::new(def.enum_type.clone().unwrap_or_default(), this.clone())
            });
            let operator = (def.kind == PropertyKind::Operator).then(OperatorBinding::default);
            Self {
                this: this.clone(),
                uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
                name: name.into(),
                parent: RefCell::new(Weak::new()),
                access_level: Cell::new(def.access_level),
                editable: Cell::new(def.editable),
                visible: Cell::new(def.visible),
                required: Cell::new(def.required),
                value: RefCell::new(Value::Null),
                modified: Cell::new(Modified::Unset),
                validated: Cell::new(false),
                errors: RefCell::new(ErrorList::new()),
                validators: RefCell::new(validators),
                possible_values: RefCell::new(None),
                wait_items: RefCell::new(BTreeSet::new()),
                separators: OnceCell::new(),
                enum_binding,
                operator,
                changed: Signal::new(),
                def,
            }
        });
        prop.connect_local_loader();
        prop
    }

    // ── Identity ─────────────────────────────────────────────────────

    /// The property name, unique within its object.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The property kind.
    pub const fn kind(&self) -> PropertyKind {
        self.def.kind
    }

    /// The user-facing label: the declared label, or the words of the name.
    pub fn label(&self) -> String {
        self.def
            .label
            .clone()
            .unwrap_or_else(|| pascal_to_words(&self.name))
    }

    /// The signal that announces every change of this property.
    pub const fn changed(&self) -> &Signal<PropertyChange> {
        &self.changed
    }

    /// The owning object, if the property belongs to one that is alive.
    pub fn parent(&self) -> Option<Rc<DataObject>> {
        self.parent.borrow().upgrade()
    }

    pub(crate) fn set_parent(&self, parent: &Rc<DataObject>) {
        *self.parent.borrow_mut() = Rc::downgrade(parent);
    }

    // ── Options ──────────────────────────────────────────────────────

    /// Whether the property holds a list of values.
    pub const fn is_multi_valued(&self) -> bool {
        self.def.multi_valued
    }

    /// Whether the property is a key of its object.
    pub const fn is_key(&self) -> bool {
        self.def.is_key
    }

    /// The maximum text length, if any.
    pub const fn size(&self) -> Option<usize> {
        self.def.size
    }

    /// The numeric minimum, if any.
    pub const fn minimum(&self) -> Option<f64> {
        self.def.minimum
    }

    /// The numeric maximum, if any.
    pub const fn maximum(&self) -> Option<f64> {
        self.def.maximum
    }

    /// The text shown for a null value.
    pub fn null_string(&self) -> String {
        self.def
            .null_string
            .clone()
            .unwrap_or_else(|| SETTINGS.get().null_string.clone())
    }

    /// The text shown for a value the user has no access to.
    pub fn restricted_string(&self) -> String {
        self.def
            .restricted_string
            .clone()
            .unwrap_or_else(|| SETTINGS.get().restricted_string.clone())
    }

    // ── Access and derived flags ─────────────────────────────────────

    /// The access level.
    pub fn access_level(&self) -> AccessLevel {
        self.access_level.get()
    }

    /// Sets the access level.
    pub fn set_access_level(&self, level: AccessLevel) {
        if self.access_level.replace(level) != level {
            self.invalidate();
            self.changed.send(&PropertyChange::AccessLevel);
        }
    }

    /// Sets the own editable flag.
    pub fn set_editable(&self, editable: bool) {
        if self.editable.replace(editable) != editable {
            self.invalidate();
            self.changed.send(&PropertyChange::Editable);
        }
    }

    /// Sets the own visible flag.
    pub fn set_visible(&self, visible: bool) {
        if self.visible.replace(visible) != visible {
            self.invalidate();
            self.changed.send(&PropertyChange::Visible);
            if self.operator.is_some() {
                self.update_companions();
            }
        }
    }

    /// Sets the own required flag.
    pub fn set_required(&self, required: bool) {
        if self.required.replace(required) != required {
            self.invalidate();
            self.changed.send(&PropertyChange::Required);
        }
    }

    /// Own flag, parent delegation, and an access level above read-only.
    pub fn is_editable(&self) -> bool {
        self.editable.get()
            && self.access_level() > AccessLevel::ReadOnly
            && self.parent().map_or(true, |p| p.is_property_editable(self))
    }

    /// Own flag, parent delegation, and an access level above none.
    pub fn is_visible(&self) -> bool {
        self.visible.get()
            && self.access_level() > AccessLevel::None
            && self.parent().map_or(true, |p| p.is_property_visible(self))
    }

    /// Own flag, editable, visible, and parent delegation.
    pub fn is_required(&self) -> bool {
        self.required.get()
            && self.is_editable()
            && self.is_visible()
            && self.parent().map_or(true, |p| p.is_property_required(self))
    }

    // ── Values ───────────────────────────────────────────────────────

    /// Returns `true` if `value` counts as null for this property: missing,
    /// an empty list, blank text, or the null placeholder.
    pub fn is_value_null(&self, value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::List(items) => items.is_empty(),
            other => {
                let text = other.to_string();
                let text = text.trim();
                text.is_empty() || text == self.null_string()
            }
        }
    }

    /// Returns `true` if the current value is null.
    pub fn is_null(&self) -> bool {
        let value = self.value.borrow();
        self.is_value_null(&value)
    }

    /// Converts a value, or a list of values, to the given format.
    ///
    /// A restricted property returns the restricted placeholder for display
    /// and the value unchanged otherwise. A null value yields the null
    /// placeholder for string formats and [`Value::Null`] for typed ones.
    /// Multi-valued properties convert every element and join string results
    /// with the display list separator.
    pub fn resolve_value(&self, value: &Value, out: ValueFormat, input: Option<ValueFormat>) -> Value {
        if self.access_level() == AccessLevel::None {
            return if out == ValueFormat::DisplayString {
                Value::String(self.restricted_string())
            } else {
                value.clone()
            };
        }
        if self.is_value_null(value) {
            return self.null_for(out);
        }
        if !self.is_multi_valued() {
            return self.convert_value(value, out, input);
        }

        let items: Vec<Value> = match value {
            Value::List(items) => items.clone(),
            Value::String(s) => self
                .split_list(s)
                .into_iter()
                .map(Value::String)
                .collect(),
            other => vec![other.clone()],
        };
        if items.is_empty() {
            return self.null_for(out);
        }
        let converted: Vec<Value> = items
            .iter()
            .map(|item| self.convert_value(item, out, input))
            .collect();
        if out.is_typed() {
            Value::List(converted)
        } else {
            let separator = &SETTINGS.get().display_list_separator;
            Value::String(
                converted
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(separator),
            )
        }
    }

    fn null_for(&self, out: ValueFormat) -> Value {
        if out.is_string() {
            Value::String(self.null_string())
        } else {
            Value::Null
        }
    }

    fn split_list(&self, text: &str) -> Vec<String> {
        let separators = self
            .separators
            .get_or_init(|| Regex::new(&SETTINGS.get().list_separators).ok());
        let parts: Vec<&str> = match separators {
            Some(re) => re.split(text).collect(),
            None => text.split([',', ';', '\n']).collect(),
        };
        parts
            .into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    /// The value as stored.
    pub fn internal_value(&self) -> Value {
        self.value.borrow().clone()
    }

    /// The value converted to the given format.
    pub fn value_in(&self, format: ValueFormat) -> Value {
        let value = self.internal_value();
        self.resolve_value(&value, format, Some(ValueFormat::Internal))
    }

    /// The wire-safe projection of the value.
    pub fn transport_value(&self) -> Value {
        self.value_in(ValueFormat::Transport)
    }

    /// The text a user edits.
    pub fn edit_string(&self) -> String {
        self.value_in(ValueFormat::EditString).to_string()
    }

    /// The read-only rendering.
    pub fn display_string(&self) -> String {
        self.value_in(ValueFormat::DisplayString).to_string()
    }

    /// Converts `value` to the internal format and stores it.
    pub fn set_internal_value(&self, value: Value) {
        let internal = self.resolve_value(&value, ValueFormat::Internal, None);
        self.store(internal);
    }

    /// Converts `value`, given in `format`, to the internal format and
    /// stores it.
    pub fn set_value(&self, value: Value, format: ValueFormat) {
        let internal = self.resolve_value(&value, ValueFormat::Internal, Some(format));
        self.store(internal);
    }

    /// Clears the value and the validation errors.
    pub fn reset(&self) {
        self.set_internal_value(Value::Null);
        self.errors.borrow_mut().clear();
        self.changed.send(&PropertyChange::ValidationErrors);
    }

    fn store(&self, value: Value) {
        let unchanged = same_value(&self.value.borrow(), &value);
        if unchanged {
            return;
        }
        *self.value.borrow_mut() = value;
        self.invalidate();

        if self.modified.get() == Modified::Unset {
            self.set_modified(Modified::Clean);
        } else if self.is_editable() {
            self.set_modified(Modified::Dirty);
            self.validate(true);
        }
        if self.operator.is_some() {
            self.update_companions();
        }
        self.changed.send(&PropertyChange::Value);
    }

    /// Runs `f` and then restores the modification state from before it.
    pub(crate) fn preserving_modified(&self, f: impl FnOnce(&Self)) {
        let saved = self.modified.replace(Modified::Unset);
        f(self);
        self.set_modified(saved);
    }

    // ── Modification ─────────────────────────────────────────────────

    /// The modification state.
    pub fn modified(&self) -> Modified {
        self.modified.get()
    }

    /// Sets the modification state. Writing the current state is a no-op.
    pub fn set_modified(&self, modified: Modified) {
        if self.modified.replace(modified) != modified {
            self.changed.send(&PropertyChange::Modified);
        }
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Whether the current value has been validated since it last changed.
    pub fn is_validated(&self) -> bool {
        self.validated.get()
    }

    pub(crate) fn clear_validated(&self) {
        self.validated.set(false);
    }

    fn invalidate(&self) {
        self.validated.set(false);
        if let Some(parent) = self.parent() {
            parent.invalidate();
        }
    }

    /// Runs the validators against every element of the value.
    ///
    /// Without `force`, an already validated property is left alone.
    pub fn validate(&self, force: bool) {
        if force {
            self.validated.set(false);
        }
        if self.validated.get() {
            return;
        }

        let value = self.internal_value();
        let validators = self.validators.borrow().clone();
        let mut errors = ErrorList::new();
        let items = match value {
            Value::List(items) if !items.is_empty() => items,
            other => vec![other],
        };
        for item in &items {
            for validator in &validators {
                validator.validate(self, item, &mut errors);
            }
        }

        if errors.has_errors() {
            tracing::trace!(property = %self.name, errors = errors.len(), "property validation failed");
        }
        *self.errors.borrow_mut() = errors;
        self.validated.set(true);
        self.changed.send(&PropertyChange::ValidationErrors);
    }

    /// Returns `true` if the property has no errors, validating it first if
    /// `validate` is set.
    pub fn is_valid(&self, validate: bool) -> bool {
        if validate {
            self.validate(false);
        }
        !self.errors.borrow().has_errors()
    }

    /// The errors found by the last validation.
    pub fn validation_errors(&self) -> ErrorList {
        self.errors.borrow().clone()
    }

    /// Appends a validator.
    pub fn add_validator(&self, validator: Rc<dyn PropertyValidator>) {
        self.validators.borrow_mut().push(validator);
        self.validated.set(false);
    }

    // ── Possible values ──────────────────────────────────────────────

    /// The values a user can choose from, or `None` if the property has no
    /// such list (or it is not available yet).
    pub fn possible_values(&self) -> Option<Vec<Value>> {
        let cached = self.possible_values.borrow().clone();
        if cached.is_some() {
            return cached;
        }
        let computed = self.compute_possible_values();
        if computed.is_some() {
            self.possible_values.borrow_mut().clone_from(&computed);
        }
        computed
    }

    /// Recomputes the list of possible values.
    pub fn update_value_list(&self) {
        let computed = self.compute_possible_values();
        *self.possible_values.borrow_mut() = computed;
        self.changed.send(&PropertyChange::PossibleValues);
    }

    fn compute_possible_values(&self) -> Option<Vec<Value>> {
        if self.enum_binding.is_some() {
            self.enum_possible_values()
        } else {
            None
        }
    }

    // ── Readiness ────────────────────────────────────────────────────

    /// Returns `true` if the property is not waiting for anything.
    pub fn is_ready(&self) -> bool {
        self.wait_items.borrow().is_empty()
    }

    /// Registers an item the property must wait for before it is ready.
    pub fn add_wait_item(&self, item: &str) {
        self.wait_items.borrow_mut().insert(item.to_string());
    }

    /// Removes a wait item, and lets the parent check whether the whole
    /// tree is ready.
    pub fn remove_wait_item(&self, item: &str) {
        self.wait_items.borrow_mut().remove(item);
        if self.is_ready() {
            if let Some(parent) = self.parent() {
                parent.check_if_ready();
            }
        }
    }

    // ── Initialization ───────────────────────────────────────────────

    /// Finishes setup once every sibling exists: binds cascading drivers and
    /// operator companions by name, then refreshes dependents.
    pub(crate) fn on_initialized(&self) {
        if let Some(parent) = self.parent() {
            for (attribute, driver) in &self.def.cascades {
                match parent.data_property(driver) {
                    Some(d) => self.set_cascading_property(attribute, Some(&d)),
                    None => tracing::warn!(
                        property = %self.name,
                        driver = %driver,
                        "cascading driver not found"
                    ),
                }
            }
        }
        if self.operator.is_some() {
            self.initialize_operator();
        }
        self.changed.send(&PropertyChange::Value);
        self.update_value_list();
    }
}

impl Drop for DataProperty {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}

/// Compares two values the way property assignment does: headers are equal
/// if type, id and validity match.
pub(crate) fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Header(x), Value::Header(y)) => {
            x.header_type == y.header_type && x.id == y.id && x.is_valid == y.is_valid
        }
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| same_value(a, b))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_first_set_is_clean_then_dirty() {
        let p = DataProperty::new("Name", PropertyDef::text());
        assert_eq!(p.modified(), Modified::Unset);
        p.set_internal_value(Value::from("Ann"));
        assert_eq!(p.modified(), Modified::Clean);
        assert!(!p.is_validated());
        p.set_internal_value(Value::from("Bob"));
        assert_eq!(p.modified(), Modified::Dirty);
        assert!(p.is_validated());
    }

    #[test]
    fn test_same_value_does_not_notify() {
        let p = DataProperty::new("Name", PropertyDef::text());
        p.set_internal_value(Value::from("Ann"));
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        p.changed().connect(
            "counter",
            Rc::new(move |change: &PropertyChange| {
                if *change == PropertyChange::Value {
                    c.set(c.get() + 1);
                }
            }),
        );
        p.set_internal_value(Value::from("Ann"));
        assert_eq!(count.get(), 0);
        assert_eq!(p.modified(), Modified::Clean);
    }

    #[test]
    fn test_read_only_edit_is_not_dirty() {
        let p = DataProperty::new("Name", PropertyDef::text().editable(false));
        p.set_internal_value(Value::from("Ann"));
        p.set_internal_value(Value::from("Bob"));
        assert_eq!(p.modified(), Modified::Clean);
    }

    #[test]
    fn test_null_definition() {
        let p = DataProperty::new("Name", PropertyDef::text().null_string("N/A"));
        assert!(p.is_value_null(&Value::Null));
        assert!(p.is_value_null(&Value::from("   ")));
        assert!(p.is_value_null(&Value::from("N/A")));
        assert!(p.is_value_null(&Value::List(vec![])));
        assert!(!p.is_value_null(&Value::Int(0)));
        assert_eq!(p.display_string(), "N/A");
        assert_eq!(p.edit_string(), "N/A");
        assert_eq!(p.transport_value(), Value::Null);
    }

    #[test]
    fn test_restricted_access() {
        let p = DataProperty::new(
            "Salary",
            PropertyDef::money().restricted_string("***").access_level(AccessLevel::None),
        );
        p.set_internal_value(Value::from(100.0));
        assert_eq!(p.display_string(), "***");
        assert!(!p.is_visible());
        assert!(!p.is_editable());
    }

    #[test]
    fn test_multi_valued_wire_items_use_wire_rules() {
        let p = DataProperty::new("Due", PropertyDef::date().edit_format("%d.%m.%Y").multi_valued(true));
        let wire = Value::List(vec!["2024-03-09T00:00:00".into(), "09.03.2024".into()]);
        let march = Value::Date(chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());

        let internal = p.resolve_value(&wire, ValueFormat::Internal, Some(ValueFormat::Transport));
        assert_eq!(internal, Value::List(vec![march.clone(), Value::from("09.03.2024")]));
        let edited = p.resolve_value(&wire, ValueFormat::Internal, Some(ValueFormat::EditString));
        assert_eq!(edited.as_list().map(|items| items[1].clone()), Some(march));

        let dates = Value::List(vec!["2024-03-09T00:00:00".into(), "2024-04-01T00:00:00".into()]);
        p.set_value(dates.clone(), ValueFormat::Transport);
        assert_eq!(p.transport_value(), dates);
        assert_eq!(p.edit_string(), "09.03.2024, 01.04.2024");
    }

    #[test]
    fn test_flag_changes_drop_validation_memo() {
        let p = DataProperty::new("Name", PropertyDef::text().required(true));
        p.set_internal_value(Value::from("Ann"));
        p.set_visible(false);
        p.set_internal_value(Value::Null);
        assert!(p.is_validated());
        assert!(p.is_valid(false));

        p.set_visible(true);
        assert!(!p.is_validated());
        assert!(!p.is_valid(true));
        assert_eq!(p.validation_errors().errors_text(), "Name is required.");

        p.set_required(false);
        assert!(p.is_valid(true));
        p.set_required(true);
        p.set_access_level(AccessLevel::ReadOnly);
        assert!(p.is_valid(true));
        p.set_access_level(AccessLevel::Full);
        p.set_editable(false);
        assert!(p.is_valid(true));
        p.set_editable(true);
        assert!(!p.is_valid(true));
    }

    #[test]
    fn test_multi_valued_split_and_join() {
        let p = DataProperty::new("Tags", PropertyDef::text().multi_valued(true));
        p.set_value(Value::from("a; b,,c\n d "), ValueFormat::EditString);
        assert_eq!(
            p.internal_value(),
            Value::List(vec!["a".into(), "b".into(), "c".into(), "d".into()])
        );
        assert_eq!(p.display_string(), "a, b, c, d");
        p.set_value(Value::from(" ; , "), ValueFormat::EditString);
        assert!(p.is_null());
    }

    #[test]
    fn test_required_runs_per_element_and_on_null() {
        let p = DataProperty::new("Codes", PropertyDef::integer().multi_valued(true).required(true));
        p.validate(true);
        assert_eq!(p.validation_errors().errors_text(), "Codes is required.");
        p.set_internal_value(Value::List(vec![Value::from("1"), Value::from("x")]));
        p.validate(true);
        assert_eq!(p.validation_errors().len(), 1);
        assert!(p.validation_errors().errors_text().contains("must be a number"));
    }

    #[test]
    fn test_required_needs_editable_and_visible() {
        let p = DataProperty::new("Name", PropertyDef::text().required(true));
        assert!(p.is_required());
        p.set_visible(false);
        assert!(!p.is_required());
        p.set_visible(true);
        p.set_access_level(AccessLevel::ReadOnly);
        assert!(!p.is_required());
    }

    #[test]
    fn test_validate_is_memoized() {
        let p = DataProperty::new("Name", PropertyDef::text().required(true));
        p.validate(false);
        let first = p.validation_errors();
        p.validate(false);
        assert_eq!(p.validation_errors(), first);
        assert!(!p.is_valid(false));
    }

    #[test]
    fn test_reset_clears_errors() {
        let p = DataProperty::new("Name", PropertyDef::text().required(true));
        p.set_internal_value(Value::from("x"));
        p.set_internal_value(Value::Null);
        assert!(p.validation_errors().has_errors());
        p.reset();
        assert!(p.validation_errors().is_empty());
        assert!(p.is_null());
    }

    #[test]
    fn test_wait_items() {
        let p = DataProperty::new("Status", PropertyDef::text());
        p.add_wait_item("x");
        p.add_wait_item("x");
        assert!(!p.is_ready());
        p.remove_wait_item("x");
        assert!(p.is_ready());
    }

    #[test]
    fn test_label_defaults_to_words() {
        let p = DataProperty::new("OrderDate", PropertyDef::date());
        assert_eq!(p.to_string(), "Order Date");
        let p = DataProperty::new("OrderDate", PropertyDef::date().label("Ordered on"));
        assert_eq!(p.label(), "Ordered on");
    }

    #[test]
    fn test_same_value_headers() {
        use formkit_core::Header;
        let a = Value::from(Header::new("s", "A", "Active"));
        let b = Value::from(Header::new("s", "A", "Other text"));
        let c = Value::from(Header::invalid("s", "A"));
        assert!(same_value(&a, &b));
        assert!(!same_value(&a, &c));
    }
}
