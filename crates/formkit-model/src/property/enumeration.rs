//! Enumerated properties: lookup-table resolution, possible values, and
//! cascading filters.
//!
//! The internal value of an enumerated property is a [`Header`] from the
//! lookup table of the property's enum type. Input that does not resolve to
//! a record becomes an invalid header carrying the input as its id, and is
//! resolved again once the table arrives.
//!
//! The table comes from, in order: a table set with
//! [`DataProperty::set_lookup_table`], the property's local loader, the cache
//! given in its declaration, or the thread's global [`LookupCache`].

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::{Rc, Weak};

use formkit_core::header::FIELD_ID;
use formkit_core::header::FIELD_TEXT;
use formkit_core::{Header, Value, ValueFormat, SETTINGS};
use formkit_lookup::{LookupCache, LookupTable, ReadyCallback};

use super::{CascadeNullMode, DataProperty, PropertyChange, PropertyKind, WAIT_LOOKUP};

pub(super) struct EnumBinding {
    enum_type: String,
    local_table: RefCell<Option<Rc<LookupTable>>>,
    drivers: RefCell<Vec<(String, Weak<DataProperty>)>>,
    on_table_ready: ReadyCallback,
}

impl EnumBinding {
    pub(super) fn new(enum_type: String, owner: Weak<DataProperty>) -> Self {
        let on_table_ready: ReadyCallback = Rc::new(move |table_type: &str| {
            if let Some(prop) = owner.upgrade() {
                tracing::trace!(property = %prop.name(), table_type, "lookup table ready");
                prop.update_value();
                prop.update_list();
            }
        });
        Self {
            enum_type,
            local_table: RefCell::new(None),
            drivers: RefCell::new(Vec::new()),
            on_table_ready,
        }
    }
}

fn cascade_key(uid: u64, attribute: &str) -> String {
    format!("cascade:{uid}:{attribute}")
}

fn loader_key(uid: u64) -> String {
    format!("enum:{uid}")
}

/// Flattens a list into its items; any other value is a list of one.
fn items_of(value: Value) -> Vec<Value> {
    match value {
        Value::List(items) => items,
        other => vec![other],
    }
}

fn loosely_equal(a: &Value, b: &Value) -> bool {
    a == b || a.to_string() == b.to_string()
}

impl DataProperty {
    /// The lookup table type of an enumerated property.
    pub fn enum_type(&self) -> Option<&str> {
        self.enum_binding.as_ref().map(|b| b.enum_type.as_str())
    }

    fn key_format(&self) -> &str {
        self.def.key_format.as_deref().unwrap_or(FIELD_ID)
    }

    fn header_display_format(&self) -> &str {
        self.def.display_format.as_deref().unwrap_or(FIELD_TEXT)
    }

    fn source_cache(&self) -> Rc<LookupCache> {
        if let Some(loader) = &self.def.local_loader {
            return Rc::clone(loader.cache());
        }
        self.def.cache.clone().unwrap_or_else(LookupCache::global)
    }

    /// Returns the lookup table, starting a load if it is not cached.
    ///
    /// When the load completes the property re-resolves unresolved values
    /// and refreshes its possible values.
    pub fn lookup_table(&self) -> Option<Rc<LookupTable>> {
        let binding = self.enum_binding.as_ref()?;
        let local = binding.local_table.borrow().clone();
        if local.is_some() {
            return local;
        }
        let on_ready = Some(Rc::clone(&binding.on_table_ready));
        match &self.def.local_loader {
            Some(loader) => loader.lookup_table(on_ready),
            None => self.source_cache().lookup_table(&binding.enum_type, on_ready),
        }
    }

    /// Uses `table` instead of the cached table, or goes back to the cache
    /// with `None`.
    ///
    /// A current value the table does not know is cleared without changing
    /// the modification state.
    pub fn set_lookup_table(&self, table: Option<Rc<LookupTable>>) {
        let Some(binding) = &self.enum_binding else {
            return;
        };
        binding.local_table.borrow_mut().clone_from(&table);
        match table {
            Some(table) => self.apply_table(&table),
            None => self.update_value(),
        }
        self.update_value_list();
    }

    /// Drops the values the table does not know, then re-resolves the rest.
    fn apply_table(&self, table: &LookupTable) {
        let known = |v: &Value| table.lookup_by_id(&v.to_string()).is_some();
        let transport = self.transport_value();
        match transport {
            Value::Null => {}
            Value::List(ids) => {
                if !ids.iter().all(known) {
                    let kept: Vec<Value> = ids.into_iter().filter(|v| known(v)).collect();
                    self.preserving_modified(|p| p.set_value(Value::List(kept), ValueFormat::Transport));
                }
            }
            id if !known(&id) => self.preserving_modified(|p| p.set_internal_value(Value::Null)),
            _ => {}
        }
        self.update_value();
    }

    /// Re-resolves values that were entered before the table was available.
    pub(crate) fn update_value(&self) {
        let value = self.internal_value();
        let unresolved = |v: &Value| v.as_header().is_some_and(|h| !h.is_valid);
        let needs_update = match &value {
            Value::List(items) => items.iter().any(unresolved),
            other => unresolved(other),
        };
        if !needs_update {
            return;
        }
        let ids = match value {
            Value::Header(h) => Value::String(h.id),
            Value::List(items) => Value::List(
                items
                    .into_iter()
                    .map(|v| match v {
                        Value::Header(h) => Value::String(h.id),
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        };
        self.preserving_modified(|p| p.set_internal_value(ids));
    }

    fn update_list(&self) {
        self.update_value_list();
        self.remove_wait_item(WAIT_LOOKUP);
    }

    pub(super) fn connect_local_loader(&self) {
        let Some(loader) = &self.def.local_loader else {
            return;
        };
        let owner = self.this.clone();
        loader.reloaded().connect(
            loader_key(self.uid),
            Rc::new(move |table_type: &String| {
                let Some(prop) = owner.upgrade() else {
                    return;
                };
                let table = prop
                    .def
                    .local_loader
                    .as_ref()
                    .and_then(|l| l.cache().cached_table(table_type));
                if let Some(table) = table {
                    prop.apply_table(&table);
                }
                prop.update_list();
            }),
        );
    }

    pub(super) fn disconnect_all(&self) {
        if let Some(loader) = &self.def.local_loader {
            loader.reloaded().disconnect(&loader_key(self.uid));
        }
        if let Some(binding) = &self.enum_binding {
            for (attribute, driver) in binding.drivers.borrow().iter() {
                if let Some(driver) = driver.upgrade() {
                    driver.changed().disconnect(&cascade_key(self.uid, attribute));
                }
            }
        }
    }

    // ── Conversion ───────────────────────────────────────────────────

    pub(super) fn convert_enum(&self, value: &Value, out: ValueFormat) -> Value {
        let enum_type = self.enum_type().unwrap_or_default();
        if out == ValueFormat::Internal {
            if let Value::Header(h) = value {
                if h.header_type == enum_type {
                    return value.clone();
                }
            }
            return Value::from(self.resolve_header(value));
        }

        let header = match value {
            Value::Header(h) => (**h).clone(),
            other => self.resolve_header(other),
        };
        match out {
            ValueFormat::Transport => self.transport_id(&header.id),
            ValueFormat::EditString => Value::String(header.render(self.key_format())),
            _ => Value::String(header.render(self.header_display_format())),
        }
    }

    fn resolve_header(&self, value: &Value) -> Header {
        let enum_type = self.enum_type().unwrap_or_default();
        let key = match value {
            Value::Header(h) => h.id.trim().to_string(),
            other => other.to_string().trim().to_string(),
        };
        let key_format = self.key_format();
        let found = self.lookup_table().and_then(|table| {
            let by_key = if key_format == FIELD_ID {
                None
            } else {
                table.lookup_by_format(key_format, &key)
            };
            by_key.or_else(|| table.lookup_by_id(&key))
        });
        match found {
            Some(mut h) => {
                h.default_format = key_format.to_string();
                h
            }
            None => Header::invalid(enum_type, key),
        }
    }

    fn transport_id(&self, id: &str) -> Value {
        match self.kind() {
            PropertyKind::EnumInt => id
                .trim()
                .parse::<i64>()
                .map_or_else(|_| Value::String(id.to_string()), Value::Int),
            PropertyKind::EnumBool => {
                let settings = SETTINGS.get();
                let token = id.trim();
                if settings.true_strings.iter().any(|s| s.eq_ignore_ascii_case(token)) {
                    Value::Bool(true)
                } else if settings.false_strings.iter().any(|s| s.eq_ignore_ascii_case(token)) {
                    Value::Bool(false)
                } else {
                    Value::String(id.to_string())
                }
            }
            _ => Value::String(id.to_string()),
        }
    }

    // ── Possible values ──────────────────────────────────────────────

    pub(super) fn enum_possible_values(&self) -> Option<Vec<Value>> {
        let Some(table) = self.lookup_table() else {
            let waiting = self.enum_type().is_some_and(|t| {
                self.def
                    .local_loader
                    .as_ref()
                    .map_or_else(|| self.source_cache().is_loading(t), |l| l.cache().is_loading(l.table_type()))
            });
            if waiting {
                self.add_wait_item(WAIT_LOOKUP);
            }
            return None;
        };

        let mut headers: Vec<Header> = table
            .values(|_| true)
            .into_iter()
            .filter(|h| self.filter_header(h))
            .collect();
        if self.kind() == PropertyKind::Operator {
            headers.sort_by(Self::compare_sort_order);
        } else {
            headers.sort_by(|a, b| self.compare_headers(a, b));
        }
        Some(
            headers
                .into_iter()
                .map(|mut h| {
                    h.default_format = self.key_format().to_string();
                    Value::from(h)
                })
                .collect(),
        )
    }

    /// Whether a header can be offered as a value right now.
    pub fn filter_header(&self, header: &Header) -> bool {
        header.is_active
            && self.matches_cascading(header)
            && (self.kind() != PropertyKind::Operator || self.is_applicable(header))
    }

    fn compare_headers(&self, a: &Header, b: &Header) -> Ordering {
        let format = self.header_display_format();
        let (sa, sb) = (a.render(format), b.render(format));
        sa.to_lowercase()
            .cmp(&sb.to_lowercase())
            .then_with(|| sa.cmp(&sb))
    }

    // ── Cascading ────────────────────────────────────────────────────

    /// Filters the possible values by the header `attribute`, which must
    /// match the value of `driver`. `None` removes the filter.
    ///
    /// Whenever the driver changes, a current value that no longer matches
    /// is dropped without changing the modification state.
    pub fn set_cascading_property(&self, attribute: &str, driver: Option<&Rc<Self>>) {
        let Some(binding) = &self.enum_binding else {
            return;
        };
        let key = cascade_key(self.uid, attribute);
        {
            let mut drivers = binding.drivers.borrow_mut();
            if let Some(pos) = drivers.iter().position(|(a, _)| a == attribute) {
                let (_, old) = drivers.remove(pos);
                if let Some(old) = old.upgrade() {
                    old.changed().disconnect(&key);
                }
            }
            if let Some(driver) = driver {
                drivers.push((attribute.to_string(), Rc::downgrade(driver)));
            }
        }
        if let Some(driver) = driver {
            let owner = self.this.clone();
            driver.changed().connect(
                key,
                Rc::new(move |change: &PropertyChange| {
                    if *change != PropertyChange::Value {
                        return;
                    }
                    if let Some(prop) = owner.upgrade() {
                        prop.on_driver_changed();
                    }
                }),
            );
        }
        self.update_value_list();
    }

    fn on_driver_changed(&self) {
        if !self.is_null() {
            let value = self.internal_value();
            let keep = |v: &Value| v.as_header().map_or(true, |h| self.filter_header(h));
            match value {
                Value::List(items) if self.is_multi_valued() => {
                    let kept: Vec<Value> = items.iter().filter(|v| keep(v)).cloned().collect();
                    if kept.len() != items.len() {
                        self.preserving_modified(|p| p.set_internal_value(Value::List(kept)));
                    }
                }
                other => {
                    if !keep(&other) {
                        self.preserving_modified(|p| p.set_internal_value(Value::Null));
                    }
                }
            }
        }
        self.update_value_list();
    }

    /// Whether `header` satisfies every cascading driver.
    pub fn matches_cascading(&self, header: &Header) -> bool {
        let Some(binding) = &self.enum_binding else {
            return true;
        };
        let drivers: Vec<(String, Weak<Self>)> = binding.drivers.borrow().clone();
        drivers.iter().all(|(attribute, driver)| {
            let Some(driver) = driver.upgrade() else {
                return true;
            };
            let selected = driver.transport_value();
            let raw = header.attribute(attribute).cloned().unwrap_or_default();
            let internal = driver.resolve_value(&raw, ValueFormat::Internal, None);
            let candidate = driver.resolve_value(&internal, ValueFormat::Transport, Some(ValueFormat::Internal));

            let driver_blank = driver.is_value_null(&selected);
            let candidate_blank = driver.is_value_null(&candidate);
            match self.def.cascade_null_mode {
                CascadeNullMode::MatchAll if driver_blank || candidate_blank => return true,
                CascadeNullMode::NullOnly if driver_blank => return candidate_blank,
                CascadeNullMode::NullOnly if candidate_blank => return true,
                _ => {}
            }

            let selected = items_of(selected);
            let candidate = items_of(candidate);
            selected
                .iter()
                .any(|s| candidate.iter().any(|c| loosely_equal(s, c)))
        })
    }
}
