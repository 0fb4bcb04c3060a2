//! Rows of data lists.
//!
//! A [`DataRow`] keeps one plain internal [`Value`] per column instead of a
//! full [`DataProperty`](crate::DataProperty), so large result grids stay
//! cheap. The list's column properties convert and compare the values.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use chrono::{NaiveDate, NaiveDateTime};
use formkit_core::{Value, ValueFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::object::DataObject;
use crate::sort::{ListSortField, SortDirection};

/// How users may select rows of a data list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Rows cannot be selected.
    #[default]
    None,
    /// Selecting a row deselects every other row.
    Single,
    /// Any number of rows can be selected.
    Multiple,
}

/// One row of a data list.
#[derive(Debug)]
pub struct DataRow {
    list: Weak<DataObject>,
    values: RefCell<BTreeMap<String, Value>>,
    selected: Cell<bool>,
}

impl DataRow {
    /// Creates an empty row of `list`.
    pub fn new(list: &Rc<DataObject>) -> Rc<Self> {
        Rc::new(Self {
            list: Rc::downgrade(list),
            values: RefCell::new(BTreeMap::new()),
            selected: Cell::new(false),
        })
    }

    /// The owning data list.
    pub fn list(&self) -> Option<Rc<DataObject>> {
        self.list.upgrade()
    }

    /// The internal value of a column, or null.
    pub fn value(&self, column: &str) -> Value {
        self.values.borrow().get(column).cloned().unwrap_or_default()
    }

    /// Converts `value` to the internal format of the column and stores
    /// it. Unknown columns are ignored.
    pub fn set_value(&self, column: &str, value: &Value, format: ValueFormat) {
        let Some(prop) = self.list().and_then(|l| l.data_property(column)) else {
            return;
        };
        let internal = prop.resolve_value(value, ValueFormat::Internal, Some(format));
        self.values.borrow_mut().insert(prop.name().to_string(), internal);
    }

    /// The value of a column converted to `format`.
    pub fn value_in(&self, column: &str, format: ValueFormat) -> Value {
        let value = self.value(column);
        self.list()
            .and_then(|l| l.data_property(column))
            .map_or(value.clone(), |p| p.resolve_value(&value, format, Some(ValueFormat::Internal)))
    }

    /// Whether the row is selected.
    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    pub(crate) fn set_selected(&self, selected: bool) {
        self.selected.set(selected);
    }

    /// Toggles the selection of this row if its list allows selection.
    pub fn toggle_selection(self: &Rc<Self>) {
        if let Some(list) = self.list() {
            if list.row_selection_mode() != SelectionMode::None {
                list.toggle_selection(self);
            }
        }
    }

    /// Imports a wire record. Fields without a matching column are ignored.
    pub fn from_json(&self, json: &Json) {
        let Json::Object(map) = json else {
            return;
        };
        for (key, value) in map {
            self.set_value(key, &Value::from_json(value), ValueFormat::Transport);
        }
    }

    /// Exports the populated columns in column order, restricted to the keys
    /// of `contract` if one is given.
    pub fn to_json(&self, contract: Option<&Json>) -> Json {
        let mut res = serde_json::Map::new();
        let Some(list) = self.list() else {
            return Json::Object(res);
        };
        let values = self.values.borrow();
        for prop in list.properties() {
            let Some(value) = values.get(prop.name()) else {
                continue;
            };
            if contract.is_some_and(|c| c.get(prop.name()).is_none()) {
                continue;
            }
            let transport = prop.resolve_value(value, ValueFormat::Transport, Some(ValueFormat::Internal));
            res.insert(prop.name().to_string(), transport.to_json());
        }
        Json::Object(res)
    }

    /// Compares this row with `other` by each sort field in turn.
    ///
    /// Rows of different lists compare equal. A null sorts before or after
    /// any value according to the field's `nulls_first`, regardless of the
    /// direction.
    pub fn compare_to(&self, other: &Self, criteria: &[ListSortField]) -> Ordering {
        let Some(list) = self.list() else {
            return Ordering::Equal;
        };
        if !Weak::ptr_eq(&self.list, &other.list) {
            return Ordering::Equal;
        }
        for field in criteria {
            let Some(prop) = list.data_property(&field.property) else {
                continue;
            };
            let a = self.value(prop.name());
            let b = other.value(prop.name());
            let ord = match (a.is_null(), b.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) if field.nulls_first => Ordering::Less,
                (true, false) => Ordering::Greater,
                (false, true) if field.nulls_first => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ord = sort_class(&a).cmp(&sort_class(&b)).then_with(|| {
                        compare_values(&a, &b).unwrap_or_else(|| {
                            let sa = prop.resolve_value(&a, ValueFormat::DisplayString, None);
                            let sb = prop.resolve_value(&b, ValueFormat::DisplayString, None);
                            compare_text(&sa.to_string(), &sb.to_string())
                        })
                    });
                    match field.direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    }
                }
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

/// Rank of a value's class. Values of different classes order by rank, so
/// a column holding numbers and unconverted text still sorts consistently.
const fn sort_class(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Int(_) | Value::Decimal(_) => 1,
        Value::Date(_) | Value::DateTime(_) | Value::Time(_) => 2,
        Value::Bool(_) => 3,
        Value::String(_) | Value::Header(_) | Value::List(_) => 4,
    }
}

/// Compares two values of the same class; `None` for text-like values,
/// which compare by their display text.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        _ if a.is_numeric() && b.is_numeric() => Some(a.as_f64()?.total_cmp(&b.as_f64()?)),
        _ if a.is_temporal() && b.is_temporal() => Some(instant(a)?.cmp(&instant(b)?)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn instant(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Date(d) => Some(d.and_time(chrono::NaiveTime::default())),
        Value::DateTime(dt) => Some(*dt),
        Value::Time(t) => Some(NaiveDate::default().and_time(*t)),
        _ => None,
    }
}

/// Case-insensitive text order, with the original case as a tiebreak.
fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}
