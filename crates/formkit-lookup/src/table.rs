//! Self-indexing lookup tables.
//!
//! A [`LookupTable`] holds the headers of one type as loaded. Headers can be
//! looked up by any string rendering of them: the first lookup by a given
//! format builds a hash index for that format, which is reused until the
//! indexes are reset.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use formkit_core::header::FIELD_ID;
use formkit_core::{ErrorList, FormkitResult, Header, Value};

/// Attribute prefix under which a header collects the other headers that
/// render to the same key in a given format.
pub const GROUP_ATTRIBUTE_PREFIX: &str = "_grp:";

/// Returns the name of the attribute holding the headers grouped under a
/// winner for the given format.
pub fn group_attribute(format: &str) -> String {
    format!("{GROUP_ATTRIBUTE_PREFIX}{format}")
}

/// An indexed set of headers of one type.
///
/// # Examples
///
/// ```
/// use formkit_core::Header;
/// use formkit_lookup::LookupTable;
///
/// let table = LookupTable::new(
///     "status",
///     vec![Header::new("", "A", "Active"), Header::new("", "I", "Inactive")],
///     false,
/// );
///
/// assert_eq!(table.lookup_by_id("a").map(|h| h.text), Some("Active".into()));
/// assert_eq!(table.lookup_by_format("[t]", "INACTIVE").map(|h| h.id), Some("I".into()));
/// ```
#[derive(Debug)]
pub struct LookupTable {
    table_type: String,
    case_sensitive: bool,
    data: RefCell<Vec<Header>>,
    indexes: RefCell<HashMap<String, HashMap<String, usize>>>,
    errors: ErrorList,
}

impl LookupTable {
    /// Creates a table of the given type. Every header is retyped to it.
    pub fn new(table_type: impl Into<String>, mut data: Vec<Header>, case_sensitive: bool) -> Self {
        let table_type = table_type.into();
        for h in &mut data {
            h.header_type.clone_from(&table_type);
        }
        Self {
            table_type,
            case_sensitive,
            data: RefCell::new(data),
            indexes: RefCell::new(HashMap::new()),
            errors: ErrorList::new(),
        }
    }

    /// Creates an empty table that carries the errors of a failed load.
    pub fn from_errors(table_type: impl Into<String>, errors: ErrorList) -> Self {
        let mut table = Self::new(table_type, Vec::new(), false);
        table.errors = errors;
        table
    }

    /// Parses a table from its wire form `{Type, caseSensitive, data: [...]}`.
    pub fn from_json(json: &serde_json::Value) -> FormkitResult<Self> {
        let wire: LookupTableWire = serde_json::from_value(json.clone())?;
        Ok(Self::new(wire.table_type, wire.data, wire.case_sensitive))
    }

    /// Returns the wire form of this table.
    pub fn to_json(&self) -> serde_json::Value {
        let wire = LookupTableWire {
            table_type: self.table_type.clone(),
            case_sensitive: self.case_sensitive,
            data: self.data.borrow().clone(),
        };
        serde_json::to_value(wire).unwrap_or(serde_json::Value::Null)
    }

    /// The type of the headers in this table.
    pub fn table_type(&self) -> &str {
        &self.table_type
    }

    /// Whether lookups match keys case-sensitively.
    pub const fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Errors that occurred while loading this table.
    pub const fn errors(&self) -> &ErrorList {
        &self.errors
    }

    /// Returns the number of headers.
    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    /// Returns `true` if the table holds no headers.
    pub fn is_empty(&self) -> bool {
        self.data.borrow().is_empty()
    }

    /// Returns copies of the headers accepted by `filter`, in table order.
    pub fn values(&self, filter: impl Fn(&Header) -> bool) -> Vec<Header> {
        self.data
            .borrow()
            .iter()
            .filter(|h| filter(h))
            .cloned()
            .collect()
    }

    /// Looks up a header by id.
    pub fn lookup_by_id(&self, id: &str) -> Option<Header> {
        self.lookup_by_format(FIELD_ID, id)
    }

    /// Looks up a header by its rendering in `format`.
    ///
    /// When several headers render to the same key, the first one in table
    /// order is returned and carries the others in its
    /// [`group_attribute`] for that format.
    pub fn lookup_by_format(&self, format: &str, value: &str) -> Option<Header> {
        if !self.indexes.borrow().contains_key(format) {
            self.build_index(format);
        }
        let key = self.index_key(value);
        let idx = *self.indexes.borrow().get(format)?.get(&key)?;
        self.data.borrow().get(idx).cloned()
    }

    /// Clears all indexes. They are rebuilt on the next lookup by each format.
    pub fn reset_indexes(&self) {
        self.indexes.borrow_mut().clear();
    }

    /// Clears the index for one format.
    pub fn clear_index(&self, format: &str) {
        self.indexes.borrow_mut().remove(format);
    }

    fn index_key(&self, value: &str) -> String {
        if self.case_sensitive {
            value.to_string()
        } else {
            value.to_uppercase()
        }
    }

    fn build_index(&self, format: &str) {
        let mut data = self.data.borrow_mut();
        let group = group_attribute(format);
        let mut index: HashMap<String, usize> = HashMap::with_capacity(data.len());
        for i in 0..data.len() {
            let key = self.index_key(&data[i].render(format));
            if let Some(&winner) = index.get(&key) {
                let duplicate = data[i].clone();
                data[winner].add_to_attribute(&group, Value::from(duplicate));
            } else {
                index.insert(key, i);
            }
        }
        tracing::trace!(table = %self.table_type, format, keys = index.len(), "built lookup index");
        self.indexes.borrow_mut().insert(format.to_string(), index);
    }
}

#[derive(Serialize, Deserialize)]
struct LookupTableWire {
    #[serde(rename = "Type", default)]
    table_type: String,
    #[serde(rename = "caseSensitive", default)]
    case_sensitive: bool,
    #[serde(default)]
    data: Vec<Header>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use formkit_core::header::FIELD_TEXT;

    fn sample() -> LookupTable {
        LookupTable::new(
            "color",
            vec![
                Header::new("x", "R", "Red"),
                Header::new("x", "G", "Green"),
                Header::new("x", "B", "Blue"),
            ],
            false,
        )
    }

    #[test]
    fn test_new_retypes_headers() {
        let table = sample();
        assert!(table.values(|_| true).iter().all(|h| h.header_type == "color"));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_lookup_case_insensitive() {
        let table = sample();
        assert_eq!(table.lookup_by_id("g").map(|h| h.text), Some("Green".to_string()));
        assert_eq!(table.lookup_by_format(FIELD_TEXT, "bLuE").map(|h| h.id), Some("B".to_string()));
        assert!(table.lookup_by_id("Z").is_none());
    }

    #[test]
    fn test_lookup_case_sensitive() {
        let table = LookupTable::new("code", vec![Header::new("", "a", "lower")], true);
        assert!(table.lookup_by_id("A").is_none());
        assert!(table.lookup_by_id("a").is_some());
    }

    #[test]
    fn test_values_filtered() {
        let table = sample();
        let ids: Vec<String> = table.values(|h| h.id != "G").into_iter().map(|h| h.id).collect();
        assert_eq!(ids, vec!["R", "B"]);
    }

    #[test]
    fn test_clear_index_rebuilds() {
        let table = sample();
        assert!(table.lookup_by_format(FIELD_TEXT, "red").is_some());
        table.clear_index(FIELD_TEXT);
        assert!(table.lookup_by_format(FIELD_TEXT, "red").is_some());
    }

    #[test]
    fn test_from_errors() {
        let table = LookupTable::from_errors("missing", ErrorList::from_error("not_found", "Missing."));
        assert!(table.is_empty());
        assert!(table.errors().has_errors());
        assert_eq!(table.table_type(), "missing");
    }

    #[test]
    fn test_wire_round_trip() {
        let json = serde_json::json!({
            "Type": "size",
            "caseSensitive": true,
            "data": [{ "Id": "S", "Text": "Small" }, { "Id": "L", "Text": "Large", "IsActive": false }]
        });
        let table = LookupTable::from_json(&json).unwrap();
        assert!(table.is_case_sensitive());
        assert_eq!(table.lookup_by_id("L").map(|h| h.is_active), Some(false));
        assert_eq!(table.lookup_by_id("S").map(|h| h.header_type), Some("size".to_string()));

        let out = table.to_json();
        assert_eq!(out["Type"], "size");
        assert_eq!(out["data"][1]["Id"], "L");
    }
}
