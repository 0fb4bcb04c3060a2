//! Typed reference values.
//!
//! A [`Header`] identifies one record of a given type by a string id and a
//! display text, and carries any number of named attributes. Enumerated
//! properties store headers as their internal values, and lookup tables are
//! sets of headers.
//!
//! ## Display templates
//!
//! [`Header::render`] formats a header with a small template language:
//!
//! | Token | Meaning |
//! |---|---|
//! | `[i]` | the id |
//! | `[t]` | the text |
//! | `[a:name]` | the named attribute, list values joined by `", "` |
//! | `[[` / `]]` | a literal `[` / `]` |

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::FormkitResult;
use crate::value::Value;

/// Template token for the header id.
pub const FIELD_ID: &str = "[i]";

/// Template token for the header text.
pub const FIELD_TEXT: &str = "[t]";

/// Returns the template token for the named attribute.
pub fn attr_field(name: &str) -> String {
    format!("[a:{name}]")
}

fn template_regex() -> &'static Regex {
    static TEMPLATE: OnceLock<Regex> = OnceLock::new();
    TEMPLATE.get_or_init(|| Regex::new(r"\[\[|\]\]|\[(i|t|a:)(.*?)\]").unwrap())
}

/// A typed, identified, labeled reference value.
///
/// # Examples
///
/// ```
/// use formkit_core::header::{Header, FIELD_TEXT};
/// use formkit_core::value::Value;
///
/// let mut h = Header::new("country", "US", "United States");
/// h.set_attribute("code", Value::from("USA"));
///
/// assert_eq!(h.render(FIELD_TEXT), "United States");
/// assert_eq!(h.render("[i] - [a:code] [[x]]"), "US - USA [x]");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "HeaderWire", into = "HeaderWire")]
pub struct Header {
    /// The type of record this header represents.
    pub header_type: String,
    /// The id, unique among headers of the same type.
    pub id: String,
    /// The user-facing text.
    pub text: String,
    /// `false` if the header was built from input that did not resolve to a
    /// known record.
    pub is_valid: bool,
    /// Whether the header can currently be selected.
    pub is_active: bool,
    /// The template used by [`Display`](fmt::Display).
    pub default_format: String,
    attributes: BTreeMap<String, Value>,
}

impl Header {
    /// Creates a valid, active header.
    pub fn new(header_type: impl Into<String>, id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            header_type: header_type.into(),
            id: id.into(),
            text: text.into(),
            is_valid: true,
            is_active: true,
            default_format: FIELD_ID.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    /// Creates an invalid header for an id that could not be resolved.
    pub fn invalid(header_type: impl Into<String>, id: impl Into<String>) -> Self {
        let mut h = Self::new(header_type, id, String::new());
        h.is_valid = false;
        h
    }

    /// Parses a header from its wire form.
    pub fn from_json(json: &serde_json::Value) -> FormkitResult<Self> {
        Ok(serde_json::from_value(json.clone())?)
    }

    /// Returns the wire form of this header.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Returns the value of the named attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Sets the named attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Removes the named attribute.
    pub fn remove_attribute(&mut self, name: &str) -> Option<Value> {
        self.attributes.remove(name)
    }

    /// Iterates over the attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Adds a value to the named attribute.
    ///
    /// An unset attribute takes the value as is. Otherwise the attribute is
    /// turned into a list, and the value is appended unless already present.
    pub fn add_to_attribute(&mut self, name: &str, value: Value) {
        if value.is_null() {
            return;
        }
        let Some(current) = self.attributes.get_mut(name) else {
            self.attributes.insert(name.to_string(), value);
            return;
        };
        if *current == value {
            return;
        }
        match current {
            Value::List(items) => {
                if !items.contains(&value) {
                    items.push(value);
                }
            }
            other => {
                let first = std::mem::take(other);
                *other = Value::List(vec![first, value]);
            }
        }
    }

    /// Renders the header with the given template.
    pub fn render(&self, format: &str) -> String {
        if format == FIELD_ID || !self.is_valid {
            return self.id.clone();
        }
        if format == FIELD_TEXT {
            return self.text.clone();
        }
        template_regex()
            .replace_all(format, |caps: &Captures<'_>| {
                let token = &caps[0];
                match token {
                    "[[" => return "[".to_string(),
                    "]]" => return "]".to_string(),
                    _ => {}
                }
                let kind = caps.get(1).map_or("", |m| m.as_str());
                let arg = caps.get(2).map_or("", |m| m.as_str());
                match (kind, arg.is_empty()) {
                    ("i", true) => self.id.clone(),
                    ("t", true) => self.text.clone(),
                    ("a:", false) => self
                        .attribute(arg)
                        .map(ToString::to_string)
                        .unwrap_or_default(),
                    _ => token.to_string(),
                }
            })
            .into_owned()
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&self.default_format))
    }
}

// ── Wire form ──────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HeaderWire {
    #[serde(rename = "Type", default)]
    header_type: String,
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    default_format: Option<String>,
    #[serde(default = "default_active")]
    is_active: bool,
    #[serde(rename = "attributes", default, skip_serializing_if = "Option::is_none")]
    attributes: Option<AttributesWire>,
}

const fn default_active() -> bool {
    true
}

/// Attributes arrive either as a list of key/value pairs or as a plain map.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum AttributesWire {
    Pairs(Vec<AttributePair>),
    Map(serde_json::Map<String, serde_json::Value>),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributePair {
    key: String,
    value: serde_json::Value,
}

impl From<HeaderWire> for Header {
    fn from(wire: HeaderWire) -> Self {
        let id = match wire.id {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        let mut h = Self::new(wire.header_type, id, wire.text.unwrap_or_default());
        h.is_active = wire.is_active;
        if let Some(format) = wire.default_format.filter(|f| !f.is_empty()) {
            h.default_format = format;
        }
        match wire.attributes {
            Some(AttributesWire::Pairs(pairs)) => {
                for pair in pairs {
                    h.set_attribute(pair.key, Value::from_json(&pair.value));
                }
            }
            Some(AttributesWire::Map(map)) => {
                for (key, value) in &map {
                    h.set_attribute(key.clone(), Value::from_json(value));
                }
            }
            None => {}
        }
        h
    }
}

impl From<Header> for HeaderWire {
    fn from(h: Header) -> Self {
        let attributes = if h.attributes.is_empty() {
            None
        } else {
            Some(AttributesWire::Map(
                h.attributes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ))
        };
        Self {
            header_type: h.header_type,
            id: serde_json::Value::String(h.id),
            text: Some(h.text),
            default_format: Some(h.default_format),
            is_active: h.is_active,
            attributes,
        }
    }
}
