//! Dynamically-typed property values.
//!
//! The [`Value`] enum is the universal type stored in data properties and
//! passed through the value-conversion pipeline. A property holds its value
//! in the typed internal form whenever conversion succeeds, and keeps the raw
//! input otherwise so validators can report it. [`ValueFormat`] names the four
//! projections a value can be converted to.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::header::Header;

/// Wire pattern for date/time values.
pub const DATETIME_TRANSPORT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Wire pattern for time values.
pub const TIME_TRANSPORT_FORMAT: &str = "%H:%M:%S%.3f";

/// The formats a property value can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueFormat {
    /// The typed, canonical form stored in the property.
    Internal,
    /// The wire-safe form used when exchanging data with a service.
    Transport,
    /// The text form a user types in.
    EditString,
    /// The read-only text rendering.
    DisplayString,
}

impl ValueFormat {
    /// Returns `true` for [`EditString`](Self::EditString) and
    /// [`DisplayString`](Self::DisplayString).
    pub const fn is_string(self) -> bool {
        matches!(self, Self::EditString | Self::DisplayString)
    }

    /// Returns `true` for [`Internal`](Self::Internal) and
    /// [`Transport`](Self::Transport).
    pub const fn is_typed(self) -> bool {
        matches!(self, Self::Internal | Self::Transport)
    }
}

/// A property value.
///
/// # Examples
///
/// ```
/// use formkit_core::value::Value;
///
/// let v = Value::from(42_i64);
/// assert_eq!(v, Value::Int(42));
///
/// let v = Value::from("hello");
/// assert_eq!(v.to_string(), "hello");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// A boolean value.
    Bool(bool),
    /// A 64-bit signed integer.
    Int(i64),
    /// A 64-bit floating-point number.
    Decimal(f64),
    /// A UTF-8 string.
    String(String),
    /// A date without time.
    Date(NaiveDate),
    /// A date and time without timezone.
    DateTime(NaiveDateTime),
    /// A time of day.
    Time(NaiveTime),
    /// A reference value resolved from a lookup table.
    Header(Box<Header>),
    /// A list of values, used by multi-valued properties.
    List(Vec<Value>),
}

impl Value {
    /// Returns `true` if the value is [`Value::Null`].
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` for integers and decimals.
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Decimal(_))
    }

    /// Returns `true` for dates, date/times and times.
    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date(_) | Self::DateTime(_) | Self::Time(_))
    }

    /// Returns the string slice if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this is a [`Value::Bool`].
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is a [`Value::Int`].
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric value of an integer or decimal.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the header if this is a [`Value::Header`].
    pub fn as_header(&self) -> Option<&Header> {
        match self {
            Self::Header(h) => Some(h),
            _ => None,
        }
    }

    /// Returns the items if this is a [`Value::List`].
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a short name of the variant, used in diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Time(_) => "time",
            Self::Header(_) => "header",
            Self::List(_) => "list",
        }
    }

    /// Converts this value to JSON for the wire.
    ///
    /// Dates and times use the transport patterns; headers use their wire form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Decimal(d) => serde_json::Number::from_f64(*d)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Date(d) => serde_json::Value::String(
                d.and_time(NaiveTime::default())
                    .format(DATETIME_TRANSPORT_FORMAT)
                    .to_string(),
            ),
            Self::DateTime(dt) => {
                serde_json::Value::String(dt.format(DATETIME_TRANSPORT_FORMAT).to_string())
            }
            Self::Time(t) => serde_json::Value::String(t.format(TIME_TRANSPORT_FORMAT).to_string()),
            Self::Header(h) => h.to_json(),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }

    /// Builds a value from wire JSON.
    ///
    /// Integral numbers become [`Value::Int`], other numbers [`Value::Decimal`].
    /// Objects that carry an `Id` are read as headers; any other object is kept
    /// as its JSON text.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Decimal(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => Self::List(items.iter().map(Self::from_json).collect()),
            serde_json::Value::Object(map) => {
                if map.contains_key("Id") {
                    if let Ok(h) = Header::from_json(json) {
                        return Self::Header(Box::new(h));
                    }
                }
                Self::String(json.to_string())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Decimal(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            Self::Header(h) => write!(f, "{h}"),
            Self::List(vals) => {
                for (i, v) in vals.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                Ok(())
            }
        }
    }
}

// ── From implementations ───────────────────────────────────────────────

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<Header> for Value {
    fn from(v: Header) -> Self {
        Self::Header(Box::new(v))
    }
}

impl From<Vec<Self>> for Value {
    fn from(v: Vec<Self>) -> Self {
        Self::List(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
