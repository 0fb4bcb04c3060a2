//! Core error types for the formkit data-model layer.
//!
//! Two kinds of errors live here. [`ErrorList`] is a domain value: it collects
//! validation and load messages of varying [`ErrorSeverity`] and travels with
//! properties, objects, and lookup tables. [`FormkitError`] is the Rust error
//! returned from fallible operations, and several of its variants carry an
//! [`ErrorList`] so that callers can surface every accumulated message.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Ordered severity of an [`ErrorMessage`].
///
/// Only [`ErrorSeverity::Error`] and [`ErrorSeverity::Critical`] count as
/// errors for [`ErrorList::has_errors`]; warnings are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ErrorSeverity {
    /// An informational message.
    Info,
    /// A warning that does not block the operation.
    Warning,
    /// An error that prevents the operation from completing.
    #[default]
    Error,
    /// A critical error that may abort the operation immediately.
    Critical,
}

impl ErrorSeverity {
    /// Returns the ordinal used on the wire.
    pub const fn ordinal(self) -> u8 {
        match self {
            Self::Info => 0,
            Self::Warning => 1,
            Self::Error => 2,
            Self::Critical => 3,
        }
    }

    /// Returns the severity for a wire ordinal, if valid.
    pub const fn from_ordinal(ordinal: u64) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Info),
            1 => Some(Self::Warning),
            2 => Some(Self::Error),
            3 => Some(Self::Critical),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "info" => Some(Self::Info),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Critical => "Critical",
        };
        f.write_str(name)
    }
}

impl Serialize for ErrorSeverity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.ordinal())
    }
}

impl<'de> Deserialize<'de> for ErrorSeverity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeverityVisitor;

        impl Visitor<'_> for SeverityVisitor {
            type Value = ErrorSeverity;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a severity ordinal (0-3) or name")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                ErrorSeverity::from_ordinal(v)
                    .ok_or_else(|| E::custom(format!("invalid severity ordinal {v}")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u64::try_from(v)
                    .ok()
                    .and_then(ErrorSeverity::from_ordinal)
                    .ok_or_else(|| E::custom(format!("invalid severity ordinal {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                ErrorSeverity::from_name(v)
                    .ok_or_else(|| E::custom(format!("invalid severity name '{v}'")))
            }
        }

        deserializer.deserialize_any(SeverityVisitor)
    }
}

/// A single error message: a code identifying the failure, the user-facing
/// text, and its severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorMessage {
    /// A short code identifying the failure (e.g. "required").
    pub code: String,
    /// The full message text.
    pub message: String,
    /// The severity of the message.
    #[serde(default)]
    pub severity: ErrorSeverity,
}

impl ErrorMessage {
    /// Creates a new error message.
    pub fn new(code: impl Into<String>, message: impl Into<String>, severity: ErrorSeverity) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// An ordered list of error messages.
///
/// Lists are merged rather than overwritten when results are aggregated from
/// members to their parent, so no message is ever silently dropped.
///
/// # Examples
///
/// ```
/// use formkit_core::error::ErrorList;
///
/// let mut errors = ErrorList::new();
/// errors.add_warning("stale", "The data may be out of date.");
/// assert!(!errors.has_errors());
///
/// errors.add_error("required", "Name is required.");
/// assert!(errors.has_errors());
/// assert_eq!(errors.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorList {
    #[serde(rename = "Errors", default)]
    errors: Vec<ErrorMessage>,
}

impl ErrorList {
    /// Creates an empty error list.
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Creates an error list holding a single error-severity message.
    pub fn from_error(code: impl Into<String>, message: impl Into<String>) -> Self {
        let mut list = Self::new();
        list.add_error(code, message);
        list
    }

    /// Parses an error list from its wire form `{"Errors": [...]}`.
    pub fn from_json(json: &serde_json::Value) -> FormkitResult<Self> {
        Ok(serde_json::from_value(json.clone())?)
    }

    /// Returns the wire form of this list.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "Errors": self.errors.iter().map(|e| serde_json::json!({
            "Code": e.code,
            "Message": e.message,
            "Severity": e.severity.ordinal(),
        })).collect::<Vec<_>>() })
    }

    /// Appends a message with the given severity.
    pub fn push(&mut self, message: ErrorMessage) {
        self.errors.push(message);
    }

    /// Adds an error-severity message.
    pub fn add_error(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(ErrorMessage::new(code, message, ErrorSeverity::Error));
    }

    /// Adds a warning-severity message.
    pub fn add_warning(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(ErrorMessage::new(code, message, ErrorSeverity::Warning));
    }

    /// Adds an informational message.
    pub fn add_info(&mut self, code: impl Into<String>, message: impl Into<String>) {
        self.push(ErrorMessage::new(code, message, ErrorSeverity::Info));
    }

    /// Adds a critical message and, if `abort` is set, returns an
    /// [`FormkitError::Aborted`] carrying the list accumulated so far.
    pub fn critical_error(
        &mut self,
        code: impl Into<String>,
        message: impl Into<String>,
        abort: bool,
    ) -> FormkitResult<()> {
        let message = message.into();
        self.push(ErrorMessage::new(code, message.clone(), ErrorSeverity::Critical));
        if abort {
            return Err(self.abort(message));
        }
        Ok(())
    }

    /// Builds the error used to abort the current operation with `reason`.
    pub fn abort(&self, reason: impl Into<String>) -> FormkitError {
        FormkitError::Aborted {
            reason: reason.into(),
            errors: self.clone(),
        }
    }

    /// Returns `true` if the list has any error or critical messages.
    pub fn has_errors(&self) -> bool {
        self.errors
            .iter()
            .any(|e| e.severity > ErrorSeverity::Warning)
    }

    /// Aborts with the combined error text if the list has any errors.
    pub fn abort_if_has_errors(&self) -> FormkitResult<()> {
        if self.has_errors() {
            return Err(self.abort(self.errors_text()));
        }
        Ok(())
    }

    /// Appends every message from `other`.
    pub fn merge_with(&mut self, other: &Self) {
        self.errors.extend(other.errors.iter().cloned());
    }

    /// Returns all messages joined with a newline.
    pub fn errors_text(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Removes all messages.
    pub fn clear(&mut self) {
        self.errors.clear();
    }

    /// Returns the number of messages.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns `true` if there are no messages.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterates over the messages in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, ErrorMessage> {
        self.errors.iter()
    }

    /// Returns the messages as a slice.
    pub fn errors(&self) -> &[ErrorMessage] {
        &self.errors
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.errors_text())
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a ErrorMessage;
    type IntoIter = std::slice::Iter<'a, ErrorMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl FromIterator<ErrorMessage> for ErrorList {
    fn from_iter<I: IntoIterator<Item = ErrorMessage>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

/// The primary error type for formkit.
#[derive(Error, Debug)]
pub enum FormkitError {
    // ── Model errors ─────────────────────────────────────────────────

    /// The operation was aborted by a critical error or an error check.
    #[error("Operation aborted: {reason}")]
    Aborted {
        /// The reason given for the abort.
        reason: String,
        /// Every message accumulated before the abort.
        errors: ErrorList,
    },

    /// Validation failed; the operation was not attempted.
    #[error("Validation failed: {0}")]
    Validation(ErrorList),

    /// A data object operation failed in its handler.
    #[error("Operation failed: {0}")]
    Operation(String),

    // ── Lookup errors ────────────────────────────────────────────────

    /// A lookup table could not be loaded.
    #[error("Failed to load lookup table '{table_type}': {message}")]
    LookupLoad {
        /// The requested table type.
        table_type: String,
        /// A description of the failure.
        message: String,
    },

    // ── Serialization / configuration ────────────────────────────────

    /// A wire payload could not be parsed or produced.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The settings could not be loaded or applied.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormkitError {
    /// Returns the error list carried by this error, if any.
    pub const fn error_list(&self) -> Option<&ErrorList> {
        match self {
            Self::Aborted { errors, .. } | Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FormkitError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// A convenience type alias for results using [`FormkitError`].
pub type FormkitResult<T> = Result<T, FormkitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Info < ErrorSeverity::Warning);
        assert!(ErrorSeverity::Warning < ErrorSeverity::Error);
        assert!(ErrorSeverity::Error < ErrorSeverity::Critical);
    }

    #[test]
    fn test_has_errors_ignores_warnings() {
        let mut list = ErrorList::new();
        list.add_info("note", "Saved draft.");
        list.add_warning("stale", "Data may be stale.");
        assert!(!list.has_errors());
        list.add_error("required", "Name is required.");
        assert!(list.has_errors());
    }

    #[test]
    fn test_critical_error_aborts() {
        let mut list = ErrorList::new();
        list.add_error("first", "First problem.");
        let err = list
            .critical_error("fatal", "Cannot continue.", true)
            .unwrap_err();
        match err {
            FormkitError::Aborted { reason, errors } => {
                assert_eq!(reason, "Cannot continue.");
                assert_eq!(errors.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_critical_error_without_abort() {
        let mut list = ErrorList::new();
        assert!(list.critical_error("fatal", "Bad.", false).is_ok());
        assert!(list.has_errors());
    }

    #[test]
    fn test_abort_if_has_errors() {
        let mut list = ErrorList::new();
        assert!(list.abort_if_has_errors().is_ok());
        list.add_error("a", "One.");
        list.add_error("b", "Two.");
        let err = list.abort_if_has_errors().unwrap_err();
        assert_eq!(err.to_string(), "Operation aborted: One.\nTwo.");
        assert_eq!(err.error_list().map(ErrorList::len), Some(2));
    }

    #[test]
    fn test_merge_with_appends() {
        let mut a = ErrorList::from_error("a", "A.");
        let b = ErrorList::from_error("b", "B.");
        a.merge_with(&b);
        a.merge_with(&b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.errors_text(), "A.\nB.\nB.");
    }

    #[test]
    fn test_wire_round_trip() {
        let json = serde_json::json!({
            "Errors": [
                { "Code": "required", "Message": "Name is required.", "Severity": 2 },
                { "Code": "note", "Message": "FYI", "Severity": "Info" }
            ]
        });
        let list = ErrorList::from_json(&json).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.errors()[1].severity, ErrorSeverity::Info);
        let out = list.to_json();
        assert_eq!(out["Errors"][0]["Severity"], 2);
        assert_eq!(out["Errors"][1]["Severity"], 0);
    }

    #[test]
    fn test_invalid_severity_rejected() {
        let json = serde_json::json!({
            "Errors": [{ "Code": "x", "Message": "x", "Severity": 9 }]
        });
        assert!(matches!(
            ErrorList::from_json(&json),
            Err(FormkitError::Serialization(_))
        ));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: FormkitError = io.into();
        assert!(matches!(err, FormkitError::Io(_)));
    }
}
