//! Framework settings.
//!
//! This module provides [`Settings`], the framework-wide defaults used by the
//! value-conversion pipeline (null placeholders, list separators, boolean
//! tokens, date/time and money formats), and [`LazySettings`], a
//! globally-accessible settings instance that falls back to the defaults
//! until it is configured.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{FormkitError, FormkitResult};

/// Conversion defaults and runtime options.
///
/// Every data property copies the relevant defaults when it is created, and
/// may then override them individually.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    /// Text shown for a null value; input equal to it is treated as null.
    pub null_string: String,
    /// Text shown for a value the user has no access to.
    pub restricted_string: String,
    /// Regex used to split a string into the items of a multi-valued property.
    pub list_separators: String,
    /// Delimiter used to join the items of a multi-valued property.
    pub display_list_separator: String,
    /// Tokens parsed as `true` by boolean properties (case-insensitive).
    pub true_strings: Vec<String>,
    /// Tokens parsed as `false` by boolean properties (case-insensitive).
    pub false_strings: Vec<String>,
    /// `strftime` pattern used to edit date/time values.
    pub datetime_edit_format: String,
    /// `strftime` pattern used to edit date values.
    pub date_edit_format: String,
    /// `strftime` pattern used to edit time values.
    pub time_edit_format: String,
    /// `strftime` pattern used to display date/time values.
    pub datetime_display_format: String,
    /// `strftime` pattern used to display date values.
    pub date_display_format: String,
    /// `strftime` pattern used to display time values.
    pub time_display_format: String,
    /// Template applied to formatted money amounts; `{0}` is the amount.
    pub money_format: String,
    /// Fraction digits shown for money amounts.
    pub money_fraction_digits: usize,
    /// Two-digit years below this pivot land in the current century, the
    /// rest in the previous one.
    pub year_pivot: i32,
    /// Resource path template for remote lookup tables; `{0}` is the type.
    pub lookup_uri_template: String,
    /// The tracing filter directive (e.g. "info", "formkit_lookup=debug").
    pub log_level: String,
    /// Debug mode switches logging to a human-readable format.
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            null_string: String::new(),
            restricted_string: String::new(),
            list_separators: r";|,|\r?\n".to_string(),
            display_list_separator: ", ".to_string(),
            true_strings: ["true", "1", "yes", "y"].map(String::from).to_vec(),
            false_strings: ["false", "0", "no", "n"].map(String::from).to_vec(),
            datetime_edit_format: "%Y-%m-%d %H:%M".to_string(),
            date_edit_format: "%Y-%m-%d".to_string(),
            time_edit_format: "%H:%M".to_string(),
            datetime_display_format: "%-m/%-d/%Y %H:%M".to_string(),
            date_display_format: "%-m/%-d/%Y".to_string(),
            time_display_format: "%H:%M".to_string(),
            money_format: "${0}".to_string(),
            money_fraction_digits: 2,
            year_pivot: 50,
            lookup_uri_template: "lookup-table/{0}".to_string(),
            log_level: "info".to_string(),
            debug: true,
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup. Until then,
/// [`get`](LazySettings::get) returns the defaults, which become fixed on the
/// first read.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the settings. Fails if the settings were already configured
    /// or already read.
    pub fn configure(&self, settings: Settings) -> FormkitResult<()> {
        self.inner.set(settings).map_err(|_| {
            FormkitError::Configuration("Settings have already been configured".to_string())
        })
    }

    /// Returns the configured settings, or the defaults.
    pub fn get(&self) -> &Settings {
        self.inner.get_or_init(Settings::default)
    }

    /// Returns `true` if settings have been configured or read.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.null_string, "");
        assert_eq!(s.display_list_separator, ", ");
        assert_eq!(s.true_strings, vec!["true", "1", "yes", "y"]);
        assert_eq!(s.false_strings, vec!["false", "0", "no", "n"]);
        assert_eq!(s.datetime_edit_format, "%Y-%m-%d %H:%M");
        assert_eq!(s.money_format, "${0}");
        assert_eq!(s.money_fraction_digits, 2);
        assert_eq!(s.year_pivot, 50);
        assert_eq!(s.log_level, "info");
    }

    #[test]
    fn test_default_separators_parse() {
        let s = Settings::default();
        let re = regex::Regex::new(&s.list_separators).unwrap();
        let parts: Vec<&str> = re.split("a,b;c\nd\r\ne").collect();
        assert_eq!(parts, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_lazy_settings_configure_and_get() {
        let lazy = LazySettings::new();
        assert!(!lazy.is_configured());

        let settings = Settings {
            null_string: "N/A".to_string(),
            ..Settings::default()
        };
        lazy.configure(settings).unwrap();
        assert!(lazy.is_configured());
        assert_eq!(lazy.get().null_string, "N/A");
    }

    #[test]
    fn test_lazy_settings_configure_twice_fails() {
        let lazy = LazySettings::new();
        lazy.configure(Settings::default()).unwrap();
        assert!(matches!(
            lazy.configure(Settings::default()),
            Err(FormkitError::Configuration(_))
        ));
    }

    #[test]
    fn test_lazy_settings_defaults_on_read() {
        let lazy = LazySettings::new();
        assert_eq!(lazy.get().time_edit_format, "%H:%M");
        assert!(lazy.is_configured());
        assert!(lazy.configure(Settings::default()).is_err());
    }
}
