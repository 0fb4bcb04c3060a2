//! Settings loading from configuration files.
//!
//! This module provides functions to load [`Settings`] from TOML files, JSON
//! files, and to apply environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `FORMKIT_NULL_STRING` | `null_string` |
//! | `FORMKIT_RESTRICTED_STRING` | `restricted_string` |
//! | `FORMKIT_DISPLAY_LIST_SEPARATOR` | `display_list_separator` |
//! | `FORMKIT_TRUE_STRINGS` | `true_strings` (comma-separated) |
//! | `FORMKIT_FALSE_STRINGS` | `false_strings` (comma-separated) |
//! | `FORMKIT_MONEY_FORMAT` | `money_format` |
//! | `FORMKIT_LOG_LEVEL` | `log_level` |
//! | `FORMKIT_DEBUG` | `debug` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use formkit_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file("config/formkit.toml").unwrap();
//! let settings = settings_loader::from_toml_file_with_env("config/formkit.toml").unwrap();
//! ```

use std::path::Path;

use crate::error::FormkitError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, FormkitError> {
    // Merge over the serialized defaults so partial files are accepted.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| FormkitError::Configuration(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, FormkitError> {
    let content = read_file(path.as_ref(), "TOML")?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, FormkitError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, FormkitError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| FormkitError::Configuration(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, FormkitError> {
    let content = read_file(path.as_ref(), "JSON")?;
    from_json_str(&content)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, FormkitError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `FORMKIT_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

/// Applies overrides read through `lookup`, keyed by environment variable name.
fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("FORMKIT_NULL_STRING") {
        settings.null_string = val;
    }

    if let Some(val) = lookup("FORMKIT_RESTRICTED_STRING") {
        settings.restricted_string = val;
    }

    if let Some(val) = lookup("FORMKIT_DISPLAY_LIST_SEPARATOR") {
        settings.display_list_separator = val;
    }

    if let Some(val) = lookup("FORMKIT_TRUE_STRINGS") {
        settings.true_strings = split_list(&val);
    }

    if let Some(val) = lookup("FORMKIT_FALSE_STRINGS") {
        settings.false_strings = split_list(&val);
    }

    if let Some(val) = lookup("FORMKIT_MONEY_FORMAT") {
        settings.money_format = val;
    }

    if let Some(val) = lookup("FORMKIT_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("FORMKIT_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_file(path: &Path, kind: &str) -> Result<String, FormkitError> {
    std::fs::read_to_string(path).map_err(|e| {
        FormkitError::Configuration(format!(
            "Failed to read {kind} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(value: serde_json::Value, kind: &str) -> Result<Settings, FormkitError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        FormkitError::Configuration(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        FormkitError::Configuration(format!("Failed to deserialize settings from {kind}: {e}"))
    })
}

fn split_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            null_string = "N/A"
            debug = false
            money_fraction_digits = 3
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.null_string, "N/A");
        assert!(!settings.debug);
        assert_eq!(settings.money_fraction_digits, 3);
        // Defaults preserved
        assert_eq!(settings.display_list_separator, ", ");
    }

    #[test]
    fn test_from_toml_str_lists() {
        let toml = r#"
            true_strings = ["oui", "si"]
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.true_strings, vec!["oui", "si"]);
        assert_eq!(settings.false_strings.len(), 4);
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.year_pivot, 50);
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("[[invalid toml content");
        assert!(matches!(result, Err(FormkitError::Configuration(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str("money_fraction_digits = \"two\"");
        assert!(result.is_err());
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{
            "restricted_string": "***",
            "log_level": "debug"
        }"#;

        let settings = from_json_str(json).unwrap();
        assert_eq!(settings.restricted_string, "***");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.time_edit_format, "%H:%M");
    }

    #[test]
    fn test_from_json_str_empty_object() {
        let settings = from_json_str("{}").unwrap();
        assert!(settings.debug);
    }

    #[test]
    fn test_from_file_missing() {
        let result = from_json_file("/nonexistent/formkit.json");
        assert!(matches!(result, Err(FormkitError::Configuration(_))));
    }

    // ── Overrides ───────────────────────────────────────────────────

    #[test]
    fn test_apply_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FORMKIT_NULL_STRING", "-"),
            ("FORMKIT_TRUE_STRINGS", "Ja, J"),
            ("FORMKIT_DEBUG", "0"),
            ("FORMKIT_LOG_LEVEL", "warn"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        apply_overrides(&mut settings, |k| vars.get(k).map(ToString::to_string));
        assert_eq!(settings.null_string, "-");
        assert_eq!(settings.true_strings, vec!["ja", "j"]);
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.money_format, "${0}");
    }

    // ── Helpers ─────────────────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({ "a": { "b": 1, "c": 2 }, "d": 3 });
        let over = serde_json::json!({ "a": { "c": 5 } });
        let merged = merge_json(base, over);
        assert_eq!(merged, serde_json::json!({ "a": { "b": 1, "c": 5 }, "d": 3 }));
    }
}
