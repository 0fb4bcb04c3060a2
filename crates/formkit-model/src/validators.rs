//! Property validators.
//!
//! Validators are attached to a [`DataProperty`] and run by
//! [`DataProperty::validate`] against every element of the internal value, in
//! declaration order. Each validator appends error-severity messages to the
//! list it is given and never stops the validators after it.
//!
//! Every property starts with [`RequiredValidator`]; the property kind adds
//! its own defaults (see [`default_validators`]), and further validators are
//! appended through [`PropertyDef::validator`](crate::PropertyDef::validator)
//! or [`DataProperty::add_validator`].

use std::fmt;
use std::rc::Rc;

use chrono::Local;
use formkit_core::utils::text::format_message;
use formkit_core::{ErrorList, Value, ValueFormat};

use crate::property::{DataProperty, PropertyKind};

/// A trait for validating property values.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use formkit_core::{ErrorList, Value};
/// use formkit_model::{DataProperty, PropertyDef, PropertyValidator, FnValidator};
///
/// let no_spaces = FnValidator::new("no_spaces", |p: &DataProperty, v: &Value, errors: &mut ErrorList| {
///     if v.to_string().contains(' ') {
///         errors.add_error("no_spaces", format!("{p} cannot contain spaces."));
///     }
/// });
/// let code = DataProperty::new("Code", PropertyDef::text().validator(Rc::new(no_spaces)));
/// code.set_internal_value(Value::from("A B"));
/// assert!(!code.is_valid(true));
/// ```
pub trait PropertyValidator: fmt::Debug {
    /// Checks one element of the property's internal value.
    fn validate(&self, property: &DataProperty, value: &Value, errors: &mut ErrorList);

    /// Returns a human-readable name for this validator.
    fn name(&self) -> &str;
}

/// Returns the validators a property of the given kind starts with.
pub fn default_validators(kind: PropertyKind) -> Vec<Rc<dyn PropertyValidator>> {
    let mut validators: Vec<Rc<dyn PropertyValidator>> = vec![Rc::new(RequiredValidator)];
    if kind.is_numeric() {
        validators.push(Rc::new(NumberValidator));
        validators.push(Rc::new(MinimumValidator));
        validators.push(Rc::new(MaximumValidator));
    } else if kind.is_text() {
        validators.push(Rc::new(SizeValidator));
    } else if kind.is_temporal() {
        validators.push(Rc::new(DateTimeValidator));
    }
    validators
}

fn format_bound(bound: f64) -> String {
    format!("{bound}")
}

/// Reports a blank value on a required property.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

impl PropertyValidator for RequiredValidator {
    fn validate(&self, property: &DataProperty, value: &Value, errors: &mut ErrorList) {
        if property.is_required() && property.is_value_null(value) {
            errors.add_error("required", format_message("{0} is required.", &[property.to_string()]));
        }
    }

    fn name(&self) -> &str {
        "RequiredValidator"
    }
}

/// Reports a value of a numeric property that did not convert to a number.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberValidator;

impl PropertyValidator for NumberValidator {
    fn validate(&self, property: &DataProperty, value: &Value, errors: &mut ErrorList) {
        if !property.is_value_null(value) && !value.is_numeric() {
            errors.add_error(
                "invalid_number",
                format_message("{0} must be a number.", &[property.to_string()]),
            );
        }
    }

    fn name(&self) -> &str {
        "NumberValidator"
    }
}

/// Reports a number below the property minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumValidator;

impl PropertyValidator for MinimumValidator {
    fn validate(&self, property: &DataProperty, value: &Value, errors: &mut ErrorList) {
        let (Some(min), Some(n)) = (property.minimum(), value.as_f64()) else {
            return;
        };
        if n < min {
            errors.add_error(
                "min_value",
                format_message(
                    "{0} cannot be less than {1}.",
                    &[property.to_string(), format_bound(min)],
                ),
            );
        }
    }

    fn name(&self) -> &str {
        "MinimumValidator"
    }
}

/// Reports a number above the property maximum.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximumValidator;

impl PropertyValidator for MaximumValidator {
    fn validate(&self, property: &DataProperty, value: &Value, errors: &mut ErrorList) {
        let (Some(max), Some(n)) = (property.maximum(), value.as_f64()) else {
            return;
        };
        if n > max {
            errors.add_error(
                "max_value",
                format_message(
                    "{0} cannot be greater than {1}.",
                    &[property.to_string(), format_bound(max)],
                ),
            );
        }
    }

    fn name(&self) -> &str {
        "MaximumValidator"
    }
}

/// Reports text longer than the property size.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeValidator;

impl PropertyValidator for SizeValidator {
    fn validate(&self, property: &DataProperty, value: &Value, errors: &mut ErrorList) {
        let Some(size) = property.size().filter(|s| *s > 0) else {
            return;
        };
        if property.is_value_null(value) {
            return;
        }
        let text = value.to_string();
        if text.chars().count() > size {
            errors.add_error(
                "max_length",
                format_message(
                    "{0} cannot be longer than {1} characters. Invalid value: {2}.",
                    &[property.to_string(), size.to_string(), text],
                ),
            );
        }
    }

    fn name(&self) -> &str {
        "SizeValidator"
    }
}

/// Reports a value of a date or time property that did not parse.
///
/// The message shows the current date and time in the property's edit
/// format as an example of valid input.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeValidator;

impl PropertyValidator for DateTimeValidator {
    fn validate(&self, property: &DataProperty, value: &Value, errors: &mut ErrorList) {
        if property.is_value_null(value) || value.is_temporal() {
            return;
        }
        let now = Value::DateTime(Local::now().naive_local());
        let example = property.convert_value(&now, ValueFormat::EditString, None);
        errors.add_error(
            "invalid_datetime",
            format_message(
                "{0} has an invalid {1}: {2}. Please use the correct format, e.g. {3}.",
                &[
                    property.to_string(),
                    property.kind().value_type().to_string(),
                    value.to_string(),
                    example.to_string(),
                ],
            ),
        );
    }

    fn name(&self) -> &str {
        "DateTimeValidator"
    }
}

/// A validator backed by a closure.
pub struct FnValidator {
    name: String,
    check: Box<dyn Fn(&DataProperty, &Value, &mut ErrorList)>,
}

impl FnValidator {
    /// Wraps `check` as a named validator.
    pub fn new(
        name: impl Into<String>,
        check: impl Fn(&DataProperty, &Value, &mut ErrorList) + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            check: Box::new(check),
        }
    }
}

impl fmt::Debug for FnValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator").field("name", &self.name).finish()
    }
}

impl PropertyValidator for FnValidator {
    fn validate(&self, property: &DataProperty, value: &Value, errors: &mut ErrorList) {
        (self.check)(property, value, errors);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PropertyDef;

    fn run(prop: &DataProperty, value: &Value, validator: &dyn PropertyValidator) -> ErrorList {
        let mut errors = ErrorList::new();
        validator.validate(prop, value, &mut errors);
        errors
    }

    #[test]
    fn test_required_message_uses_words_of_name() {
        let p = DataProperty::new("FirstName", PropertyDef::text().required(true));
        let errors = run(&p, &Value::Null, &RequiredValidator);
        assert_eq!(errors.errors_text(), "First Name is required.");
    }

    #[test]
    fn test_required_skips_optional() {
        let p = DataProperty::new("Name", PropertyDef::text());
        assert!(run(&p, &Value::Null, &RequiredValidator).is_empty());
    }

    #[test]
    fn test_minimum_zero_is_enforced() {
        let p = DataProperty::new("Qty", PropertyDef::positive_integer());
        let errors = run(&p, &Value::Int(-1), &MinimumValidator);
        assert_eq!(errors.errors_text(), "Qty cannot be less than 0.");
        assert!(run(&p, &Value::Int(0), &MinimumValidator).is_empty());
    }

    #[test]
    fn test_maximum_fraction() {
        let p = DataProperty::new("Rate", PropertyDef::percent_fraction());
        let errors = run(&p, &Value::Decimal(1.5), &MaximumValidator);
        assert_eq!(errors.errors_text(), "Rate cannot be greater than 1.");
    }

    #[test]
    fn test_number_validator_flags_raw_text() {
        let p = DataProperty::new("Amount", PropertyDef::decimal().label("Total amount"));
        let errors = run(&p, &Value::from("abc"), &NumberValidator);
        assert_eq!(errors.errors_text(), "Total amount must be a number.");
        assert!(run(&p, &Value::Decimal(2.0), &NumberValidator).is_empty());
    }

    #[test]
    fn test_size_counts_characters() {
        let p = DataProperty::new("Code", PropertyDef::text().size(3));
        assert!(run(&p, &Value::from("äöü"), &SizeValidator).is_empty());
        let errors = run(&p, &Value::from("abcd"), &SizeValidator);
        assert_eq!(
            errors.errors_text(),
            "Code cannot be longer than 3 characters. Invalid value: abcd."
        );
    }

    #[test]
    fn test_datetime_validator_message() {
        let p = DataProperty::new("DueDate", PropertyDef::date());
        let errors = run(&p, &Value::from("someday"), &DateTimeValidator);
        let text = errors.errors_text();
        assert!(text.starts_with("Due Date has an invalid date: someday."), "{text}");
        assert_eq!(errors.iter().next().map(|e| e.code.as_str()), Some("invalid_datetime"));
    }

    #[test]
    fn test_default_validators_per_kind() {
        let names = |k| {
            default_validators(k)
                .iter()
                .map(|v| v.name().to_string())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            names(PropertyKind::Money),
            ["RequiredValidator", "NumberValidator", "MinimumValidator", "MaximumValidator"]
        );
        assert_eq!(names(PropertyKind::Guid), ["RequiredValidator", "SizeValidator"]);
        assert_eq!(names(PropertyKind::Time), ["RequiredValidator", "DateTimeValidator"]);
        assert_eq!(names(PropertyKind::Enum), ["RequiredValidator"]);
    }
}
