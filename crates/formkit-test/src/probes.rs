//! Probes that observe how the model drives its collaborators.

use std::cell::Cell;
use std::rc::Rc;

use formkit_core::{ErrorList, Value};
use formkit_model::{DataProperty, PropertyValidator};

/// A validator that counts its calls and reports nothing.
///
/// # Examples
///
/// ```
/// use formkit_model::{DataProperty, PropertyDef};
/// use formkit_test::CountingValidator;
///
/// let probe = CountingValidator::new();
/// let p = DataProperty::new("Name", PropertyDef::text().validator(probe.clone()));
/// p.validate(false);
/// p.validate(false);
/// assert_eq!(probe.calls(), 1);
/// ```
#[derive(Debug, Default)]
pub struct CountingValidator {
    calls: Cell<usize>,
}

impl CountingValidator {
    /// Creates a probe with no calls recorded.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// The number of values validated so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Forgets the recorded calls.
    pub fn reset(&self) {
        self.calls.set(0);
    }
}

impl PropertyValidator for CountingValidator {
    fn validate(&self, _property: &DataProperty, _value: &Value, _errors: &mut ErrorList) {
        self.calls.set(self.calls.get() + 1);
    }

    fn name(&self) -> &str {
        "counting"
    }
}
