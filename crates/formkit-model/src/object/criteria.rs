//! Criteria objects: search filters and their summary.

use std::fmt;
use std::rc::Rc;

use formkit_core::Value;
use serde::{Deserialize, Serialize};

use super::{DataObject, ObjectKind};
use crate::property::{DataProperty, PropertyKind};

/// One populated filter of a criteria object, as shown in an "applied
/// filters" summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCriteria {
    /// The label of the filtered field.
    pub label: String,
    /// The display text of the operator, if the field has one.
    pub operator: Option<String>,
    /// The display strings of the operand values.
    pub data: Vec<String>,
}

impl FieldCriteria {
    /// Creates a field criteria entry.
    pub fn new(label: impl Into<String>, operator: Option<String>, data: Vec<String>) -> Self {
        Self {
            label: label.into(),
            operator,
            data,
        }
    }
}

/// Renders as `Label: Operator value1 and value2`.
impl fmt::Display for FieldCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.label)?;
        if let Some(op) = &self.operator {
            write!(f, " {op}")?;
        }
        if !self.data.is_empty() {
            write!(f, " {}", self.data.join(" and "))?;
        }
        Ok(())
    }
}

fn is_operator(p: &DataProperty) -> bool {
    p.kind() == PropertyKind::Operator
}

impl DataObject {
    /// Whether this object is a criteria object.
    pub const fn is_criteria(&self) -> bool {
        matches!(self.kind, ObjectKind::Criteria)
    }

    /// Returns `true` if any filter value other than an operator is set.
    pub fn has_criteria(&self) -> bool {
        self.properties().filter(|p| !is_operator(p)).any(|p| !p.is_null())
    }

    /// The populated filters in declaration order.
    ///
    /// An operator and its operands form a single entry labeled after the
    /// operator; operands that are blank or hidden are left out of its data.
    /// Other properties form an entry of their own when they have a value.
    pub fn fields_criteria(&self) -> Vec<FieldCriteria> {
        let operands: Vec<Rc<DataProperty>> = self
            .properties()
            .filter(|p| is_operator(p))
            .flat_map(|op| [op.companion(), op.companion2()])
            .flatten()
            .collect();
        let is_operand = |p: &Rc<DataProperty>| operands.iter().any(|o| Rc::ptr_eq(o, p));

        let mut res = Vec::new();
        for p in self.properties().filter(|p| !is_operand(p)) {
            if p.is_null() {
                continue;
            }
            if is_operator(p) {
                let data = [p.companion(), p.companion2()]
                    .into_iter()
                    .flatten()
                    .filter(|dp| !dp.is_null() && dp.is_visible())
                    .map(|dp| dp.display_string())
                    .collect();
                res.push(FieldCriteria::new(p.label(), Some(p.display_string()), data));
            } else {
                res.push(FieldCriteria::new(p.label(), None, vec![p.display_string()]));
            }
        }
        res
    }

    /// Clears operators whose operands are all blank, keeping their
    /// modification state.
    pub(super) fn clear_blank_operators(&self) {
        for op in self.properties().filter(|p| is_operator(p)) {
            let blank = [op.companion(), op.companion2()]
                .into_iter()
                .flatten()
                .all(|dp| dp.is_null());
            if blank && !op.is_null() {
                op.preserving_modified(|p| p.set_internal_value(Value::Null));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let fc = FieldCriteria::new("Age", Some("Between".into()), vec!["1".into(), "5".into()]);
        assert_eq!(fc.to_string(), "Age: Between 1 and 5");
        let fc = FieldCriteria::new("Name", None, vec!["Ann".into()]);
        assert_eq!(fc.to_string(), "Name: Ann");
        let fc = FieldCriteria::new("Age", Some("Is Null".into()), vec![]);
        assert_eq!(fc.to_string(), "Age: Is Null");
    }
}
