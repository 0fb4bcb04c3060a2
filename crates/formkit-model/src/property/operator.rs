//! Operator properties of search criteria.
//!
//! An operator property holds a header from an operator table, e.g.
//! "equals" or "between", and is bound to one or two companion properties
//! that hold its operands. By default the companions of `AgeOperator` are
//! `Age` and `Age2`.
//!
//! Operator headers describe themselves through attributes:
//!
//! | Attribute | Meaning |
//! |---|---|
//! | [`ATTR_ADDL_PROPS`] | number of operands (0, 1 or 2) |
//! | [`ATTR_MULTI_VALUE`] | `1` for list operands only, `0` for single operands only |
//! | [`ATTR_TYPE`] | kinds the operator applies to |
//! | [`ATTR_EXCLUDE_TYPE`] | kinds the operator never applies to |
//! | [`ATTR_SORT_ORDER`] | position in the list of operators |
//! | [`ATTR_NULL_CHECK`] | `1` for "is null" style operators |

use std::cell::RefCell;
use std::cmp::Ordering;
use std::rc::Weak;

use formkit_core::{Header, Value};

use super::DataProperty;

/// Number of operand properties the operator uses.
pub const ATTR_ADDL_PROPS: &str = "addl props";
/// Required multiplicity of the first operand.
pub const ATTR_MULTI_VALUE: &str = "multival";
/// Operand kinds the operator applies to.
pub const ATTR_TYPE: &str = "type";
/// Operand kinds the operator does not apply to.
pub const ATTR_EXCLUDE_TYPE: &str = "exclude type";
/// Sort position among the operators.
pub const ATTR_SORT_ORDER: &str = "sort order";
/// Marks operators that test for blank values.
pub const ATTR_NULL_CHECK: &str = "null check";

#[derive(Default)]
pub(super) struct OperatorBinding {
    companions: RefCell<(Weak<DataProperty>, Weak<DataProperty>)>,
}

fn attribute_text(header: &Header, name: &str) -> Option<String> {
    header
        .attribute(name)
        .filter(|v| !v.is_null())
        .map(ToString::to_string)
}

fn attribute_names(header: &Header, name: &str) -> Vec<String> {
    match header.attribute(name) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::List(items)) => items.iter().map(ToString::to_string).collect(),
        Some(other) => vec![other.to_string()],
    }
}

#[allow(clippy::cast_possible_truncation)]
fn operand_count(header: &Header) -> i64 {
    match header.attribute(ATTR_ADDL_PROPS) {
        Some(Value::Int(n)) => *n,
        Some(Value::Decimal(d)) => *d as i64,
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

impl DataProperty {
    /// Whether the property offers "is null" style operators.
    pub const fn has_null_check(&self) -> bool {
        self.def.has_null_check
    }

    /// The names of the operand properties of an operator.
    pub fn companion_names(&self) -> (Option<String>, Option<String>) {
        if let (Some(first), second) = &self.def.companions {
            return (Some(first.clone()), second.clone());
        }
        match self.name.strip_suffix("Operator") {
            Some(base) if !base.is_empty() => (Some(base.to_string()), Some(format!("{base}2"))),
            _ => (None, None),
        }
    }

    /// The first operand property, once bound.
    pub fn companion(&self) -> Option<std::rc::Rc<Self>> {
        self.operator.as_ref()?.companions.borrow().0.upgrade()
    }

    /// The second operand property, once bound.
    pub fn companion2(&self) -> Option<std::rc::Rc<Self>> {
        self.operator.as_ref()?.companions.borrow().1.upgrade()
    }

    pub(super) fn initialize_operator(&self) {
        let Some(binding) = &self.operator else {
            return;
        };
        let Some(parent) = self.parent() else {
            return;
        };
        let (first, second) = self.companion_names();
        let first = first.and_then(|n| parent.data_property(&n));
        let second = second.and_then(|n| parent.data_property(&n));
        if first.is_none() {
            tracing::debug!(operator = %self.name, "operator has no operand property");
        }
        *binding.companions.borrow_mut() = (
            first.as_ref().map_or_else(Weak::new, std::rc::Rc::downgrade),
            second.as_ref().map_or_else(Weak::new, std::rc::Rc::downgrade),
        );
        self.update_companions();
    }

    /// Shows and requires as many operands as the selected operator needs.
    pub(super) fn update_companions(&self) {
        let Some(first) = self.companion() else {
            return;
        };
        let count = self
            .internal_value()
            .as_header()
            .filter(|h| h.is_valid)
            .map_or(0, operand_count);
        let visible = self.is_visible();

        first.set_visible(visible && count > 0);
        first.set_required(first.is_visible());
        if let Some(second) = self.companion2() {
            second.set_visible(visible && count > 1);
            second.set_required(second.is_visible());
        }
    }

    /// Whether an operator header applies to the bound operand.
    pub fn is_applicable(&self, header: &Header) -> bool {
        let operand = self.companion();

        if let Some(multi) = attribute_text(header, ATTR_MULTI_VALUE) {
            match &operand {
                None => return false,
                Some(p) if multi == "0" && p.is_multi_valued() => return false,
                Some(p) if multi == "1" && !p.is_multi_valued() => return false,
                Some(_) => {}
            }
        }

        if attribute_text(header, ATTR_NULL_CHECK).as_deref() == Some("1") && !self.has_null_check() {
            return false;
        }

        let types = attribute_names(header, ATTR_TYPE);
        let excluded = attribute_names(header, ATTR_EXCLUDE_TYPE);
        if types.is_empty() && excluded.is_empty() {
            return true;
        }
        let Some(operand) = operand else {
            return false;
        };
        let kind = operand.kind();
        if excluded.iter().any(|t| kind.is_a(t)) {
            return false;
        }
        types.is_empty() || types.iter().any(|t| kind.is_a(t))
    }

    pub(super) fn compare_sort_order(a: &Header, b: &Header) -> Ordering {
        let sa = attribute_text(a, ATTR_SORT_ORDER).unwrap_or_default();
        let sb = attribute_text(b, ATTR_SORT_ORDER).unwrap_or_default();
        // Numeric orders come before textual ones.
        match (sa.trim().parse::<f64>(), sb.trim().parse::<f64>()) {
            (Ok(x), Ok(y)) => x.total_cmp(&y),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => sa.cmp(&sb),
        }
    }
}
