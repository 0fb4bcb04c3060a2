//! Fixtures: headers, lookup tables and a standard operator list.

use formkit_core::logging::setup_logging;
use formkit_core::{Header, Settings, Value};
use formkit_lookup::LookupTable;
use formkit_model::property::{ATTR_ADDL_PROPS, ATTR_MULTI_VALUE, ATTR_NULL_CHECK, ATTR_SORT_ORDER, ATTR_TYPE};

/// The type of the table returned by [`operators_table`].
pub const OPERATORS: &str = "operators";

/// Creates a header with no attributes. The type is assigned by the table
/// the header is placed in.
pub fn header(id: &str, text: &str) -> Header {
    Header::new("", id, text)
}

/// Creates a header with the given attributes.
pub fn header_with(id: &str, text: &str, attributes: &[(&str, Value)]) -> Header {
    let mut h = header(id, text);
    for (name, value) in attributes {
        h.set_attribute(*name, value.clone());
    }
    h
}

/// Creates a case-insensitive table of `(id, text)` pairs.
pub fn table(table_type: &str, rows: &[(&str, &str)]) -> LookupTable {
    LookupTable::new(
        table_type,
        rows.iter().map(|(id, text)| header(id, text)).collect(),
        false,
    )
}

/// A table of search operators, listed out of their sort order:
///
/// | Id | Text | Operands | Restriction |
/// |---|---|---|---|
/// | `BW` | Between | 2 | |
/// | `EQ` | Equals | 1 | |
/// | `NULL` | Is Null | 0 | null check |
/// | `IN` | In | 1 | multi-valued operand |
/// | `LT` | Less Than | 1 | decimal operand |
pub fn operators_table() -> LookupTable {
    let op = |id: &str, text: &str, order: i64, operands: i64, extra: &[(&str, Value)]| {
        let mut attributes = vec![
            (ATTR_SORT_ORDER, Value::Int(order)),
            (ATTR_ADDL_PROPS, Value::Int(operands)),
        ];
        attributes.extend(extra.iter().cloned());
        header_with(id, text, &attributes)
    };
    LookupTable::new(
        OPERATORS,
        vec![
            op("BW", "Between", 2, 2, &[]),
            op("EQ", "Equals", 1, 1, &[]),
            op("NULL", "Is Null", 5, 0, &[(ATTR_NULL_CHECK, Value::from("1"))]),
            op("IN", "In", 3, 1, &[(ATTR_MULTI_VALUE, Value::from("1"))]),
            op("LT", "Less Than", 4, 1, &[(ATTR_TYPE, Value::from("decimal"))]),
        ],
        false,
    )
}

/// Installs a tracing subscriber for tests. The level comes from
/// `FORMKIT_TEST_LOG`, defaulting to `warn`. Later calls do nothing.
pub fn init_test_logging() {
    let settings = Settings {
        log_level: std::env::var("FORMKIT_TEST_LOG").unwrap_or_else(|_| "warn".to_string()),
        debug: false,
        ..Settings::default()
    };
    setup_logging(&settings);
}
