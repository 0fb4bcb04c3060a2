//! Property kinds and their per-kind options.

use std::fmt;
use std::rc::Rc;

use formkit_lookup::{LocalCacheLoader, LookupCache};

use crate::state::AccessLevel;
use crate::validators::PropertyValidator;

/// The kind of a data property, which selects its conversion rules and
/// default validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Free text.
    Text,
    /// A GUID, stored as text in canonical hyphenated form when it parses.
    Guid,
    /// A boolean.
    Boolean,
    /// An integer.
    Integer,
    /// A non-negative integer.
    PositiveInteger,
    /// A decimal number.
    Decimal,
    /// A non-negative decimal number.
    PositiveDecimal,
    /// A money amount.
    Money,
    /// A non-negative money amount.
    PositiveMoney,
    /// A percentage stored as a fraction (0.25 displays as "25%").
    Percent,
    /// A percentage limited to the range 0..=1.
    PercentFraction,
    /// A date and time.
    DateTime,
    /// A date without time.
    Date,
    /// A time of day.
    Time,
    /// A header from a lookup table.
    Enum,
    /// A header whose transport value is its id as an integer.
    EnumInt,
    /// A header whose transport value is its id as a boolean.
    EnumBool,
    /// A search operator bound to one or two companion properties.
    Operator,
}

impl PropertyKind {
    /// Returns the type tags of this kind, most specific first.
    ///
    /// Operator applicability matches a companion's kind against these tags.
    pub const fn type_names(self) -> &'static [&'static str] {
        match self {
            Self::Text => &["text", "data"],
            Self::Guid => &["guid", "text", "data"],
            Self::Boolean => &["boolean", "data"],
            Self::Integer => &["integer", "decimal", "data"],
            Self::PositiveInteger => &["positive_integer", "integer", "decimal", "data"],
            Self::Decimal => &["decimal", "data"],
            Self::PositiveDecimal => &["positive_decimal", "decimal", "data"],
            Self::Money => &["money", "decimal", "data"],
            Self::PositiveMoney => &["positive_money", "money", "decimal", "data"],
            Self::Percent => &["percent", "decimal", "data"],
            Self::PercentFraction => &["percent_fraction", "percent", "decimal", "data"],
            Self::DateTime => &["datetime", "data"],
            Self::Date => &["date", "datetime", "data"],
            Self::Time => &["time", "datetime", "data"],
            Self::Enum => &["enum", "data"],
            Self::EnumInt => &["enum_int", "enum", "data"],
            Self::EnumBool => &["enum_bool", "enum", "data"],
            Self::Operator => &["operator", "enum", "data"],
        }
    }

    /// Returns `true` if this kind or one of its base kinds has the given
    /// type tag.
    ///
    /// Tags are compared ignoring case, separators, a namespace prefix and a
    /// trailing `Property`, so `"PositiveIntegerProperty"` matches
    /// `positive_integer`.
    pub fn is_a(self, type_name: &str) -> bool {
        let wanted = normalize_type_name(type_name);
        self.type_names()
            .iter()
            .any(|t| normalize_type_name(t) == wanted)
    }

    /// Returns `true` for the numeric kinds.
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Integer
                | Self::PositiveInteger
                | Self::Decimal
                | Self::PositiveDecimal
                | Self::Money
                | Self::PositiveMoney
                | Self::Percent
                | Self::PercentFraction
        )
    }

    /// Returns `true` for the integer kinds.
    pub const fn is_integral(self) -> bool {
        matches!(self, Self::Integer | Self::PositiveInteger)
    }

    /// Returns `true` for the date and time kinds.
    pub const fn is_temporal(self) -> bool {
        matches!(self, Self::DateTime | Self::Date | Self::Time)
    }

    /// Returns `true` for the kinds whose values are lookup-table headers.
    pub const fn is_enum(self) -> bool {
        matches!(self, Self::Enum | Self::EnumInt | Self::EnumBool | Self::Operator)
    }

    /// Returns `true` for the text kinds.
    pub const fn is_text(self) -> bool {
        matches!(self, Self::Text | Self::Guid)
    }

    /// The minimum a value of this kind starts out with.
    pub const fn default_minimum(self) -> Option<f64> {
        match self {
            Self::PositiveInteger | Self::PositiveDecimal | Self::PositiveMoney | Self::PercentFraction => {
                Some(0.0)
            }
            _ => None,
        }
    }

    /// The maximum a value of this kind starts out with.
    pub const fn default_maximum(self) -> Option<f64> {
        match self {
            Self::PercentFraction => Some(1.0),
            _ => None,
        }
    }

    /// The name of the value type used in date/time validation messages.
    pub const fn value_type(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            _ => "date/time",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_names()[0])
    }
}

fn normalize_type_name(name: &str) -> String {
    let last = name.rsplit(['.', ':']).next().unwrap_or(name);
    let mut norm: String = last
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if norm.len() > "property".len() && norm.ends_with("property") {
        norm.truncate(norm.len() - "property".len());
    }
    norm
}

/// How a cascading driver without a value constrains the possible values of
/// a dependent enumerated property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CascadeNullMode {
    /// A blank driver, or a blank candidate attribute, does not constrain.
    #[default]
    MatchAll,
    /// A blank driver matches only candidates whose attribute is blank.
    NullOnly,
}

/// The declaration of a data property: its kind plus every option a data
/// object needs to instantiate it.
///
/// # Examples
///
/// ```
/// use formkit_model::PropertyDef;
///
/// let age = PropertyDef::integer().min(0.0).required(true).label("Age in years");
/// let status = PropertyDef::enumeration("status").multi_valued(true);
/// # let _ = (age, status);
/// ```
#[derive(Clone)]
pub struct PropertyDef {
    pub(crate) kind: PropertyKind,
    pub(crate) label: Option<String>,
    pub(crate) access_level: AccessLevel,
    pub(crate) editable: bool,
    pub(crate) visible: bool,
    pub(crate) required: bool,
    pub(crate) multi_valued: bool,
    pub(crate) is_key: bool,
    pub(crate) null_string: Option<String>,
    pub(crate) restricted_string: Option<String>,
    pub(crate) size: Option<usize>,
    pub(crate) minimum: Option<f64>,
    pub(crate) maximum: Option<f64>,
    pub(crate) fraction_digits: Option<usize>,
    pub(crate) display_format: Option<String>,
    pub(crate) edit_format: Option<String>,
    pub(crate) minutes_centric: bool,
    pub(crate) enum_type: Option<String>,
    pub(crate) key_format: Option<String>,
    pub(crate) cascades: Vec<(String, String)>,
    pub(crate) cascade_null_mode: CascadeNullMode,
    pub(crate) local_loader: Option<Rc<LocalCacheLoader>>,
    pub(crate) cache: Option<Rc<LookupCache>>,
    pub(crate) validators: Vec<Rc<dyn PropertyValidator>>,
    pub(crate) companions: (Option<String>, Option<String>),
    pub(crate) has_null_check: bool,
}

impl fmt::Debug for PropertyDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDef")
            .field("kind", &self.kind)
            .field("label", &self.label)
            .field("required", &self.required)
            .field("multi_valued", &self.multi_valued)
            .field("enum_type", &self.enum_type)
            .finish_non_exhaustive()
    }
}

impl PropertyDef {
    /// Creates a declaration of the given kind with default options.
    pub const fn new(kind: PropertyKind) -> Self {
        Self {
            kind,
            label: None,
            access_level: AccessLevel::Full,
            editable: true,
            visible: true,
            required: false,
            multi_valued: false,
            is_key: false,
            null_string: None,
            restricted_string: None,
            size: None,
            minimum: kind.default_minimum(),
            maximum: kind.default_maximum(),
            fraction_digits: None,
            display_format: None,
            edit_format: None,
            minutes_centric: false,
            enum_type: None,
            key_format: None,
            cascades: Vec::new(),
            cascade_null_mode: CascadeNullMode::MatchAll,
            local_loader: None,
            cache: None,
            validators: Vec::new(),
            companions: (None, None),
            has_null_check: false,
        }
    }

    // ── Kind shorthands ──────────────────────────────────────────────

    /// A [`PropertyKind::Text`] declaration.
    pub const fn text() -> Self {
        Self::new(PropertyKind::Text)
    }

    /// A [`PropertyKind::Guid`] declaration.
    pub const fn guid() -> Self {
        Self::new(PropertyKind::Guid)
    }

    /// A [`PropertyKind::Boolean`] declaration.
    pub const fn boolean() -> Self {
        Self::new(PropertyKind::Boolean)
    }

    /// A [`PropertyKind::Integer`] declaration.
    pub const fn integer() -> Self {
        Self::new(PropertyKind::Integer)
    }

    /// A [`PropertyKind::PositiveInteger`] declaration.
    pub const fn positive_integer() -> Self {
        Self::new(PropertyKind::PositiveInteger)
    }

    /// A [`PropertyKind::Decimal`] declaration.
    pub const fn decimal() -> Self {
        Self::new(PropertyKind::Decimal)
    }

    /// A [`PropertyKind::PositiveDecimal`] declaration.
    pub const fn positive_decimal() -> Self {
        Self::new(PropertyKind::PositiveDecimal)
    }

    /// A [`PropertyKind::Money`] declaration.
    pub const fn money() -> Self {
        Self::new(PropertyKind::Money)
    }

    /// A [`PropertyKind::PositiveMoney`] declaration.
    pub const fn positive_money() -> Self {
        Self::new(PropertyKind::PositiveMoney)
    }

    /// A [`PropertyKind::Percent`] declaration.
    pub const fn percent() -> Self {
        Self::new(PropertyKind::Percent)
    }

    /// A [`PropertyKind::PercentFraction`] declaration.
    pub const fn percent_fraction() -> Self {
        Self::new(PropertyKind::PercentFraction)
    }

    /// A [`PropertyKind::DateTime`] declaration.
    pub const fn datetime() -> Self {
        Self::new(PropertyKind::DateTime)
    }

    /// A [`PropertyKind::Date`] declaration.
    pub const fn date() -> Self {
        Self::new(PropertyKind::Date)
    }

    /// A [`PropertyKind::Time`] declaration.
    pub const fn time() -> Self {
        Self::new(PropertyKind::Time)
    }

    /// A [`PropertyKind::Enum`] declaration over lookup tables of `enum_type`.
    pub fn enumeration(enum_type: impl Into<String>) -> Self {
        Self::new(PropertyKind::Enum).enum_type(enum_type)
    }

    /// A [`PropertyKind::EnumInt`] declaration over lookup tables of `enum_type`.
    pub fn enum_int(enum_type: impl Into<String>) -> Self {
        Self::new(PropertyKind::EnumInt).enum_type(enum_type)
    }

    /// A [`PropertyKind::EnumBool`] declaration over lookup tables of `enum_type`.
    pub fn enum_bool(enum_type: impl Into<String>) -> Self {
        Self::new(PropertyKind::EnumBool).enum_type(enum_type)
    }

    /// A [`PropertyKind::Operator`] declaration over lookup tables of `enum_type`.
    pub fn operator(enum_type: impl Into<String>) -> Self {
        Self::new(PropertyKind::Operator).enum_type(enum_type)
    }

    // ── Common options ───────────────────────────────────────────────

    /// The kind of the declared property.
    pub const fn kind(&self) -> PropertyKind {
        self.kind
    }

    /// Sets the user-facing label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the initial access level.
    #[must_use]
    pub const fn access_level(mut self, level: AccessLevel) -> Self {
        self.access_level = level;
        self
    }

    /// Sets the initial own editable flag.
    #[must_use]
    pub const fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    /// Sets the initial own visible flag.
    #[must_use]
    pub const fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Sets the initial own required flag.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Makes the property hold a list of values.
    #[must_use]
    pub const fn multi_valued(mut self, multi_valued: bool) -> Self {
        self.multi_valued = multi_valued;
        self
    }

    /// Marks the property as a key of its object.
    #[must_use]
    pub const fn key(mut self, is_key: bool) -> Self {
        self.is_key = is_key;
        self
    }

    /// Overrides the configured null placeholder.
    #[must_use]
    pub fn null_string(mut self, s: impl Into<String>) -> Self {
        self.null_string = Some(s.into());
        self
    }

    /// Overrides the configured restricted placeholder.
    #[must_use]
    pub fn restricted_string(mut self, s: impl Into<String>) -> Self {
        self.restricted_string = Some(s.into());
        self
    }

    /// Adds a validator after the kind's default validators.
    #[must_use]
    pub fn validator(mut self, validator: Rc<dyn PropertyValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    // ── Kind-specific options ────────────────────────────────────────

    /// Sets the maximum length of text values.
    #[must_use]
    pub const fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the minimum of numeric values.
    #[must_use]
    pub const fn min(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Sets the maximum of numeric values.
    #[must_use]
    pub const fn max(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    /// Sets the number of fraction digits displayed for numeric values.
    #[must_use]
    pub const fn fraction_digits(mut self, digits: usize) -> Self {
        self.fraction_digits = Some(digits);
        self
    }

    /// Sets the display format: a `{0}` template for numbers, a `strftime`
    /// pattern for dates and times, or a header template for enumerations.
    #[must_use]
    pub fn display_format(mut self, format: impl Into<String>) -> Self {
        self.display_format = Some(format.into());
        self
    }

    /// Sets the `strftime` edit pattern of a date or time property.
    #[must_use]
    pub fn edit_format(mut self, format: impl Into<String>) -> Self {
        self.edit_format = Some(format.into());
        self
    }

    /// Reads a bare number under 24 typed into a time property as minutes
    /// rather than hours.
    #[must_use]
    pub const fn minutes_centric(mut self, minutes_centric: bool) -> Self {
        self.minutes_centric = minutes_centric;
        self
    }

    /// Sets the lookup table type of an enumerated property.
    #[must_use]
    pub fn enum_type(mut self, enum_type: impl Into<String>) -> Self {
        self.enum_type = Some(enum_type.into());
        self
    }

    /// Sets the header template used to key and edit enumerated values.
    #[must_use]
    pub fn key_format(mut self, format: impl Into<String>) -> Self {
        self.key_format = Some(format.into());
        self
    }

    /// Filters the possible values by the `attribute` of each header, which
    /// must match the value of the sibling property `driver`.
    #[must_use]
    pub fn cascade(mut self, attribute: impl Into<String>, driver: impl Into<String>) -> Self {
        self.cascades.push((attribute.into(), driver.into()));
        self
    }

    /// Sets how blank drivers constrain the possible values.
    #[must_use]
    pub const fn cascade_null_mode(mut self, mode: CascadeNullMode) -> Self {
        self.cascade_null_mode = mode;
        self
    }

    /// Sources the lookup table from a local, parameterized loader.
    #[must_use]
    pub fn local_loader(mut self, loader: Rc<LocalCacheLoader>) -> Self {
        self.local_loader = Some(loader);
        self
    }

    /// Uses the given cache instead of the thread's global cache.
    #[must_use]
    pub fn cache(mut self, cache: Rc<LookupCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Names the operand properties of an operator explicitly.
    #[must_use]
    pub fn companions(mut self, first: impl Into<String>, second: Option<String>) -> Self {
        self.companions = (Some(first.into()), second);
        self
    }

    /// Offers the "is null" / "is not null" operators.
    #[must_use]
    pub const fn null_check(mut self, has_null_check: bool) -> Self {
        self.has_null_check = has_null_check;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_hierarchy() {
        assert!(PropertyKind::PositiveInteger.is_a("integer"));
        assert!(PropertyKind::PositiveInteger.is_a("decimal"));
        assert!(PropertyKind::Guid.is_a("text"));
        assert!(!PropertyKind::Text.is_a("guid"));
        assert!(PropertyKind::Date.is_a("datetime"));
        assert!(PropertyKind::Operator.is_a("enum"));
    }

    #[test]
    fn test_type_name_normalization() {
        assert!(PropertyKind::PositiveInteger.is_a("PositiveIntegerProperty"));
        assert!(PropertyKind::Money.is_a("xomega.MoneyProperty"));
        assert!(PropertyKind::DateTime.is_a("Date Time"));
        assert!(!PropertyKind::Text.is_a("property"));
    }

    #[test]
    fn test_default_bounds() {
        assert_eq!(PropertyDef::positive_money().minimum, Some(0.0));
        assert_eq!(PropertyDef::percent_fraction().maximum, Some(1.0));
        assert_eq!(PropertyDef::integer().minimum, None);
    }

    #[test]
    fn test_builder_chain() {
        let def = PropertyDef::enumeration("state")
            .cascade("country", "Country")
            .key_format("[t]")
            .multi_valued(true)
            .required(true);
        assert_eq!(def.kind(), PropertyKind::Enum);
        assert_eq!(def.enum_type.as_deref(), Some("state"));
        assert_eq!(def.cascades, vec![("country".to_string(), "Country".to_string())]);
        assert!(def.multi_valued && def.required);
    }

    #[test]
    fn test_kind_classes() {
        assert!(PropertyKind::Money.is_numeric());
        assert!(!PropertyKind::Money.is_integral());
        assert!(PropertyKind::Time.is_temporal());
        assert!(PropertyKind::EnumBool.is_enum());
        assert_eq!(PropertyKind::Time.value_type(), "time");
        assert_eq!(PropertyKind::DateTime.to_string(), "datetime");
    }
}
