//! Sort criteria for data list rows.

use serde::{Deserialize, Serialize};

/// The direction of a sort field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

/// One field of the sort criteria of a data list.
///
/// # Examples
///
/// ```
/// use formkit_model::{ListSortField, SortDirection};
///
/// let mut field = ListSortField::new("Name").nulls_first(true);
/// field.toggle_direction();
/// assert_eq!(field.direction, SortDirection::Descending);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSortField {
    /// The name of the property to sort by.
    pub property: String,
    /// The sort direction.
    pub direction: SortDirection,
    /// Whether rows without a value come before rows with one.
    pub nulls_first: bool,
}

impl ListSortField {
    /// Creates an ascending sort field with nulls last.
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: SortDirection::Ascending,
            nulls_first: false,
        }
    }

    /// Sets the direction to descending.
    #[must_use]
    pub const fn descending(mut self) -> Self {
        self.direction = SortDirection::Descending;
        self
    }

    /// Sets whether nulls come first.
    #[must_use]
    pub const fn nulls_first(mut self, nulls_first: bool) -> Self {
        self.nulls_first = nulls_first;
        self
    }

    /// Flips the sort direction.
    pub fn toggle_direction(&mut self) {
        self.direction = match self.direction {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        };
    }
}
