//! Access levels and the tri-state modification flag.

use std::fmt;

/// Security access level of a property or data object.
///
/// Levels are ordered, so `level > AccessLevel::ReadOnly` means "can modify".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum AccessLevel {
    /// The element can be neither viewed nor modified.
    None,
    /// The element can be viewed but not modified.
    ReadOnly,
    /// The element can be viewed and modified.
    #[default]
    Full,
}

/// Modification state of a property, object or list.
///
/// A value moves from [`Unset`](Self::Unset) to [`Clean`](Self::Clean) the
/// first time it is assigned, and from `Clean` to [`Dirty`](Self::Dirty)
/// when it is edited afterwards. Only explicit resets move it back.
///
/// # Examples
///
/// ```
/// use formkit_model::Modified;
///
/// assert_eq!(Modified::Unset.or(Modified::Clean), Modified::Clean);
/// assert_eq!(Modified::Clean.or(Modified::Dirty), Modified::Dirty);
/// assert_eq!(Modified::Dirty.or(Modified::Unset), Modified::Dirty);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Modified {
    /// Never assigned.
    #[default]
    Unset,
    /// Assigned once, e.g. from a load.
    Clean,
    /// Changed since it was assigned.
    Dirty,
}

impl Modified {
    /// Returns `true` for [`Modified::Dirty`].
    pub const fn is_dirty(self) -> bool {
        matches!(self, Self::Dirty)
    }

    /// Returns `true` unless the state is [`Modified::Unset`].
    pub const fn is_set(self) -> bool {
        !matches!(self, Self::Unset)
    }

    /// Folds a member's state into an aggregate.
    ///
    /// A dirty aggregate stays dirty; otherwise any assigned member state
    /// replaces it, and unset members are ignored.
    #[must_use]
    pub const fn or(self, member: Self) -> Self {
        match (self, member) {
            (Self::Dirty, _) | (_, Self::Unset) => self,
            (_, m) => m,
        }
    }
}

impl fmt::Display for Modified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unset => "unset",
            Self::Clean => "clean",
            Self::Dirty => "dirty",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_level_order() {
        assert!(AccessLevel::None < AccessLevel::ReadOnly);
        assert!(AccessLevel::ReadOnly < AccessLevel::Full);
        assert_eq!(AccessLevel::default(), AccessLevel::Full);
    }

    #[test]
    fn test_modified_fold() {
        let states = [Modified::Unset, Modified::Clean, Modified::Unset];
        let folded = states.iter().fold(Modified::Unset, |acc, m| acc.or(*m));
        assert_eq!(folded, Modified::Clean);

        let folded = [Modified::Clean, Modified::Dirty, Modified::Clean]
            .iter()
            .fold(Modified::Unset, |acc, m| acc.or(*m));
        assert_eq!(folded, Modified::Dirty);
    }

    #[test]
    fn test_modified_predicates() {
        assert!(Modified::Dirty.is_dirty());
        assert!(!Modified::Clean.is_dirty());
        assert!(Modified::Clean.is_set());
        assert!(!Modified::Unset.is_set());
        assert_eq!(Modified::default(), Modified::Unset);
    }
}
