//! Bidirectional name tables.
//!
//! Every enum that is shown to (or selected by) the user carries exactly
//! one static `(variant, name)` table.  Lookups in either direction go
//! through that table, and a miss resolves to the enum's explicit
//! `UNKNOWN` sentinel rather than to whatever variant happens to be first.

/// An enum with a single static name table.
pub trait Named: Copy + PartialEq + 'static {
    /// Every variant that has a user-visible name.
    const TABLE: &'static [(Self, &'static str)];
    /// Returned by [`from_name`](Named::from_name) on a miss.
    const UNKNOWN: Self;
    /// Returned by [`name`](Named::name) for variants missing from the table.
    const UNKNOWN_NAME: &'static str = "undefined";

    fn name(self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(v, _)| *v == self)
            .map_or(Self::UNKNOWN_NAME, |(_, n)| *n)
    }

    fn from_name(name: &str) -> Self {
        Self::TABLE
            .iter()
            .find(|(_, n)| *n == name)
            .map_or(Self::UNKNOWN, |(v, _)| *v)
    }

    /// All user-selectable names, in table order (for select options).
    fn names() -> impl Iterator<Item = &'static str> {
        Self::TABLE.iter().map(|(_, n)| *n)
    }
}
