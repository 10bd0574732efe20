//! Relationship metadata.
//!
//! Relations are declared once at startup and stay read-only afterwards. The
//! record layer uses them to resolve related ids, compile joins and keep
//! junction tables in sync.

/// The cardinality of a relation field, seen from the declaring model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
    /// Many-to-one: a `Hero` belongs to one `Team` (FK column on this table).
    #[default]
    ManyToOne,
    /// One-to-many: a `Team` has many `Hero`s (FK on the other table).
    OneToMany,
    /// Many-to-many: `Hero`s have many `Power`s via a junction table.
    ManyToMany,
    /// Reverse one-to-one: a `User` has one `Profile` whose FK points back.
    ///
    /// The schema does not enforce uniqueness; only the first match is kept.
    ReverseOneToOne,
}

impl RelationshipKind {
    /// Whether the value lives in a column of the declaring table.
    #[must_use]
    pub const fn is_stored(&self) -> bool {
        matches!(self, RelationshipKind::ManyToOne)
    }

    /// Whether the relation is owned by another table (reverse FK or junction).
    #[must_use]
    pub const fn is_reverse(&self) -> bool {
        !self.is_stored()
    }

    /// Whether the value is a list of ids rather than a single id.
    #[must_use]
    pub const fn is_multi(&self) -> bool {
        matches!(
            self,
            RelationshipKind::OneToMany | RelationshipKind::ManyToMany
        )
    }
}

/// Information about a junction table for many-to-many relationships.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTableInfo {
    /// The junction table name (e.g., `"hero_powers"`).
    pub table_name: String,

    /// Column pointing to the declaring model (e.g., `"hero_id"`).
    pub our_column: String,

    /// Column pointing to the target model (e.g., `"power_id"`).
    pub their_column: String,
}

impl LinkTableInfo {
    /// Create a new junction table definition.
    #[must_use]
    pub fn new(
        table_name: impl Into<String>,
        our_column: impl Into<String>,
        their_column: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            our_column: our_column.into(),
            their_column: their_column.into(),
        }
    }
}

/// Relation metadata attached to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationInfo {
    /// Kind of relationship.
    pub kind: RelationshipKind,

    /// Name of the target model.
    pub target: String,

    /// Field on the target model pointing back to us (one-to-many and
    /// reverse one-to-one).
    pub reverse_key: Option<String>,

    /// Junction table (many-to-many).
    pub link_table: Option<LinkTableInfo>,
}

impl RelationInfo {
    /// Many-to-one relation to `target`.
    #[must_use]
    pub fn many_to_one(target: impl Into<String>) -> Self {
        Self {
            kind: RelationshipKind::ManyToOne,
            target: target.into(),
            reverse_key: None,
            link_table: None,
        }
    }

    /// One-to-many relation to `target` through its `reverse_key` field.
    #[must_use]
    pub fn one_to_many(target: impl Into<String>, reverse_key: impl Into<String>) -> Self {
        Self {
            kind: RelationshipKind::OneToMany,
            target: target.into(),
            reverse_key: Some(reverse_key.into()),
            link_table: None,
        }
    }

    /// Reverse one-to-one relation to `target` through its `reverse_key` field.
    #[must_use]
    pub fn reverse_one_to_one(target: impl Into<String>, reverse_key: impl Into<String>) -> Self {
        Self {
            kind: RelationshipKind::ReverseOneToOne,
            target: target.into(),
            reverse_key: Some(reverse_key.into()),
            link_table: None,
        }
    }

    /// Many-to-many relation to `target` through a junction table.
    #[must_use]
    pub fn many_to_many(target: impl Into<String>, link: LinkTableInfo) -> Self {
        Self {
            kind: RelationshipKind::ManyToMany,
            target: target.into(),
            reverse_key: None,
            link_table: Some(link),
        }
    }
}
