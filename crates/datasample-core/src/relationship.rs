//! Relationship metadata for datasample.
//!
//! Relationships are declared on each `EntitySchema` and represented as plain
//! metadata. The importer only ever follows the *singular* ones (one-to-one and
//! many-to-one declared on the referencing side), which it sees as
//! [`Reference`]s.

use crate::entity::EntityType;

/// The type of relationship between two entity types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RelationshipKind {
    /// One-to-one: `Hero` has one `Profile`.
    OneToOne,
    /// Many-to-one: many `Hero`s belong to one `Team`.
    #[default]
    ManyToOne,
    /// One-to-many: one `Team` has many `Hero`s.
    OneToMany,
    /// Many-to-many: `Hero`s have many `Power`s via a link table.
    ManyToMany,
}

impl RelationshipKind {
    /// Whether a record holds at most one key of the related type.
    pub const fn is_singular(self) -> bool {
        matches!(self, RelationshipKind::OneToOne | RelationshipKind::ManyToOne)
    }
}

/// Metadata about a relationship between entity types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipInfo {
    /// Name of the relationship field (e.g. `"team"`).
    pub name: String,

    /// The related entity type.
    pub related: EntityType,

    /// Kind of relationship.
    pub kind: RelationshipKind,

    /// Local attribute holding the related key (e.g. `"team_id"` on `Hero`).
    ///
    /// Only set on the side that stores the key; the reverse side of a
    /// one-to-one has no local key.
    pub local_key: Option<String>,
}

impl RelationshipInfo {
    /// Create a new relationship with required fields.
    pub fn new(
        name: impl Into<String>,
        related: impl Into<EntityType>,
        kind: RelationshipKind,
    ) -> Self {
        Self {
            name: name.into(),
            related: related.into(),
            kind,
            local_key: None,
        }
    }

    /// Shorthand for a many-to-one relationship stored in `local_key`.
    pub fn many_to_one(
        name: impl Into<String>,
        related: impl Into<EntityType>,
        local_key: impl Into<String>,
    ) -> Self {
        Self::new(name, related, RelationshipKind::ManyToOne).local_key(local_key)
    }

    /// Shorthand for a one-to-one relationship stored in `local_key`.
    pub fn one_to_one(
        name: impl Into<String>,
        related: impl Into<EntityType>,
        local_key: impl Into<String>,
    ) -> Self {
        Self::new(name, related, RelationshipKind::OneToOne).local_key(local_key)
    }

    /// Set the local key attribute.
    #[must_use]
    pub fn local_key(mut self, key: impl Into<String>) -> Self {
        self.local_key = Some(key.into());
        self
    }

    /// View this relationship as a singular reference, if it is one.
    ///
    /// Plural kinds and relationships without a local key yield `None`.
    pub fn as_reference(&self) -> Option<Reference> {
        if !self.kind.is_singular() {
            return None;
        }
        let attribute = self.local_key.as_ref()?;
        Some(Reference {
            field: self.name.clone(),
            attribute: attribute.clone(),
            target: self.related.clone(),
        })
    }
}

/// A singular reference field: one attribute holding one key of `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    /// Relationship field name.
    pub field: String,
    /// Attribute that stores the referenced key.
    pub attribute: String,
    /// Referenced entity type.
    pub target: EntityType,
}

impl Reference {
    /// Create a reference.
    pub fn new(
        field: impl Into<String>,
        attribute: impl Into<String>,
        target: impl Into<EntityType>,
    ) -> Self {
        Self {
            field: field.into(),
            attribute: attribute.into(),
            target: target.into(),
        }
    }
}
