//! Entity types and their schema descriptors.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use crate::relationship::{Reference, RelationshipInfo};

/// Stable identity of an entity type: its `app_label.ModelName` label.
///
/// Cheap to clone; ordered and hashed by label so it can key maps and sets.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityType(Arc<str>);

impl EntityType {
    /// Create an entity type from its label.
    pub fn new(label: impl AsRef<str>) -> Self {
        Self(Arc::from(label.as_ref()))
    }

    /// Full label, e.g. `"shop.Order"`.
    pub fn label(&self) -> &str {
        &self.0
    }

    /// Application part of the label (`"shop"` for `"shop.Order"`).
    ///
    /// Labels without a dot are their own app label.
    pub fn app_label(&self) -> &str {
        let label: &str = &self.0;
        label.split_once('.').map_or(label, |(app, _)| app)
    }

    /// Model part of the label (`"Order"` for `"shop.Order"`).
    pub fn model_name(&self) -> &str {
        let label: &str = &self.0;
        label.split_once('.').map_or(label, |(_, model)| model)
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", self.0)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for EntityType {
    fn from(label: String) -> Self {
        Self(Arc::from(label))
    }
}

impl From<&EntityType> for EntityType {
    fn from(entity: &EntityType) -> Self {
        entity.clone()
    }
}

impl Borrow<str> for EntityType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A field definition on an entity schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    /// Attribute name as stored.
    pub name: String,
    /// Whether this field may hold NULL.
    pub nullable: bool,
}

impl FieldDef {
    /// Create a new non-nullable field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: false,
        }
    }

    /// Mark as nullable.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// Schema descriptor for an entity type.
///
/// # Example
///
/// ```
/// use datasample_core::entity::{EntitySchema, FieldDef};
/// use datasample_core::relationship::RelationshipInfo;
///
/// let hero = EntitySchema::new("league.Hero")
///     .field(FieldDef::new("name"))
///     .relationship(RelationshipInfo::many_to_one("team", "league.Team", "team_id"))
///     .relationship(RelationshipInfo::many_to_one("mentor", "league.Hero", "mentor_id"));
///
/// assert_eq!(hero.table_name(), "league_hero");
/// // The self-reference through `mentor` is not a dependency.
/// assert_eq!(hero.singular_references().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    entity: EntityType,
    table_name: String,
    primary_key: String,
    fields: Vec<FieldDef>,
    relationships: Vec<RelationshipInfo>,
}

impl EntitySchema {
    /// Create a schema for the given label.
    ///
    /// The table name defaults to `app_model` in lower case and the primary
    /// key to `id`.
    pub fn new(entity: impl Into<EntityType>) -> Self {
        let entity = entity.into();
        let table_name = format!(
            "{}_{}",
            entity.app_label().to_lowercase(),
            entity.model_name().to_lowercase()
        );
        Self {
            entity,
            table_name,
            primary_key: "id".to_string(),
            fields: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Override the table name.
    #[must_use]
    pub fn table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Override the primary key attribute.
    #[must_use]
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = field.into();
        self
    }

    /// Add a field.
    #[must_use]
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a relationship.
    #[must_use]
    pub fn relationship(mut self, relationship: RelationshipInfo) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// The entity type this schema describes.
    pub fn entity(&self) -> &EntityType {
        &self.entity
    }

    /// Table name in the store.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Primary key attribute.
    pub fn primary_key_field(&self) -> &str {
        &self.primary_key
    }

    /// Declared fields.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Declared relationships.
    pub fn relationships(&self) -> &[RelationshipInfo] {
        &self.relationships
    }

    /// Singular references to *other* entity types, in declaration order.
    pub fn singular_references(&self) -> Vec<Reference> {
        self.relationships
            .iter()
            .filter_map(RelationshipInfo::as_reference)
            .filter(|r| {
                let is_self = r.target == self.entity;
                if is_self {
                    tracing::trace!(
                        entity = %self.entity,
                        field = %r.field,
                        "Ignoring self-reference"
                    );
                }
                !is_self
            })
            .collect()
    }
}
