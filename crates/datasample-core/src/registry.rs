//! Schema registry and relation metadata.
//!
//! The importer never inspects schema itself; it asks a [`RelationMetadata`]
//! for the singular references of each entity type. [`Registry`] is the
//! standard implementation: a static catalog of [`EntitySchema`]s grouped by
//! app label, in registration order.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::entity::{EntitySchema, EntityType};
use crate::error::{ValidationError, ValidationErrorKind};
use crate::relationship::Reference;

/// Source of relation metadata for the importer.
pub trait RelationMetadata {
    /// Singular references of `entity` to other entity types.
    ///
    /// Must exclude self-references and return the same list every time it is
    /// called for the same type.
    fn singular_references(&self, entity: &EntityType) -> Vec<Reference>;
}

impl<T: RelationMetadata + ?Sized> RelationMetadata for &T {
    fn singular_references(&self, entity: &EntityType) -> Vec<Reference> {
        (**self).singular_references(entity)
    }
}

/// A parsed `app_label` or `app_label.ModelName` label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// A whole application.
    App(String),
    /// A single model.
    Model(EntityType),
}

impl Label {
    /// Parse and validate a label.
    pub fn parse(label: &str) -> Result<Self, ValidationError> {
        if !label_regex().is_match(label) {
            return Err(ValidationError::new(
                ValidationErrorKind::Label,
                format!("invalid label {:?}, expected app_label or app_label.ModelName", label),
            ));
        }
        if label.contains('.') {
            Ok(Label::Model(EntityType::new(label)))
        } else {
            Ok(Label::App(label.to_string()))
        }
    }
}

fn label_regex() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("label pattern is valid")
    })
}

/// Catalog of entity schemas grouped by app label.
///
/// # Example
///
/// ```
/// use datasample_core::entity::{EntitySchema, EntityType};
/// use datasample_core::registry::{Registry, RelationMetadata};
/// use datasample_core::relationship::RelationshipInfo;
///
/// let registry = Registry::new()
///     .with(EntitySchema::new("league.Team"))
///     .with(
///         EntitySchema::new("league.Hero")
///             .relationship(RelationshipInfo::many_to_one("team", "league.Team", "team_id")),
///     );
///
/// let refs = registry.singular_references(&EntityType::new("league.Hero"));
/// assert_eq!(refs[0].target.label(), "league.Team");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    schemas: BTreeMap<EntityType, EntitySchema>,
    /// App label -> models in registration order.
    apps: Vec<(String, Vec<EntityType>)>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, builder style.
    #[must_use]
    pub fn with(mut self, schema: EntitySchema) -> Self {
        self.register(schema);
        self
    }

    /// Register a schema, replacing any previous one with the same label.
    pub fn register(&mut self, schema: EntitySchema) {
        let entity = schema.entity().clone();
        let app = entity.app_label().to_string();
        if self.schemas.insert(entity.clone(), schema).is_some() {
            return;
        }
        match self.apps.iter_mut().find(|(label, _)| *label == app) {
            Some((_, models)) => models.push(entity),
            None => self.apps.push((app, vec![entity])),
        }
    }

    /// Schema for an entity type, if registered.
    pub fn get(&self, entity: &EntityType) -> Option<&EntitySchema> {
        self.schemas.get(entity)
    }

    /// Whether an entity type is registered.
    pub fn contains(&self, entity: &EntityType) -> bool {
        self.schemas.contains_key(entity)
    }

    /// Look up a model by its `app_label.ModelName` label.
    pub fn get_model(&self, label: &str) -> Result<&EntitySchema, ValidationError> {
        let entity = match Label::parse(label)? {
            Label::Model(entity) => entity,
            Label::App(_) => {
                return Err(ValidationError::new(
                    ValidationErrorKind::Label,
                    format!("{:?} is not a model label", label),
                ));
            }
        };
        self.app_models(entity.app_label())?;
        self.schemas.get(&entity).ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::UnknownModel,
                format!("unknown model: {}", label),
            )
        })
    }

    /// Models of one app, in registration order.
    pub fn app_models(&self, app_label: &str) -> Result<&[EntityType], ValidationError> {
        self.apps
            .iter()
            .find(|(label, _)| label == app_label)
            .map(|(_, models)| models.as_slice())
            .ok_or_else(|| {
                ValidationError::new(
                    ValidationErrorKind::UnknownApp,
                    format!("no installed app with label {:?}", app_label),
                )
            })
    }

    /// App labels in registration order.
    pub fn app_labels(&self) -> impl Iterator<Item = &str> {
        self.apps.iter().map(|(label, _)| label.as_str())
    }

    /// Every registered model, grouped by app in registration order.
    pub fn models(&self) -> impl Iterator<Item = &EntityType> {
        self.apps.iter().flat_map(|(_, models)| models.iter())
    }

    /// Number of registered models.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Whether no model is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl RelationMetadata for Registry {
    fn singular_references(&self, entity: &EntityType) -> Vec<Reference> {
        self.schemas
            .get(entity)
            .map(EntitySchema::singular_references)
            .unwrap_or_default()
    }
}
