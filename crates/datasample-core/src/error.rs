//! Error types for datasample.
//!
//! Every fallible operation in the workspace returns [`Result`]. The variants
//! are kept distinct so callers can tell a schema problem (cycle), a caller
//! mistake (validation), and a store failure apart.

use std::error::Error as StdError;
use std::fmt;

use crate::entity::EntityType;

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// The primary error type.
#[derive(Debug)]
pub enum Error {
    /// Singular references form a cycle; no ordering exists.
    CircularRelationship(CircularRelationshipError),
    /// A read, write or transaction failure in either store.
    Store(StoreError),
    /// Bad input detected before any I/O.
    Validation(ValidationError),
    /// The import was cancelled by the caller.
    Cancelled,
    /// Terminal I/O failed while prompting for confirmation.
    Io(std::io::Error),
}

impl Error {
    /// Check if this is a cycle error.
    pub const fn is_circular(&self) -> bool {
        matches!(self, Error::CircularRelationship(_))
    }

    /// Check if this is a validation error.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// Check if this is a store error.
    pub const fn is_store(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CircularRelationship(e) => write!(f, "{}", e),
            Error::Store(e) => write!(f, "{}", e),
            Error::Validation(e) => write!(f, "{}", e),
            Error::Cancelled => f.write_str("import cancelled"),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::CircularRelationship(e) => Some(e),
            Error::Store(e) => Some(e),
            Error::Validation(e) => Some(e),
            Error::Cancelled => None,
            Error::Io(e) => Some(e),
        }
    }
}

impl From<CircularRelationshipError> for Error {
    fn from(err: CircularRelationshipError) -> Self {
        Error::CircularRelationship(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        Error::Store(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err)
    }
}

// ============================================================================
// Circular relationships
// ============================================================================

/// A cycle among singular references.
///
/// `path` starts and ends with the same entity type, e.g. `[A, B, C, A]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularRelationshipError {
    /// Entity types along the cycle, first one repeated at the end.
    pub path: Vec<EntityType>,
}

impl CircularRelationshipError {
    /// Labels along the cycle.
    pub fn labels(&self) -> Vec<&str> {
        self.path.iter().map(EntityType::label).collect()
    }
}

impl fmt::Display for CircularRelationshipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "circular relationship detected between entity types: {}",
            self.labels().join(" -> ")
        )
    }
}

impl StdError for CircularRelationshipError {}

// ============================================================================
// Store errors
// ============================================================================

/// What part of a store operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Store unreachable or closed.
    Connection,
    /// A read failed.
    Read,
    /// A write failed.
    Write,
    /// The store rejected a write (duplicate key, missing referenced record).
    Constraint,
    /// A value could not be interpreted (e.g. a float in a key attribute).
    Decode,
    /// Begin, commit or rollback failed.
    Transaction,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreErrorKind::Connection => "connection",
            StoreErrorKind::Read => "read",
            StoreErrorKind::Write => "write",
            StoreErrorKind::Constraint => "constraint",
            StoreErrorKind::Decode => "decode",
            StoreErrorKind::Transaction => "transaction",
        };
        f.write_str(s)
    }
}

/// A failure reported by a store driver.
#[derive(Debug)]
pub struct StoreError {
    /// Failure category.
    pub kind: StoreErrorKind,
    /// Entity type involved, if any.
    pub entity: Option<EntityType>,
    /// Human-readable description.
    pub message: String,
    /// Underlying driver error.
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl StoreError {
    /// Create a store error without entity or source.
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            entity: None,
            message: message.into(),
            source: None,
        }
    }

    /// Attach the entity type involved.
    #[must_use]
    pub fn entity(mut self, entity: &EntityType) -> Self {
        self.entity = Some(entity.clone());
        self
    }

    /// Attach the underlying error.
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.entity {
            Some(entity) => write!(f, "{} error on {}: {}", self.kind, entity, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

// ============================================================================
// Validation errors
// ============================================================================

/// What input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Batch size is zero or negative.
    BatchSize,
    /// Source and destination are the same store.
    SameStore,
    /// A label is not `app_label` or `app_label.ModelName`.
    Label,
    /// No registered app has this label.
    UnknownApp,
    /// No registered model has this label.
    UnknownModel,
}

/// Input rejected before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// What was rejected.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    /// Create a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error: {}", self.message)
    }
}

impl StdError for ValidationError {}
