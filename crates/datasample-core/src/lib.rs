//! Core types and traits for datasample.
//!
//! `datasample-core` is the **foundation layer** of the workspace. It defines the
//! data model and the contracts every other crate builds on.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: `Connection`/`Transaction` are implemented by store
//!   drivers; `RelationMetadata` is implemented by schema catalogs.
//! - **Data model**: `EntityType`, `Key`, `Value` and `Record` describe what is
//!   copied; `EntitySchema` and `RelationshipInfo` describe how records refer to
//!   each other.
//! - **Errors**: one `Error` type shared by the importer, drivers and the
//!   sampling front-end.
//!
//! # Who Uses This Crate
//!
//! - `datasample-importer` walks `RelationMetadata` and drives two `Connection`s.
//! - `datasample-memory` implements `Connection` over in-process tables.
//! - `datasample-sample` resolves labels against a `Registry` and builds the
//!   initial `Selection`.
//!
//! Most applications should use the `datasample` facade.

pub mod connection;
pub mod entity;
pub mod error;
pub mod record;
pub mod registry;
pub mod relationship;
pub mod selection;
pub mod value;

pub use connection::{Connection, Transaction};
pub use entity::{EntitySchema, EntityType, FieldDef};
pub use error::{
    CircularRelationshipError, Error, Result, StoreError, StoreErrorKind, ValidationError,
    ValidationErrorKind,
};
pub use record::Record;
pub use registry::{Label, Registry, RelationMetadata};
pub use relationship::{Reference, RelationshipInfo, RelationshipKind};
pub use selection::Selection;
pub use value::{Key, Value};
