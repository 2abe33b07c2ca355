//! datasample: copy referentially closed samples of records between stores.
//!
//! This is the facade crate. It re-exports the data model from
//! `datasample-core`, the [`Importer`] and its stages from
//! `datasample-importer`, the [`DataSample`] command from
//! `datasample-sample` and, with the default `memory` feature, the in-memory
//! driver.
//!
//! # Example
//!
//! ```ignore
//! use datasample::prelude::*;
//!
//! let registry = Registry::new()
//!     .with(EntitySchema::new("league.Team"))
//!     .with(EntitySchema::new("league.Hero").relationship(
//!         RelationshipInfo::many_to_one("team", "league.Team", "team_id"),
//!     ));
//!
//! let mut importer = Importer::new(source, destination, &registry);
//! let selection: Selection = [("league.Hero", 1_i64)].into_iter().collect();
//!
//! // Copies hero 1 and the team it points at.
//! let report = importer.import(selection)?;
//! ```

pub use datasample_core::{
    CircularRelationshipError, Connection, EntitySchema, EntityType, Error, FieldDef, Key, Label,
    Record, Reference, Registry, RelationMetadata, RelationshipInfo, RelationshipKind, Result,
    Selection, StoreError, StoreErrorKind, Transaction, ValidationError, ValidationErrorKind, Value,
};
pub use datasample_importer::{
    BatchSize, CancelFlag, EntityCopy, EntityReport, ImportConfig, ImportReport, Importer,
    ReplicationReport, TopoOrder, dedup, expand, partition, replicate, resolve,
};
#[cfg(feature = "memory")]
pub use datasample_memory::{MemoryConnection, MemoryStats, MemoryTransaction};
pub use datasample_sample::{
    DataSample, SampleOptions, SampleOutcome, collect_keys, collect_models, confirm,
    confirmation_prompt, format_connection,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        BatchSize, CancelFlag, Connection, DataSample, EntitySchema, EntityType, Error,
        ImportConfig, ImportReport, Importer, Key, Record, Registry, RelationMetadata,
        RelationshipInfo, Result, SampleOptions, SampleOutcome, Selection, Transaction, Value,
    };
    #[cfg(feature = "memory")]
    pub use crate::MemoryConnection;
}
