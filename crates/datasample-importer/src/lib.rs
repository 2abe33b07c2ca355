//! Referentially closed record import for datasample.
//!
//! The [`Importer`] copies a [`Selection`] of records from a source store into a
//! destination store so that every record a copied record refers to is present
//! at the destination too. An import runs four stages:
//!
//! 1. [`resolve`] orders the entity types so referenced types come first.
//! 2. [`expand`] adds the keys of every transitively referenced record.
//! 3. [`dedup`] drops keys the destination already holds.
//! 4. [`replicate`] copies what is left, in batches, inside one transaction.
//!
//! # Example
//!
//! ```ignore
//! let mut importer = Importer::new(source, destination, registry)
//!     .with_config(ImportConfig::new().batch_size(BatchSize::new(500)?));
//!
//! let report = importer.import(selection)?;
//! println!("copied {} rows", report.total_inserted());
//! ```

pub mod cancel;
pub mod dedup;
pub mod expand;
pub mod replicate;
pub mod report;
pub mod resolve;

pub use cancel::CancelFlag;
pub use dedup::dedup;
pub use expand::expand;
pub use replicate::{BatchSize, EntityCopy, ReplicationReport, partition, replicate};
pub use report::{EntityReport, ImportReport};
pub use resolve::{TopoOrder, resolve};

use datasample_core::{
    Connection, RelationMetadata, Result, Selection, ValidationError, ValidationErrorKind,
};

// ============================================================================
// Import Configuration
// ============================================================================

/// Configuration for [`Importer`] behavior.
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    /// Records fetched and inserted per round trip.
    pub batch_size: BatchSize,
}

impl ImportConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: BatchSize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

// ============================================================================
// Importer
// ============================================================================

/// Copies selections from one store to another.
///
/// The importer owns both connections and the relation metadata. It keeps no
/// state between [`import`](Importer::import) calls.
pub struct Importer<S, D, M> {
    source: S,
    destination: D,
    metadata: M,
    config: ImportConfig,
    cancel: CancelFlag,
}

impl<S, D, M> Importer<S, D, M>
where
    S: Connection,
    D: Connection,
    M: RelationMetadata,
{
    /// Create an importer with default configuration.
    pub fn new(source: S, destination: D, metadata: M) -> Self {
        Self {
            source,
            destination,
            metadata,
            config: ImportConfig::default(),
            cancel: CancelFlag::new(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ImportConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a cancellation flag with the caller.
    #[must_use]
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Get a reference to the source connection.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a reference to the destination connection.
    pub fn destination(&self) -> &D {
        &self.destination
    }

    /// Get a mutable reference to the destination connection.
    pub fn destination_mut(&mut self) -> &mut D {
        &mut self.destination
    }

    /// Take back the connections and metadata.
    pub fn into_parts(self) -> (S, D, M) {
        (self.source, self.destination, self.metadata)
    }

    /// Copy `selection` and everything it references to the destination.
    ///
    /// Nothing is written unless the whole copy succeeds. A circular
    /// relationship between the selected types fails before any read. Records
    /// already present at the destination are skipped, so repeating an import
    /// writes nothing.
    #[tracing::instrument(
        level = "debug",
        skip(self, selection),
        fields(source = %self.source.name(), destination = %self.destination.name())
    )]
    pub fn import(&mut self, selection: Selection) -> Result<ImportReport> {
        self.validate()?;

        let order = resolve(&self.metadata, selection.entity_types())?;

        tracing::info!(types = order.len(), "Expanding selection along references");
        let expanded = expand(&self.source, &self.metadata, &order, selection.clone())?;

        let remaining = dedup(&self.destination, expanded.clone())?;
        for entity in &order {
            tracing::debug!(
                "Importing {} new objects of {}",
                remaining.len_of(entity),
                entity
            );
        }

        let replication = replicate(
            &self.source,
            &mut self.destination,
            &order,
            &remaining,
            self.config.batch_size,
            &self.cancel,
        )?;

        let report = ImportReport::build(&order, &selection, &expanded, &remaining, &replication);
        tracing::info!(
            inserted = report.total_inserted(),
            skipped = report.total_already_present(),
            "Import finished"
        );
        Ok(report)
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.source.name() == self.destination.name() {
            return Err(ValidationError::new(
                ValidationErrorKind::SameStore,
                format!(
                    "source and destination must be different stores, both are {}",
                    self.source.name()
                ),
            ));
        }
        Ok(())
    }
}

impl<S, D, M> std::fmt::Debug for Importer<S, D, M>
where
    S: Connection,
    D: Connection,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Importer")
            .field("source", &self.source.name())
            .field("destination", &self.destination.name())
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
