//! Batched, transactional copy of selected records.

use std::fmt;
use std::num::NonZeroUsize;

use serde::Serialize;

use datasample_core::{
    Connection, EntityType, Error, Key, Result, Selection, Transaction, ValidationError,
    ValidationErrorKind,
};

use crate::cancel::CancelFlag;
use crate::resolve::TopoOrder;

/// Maximum number of records fetched and inserted at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    /// Default batch size.
    pub const DEFAULT: BatchSize = BatchSize(match NonZeroUsize::new(100) {
        Some(n) => n,
        None => unreachable!(),
    });

    /// Create a batch size, rejecting zero.
    pub fn new(size: usize) -> std::result::Result<Self, ValidationError> {
        NonZeroUsize::new(size).map(BatchSize).ok_or_else(|| invalid(size))
    }

    /// The size as a plain integer.
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for BatchSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<usize> for BatchSize {
    type Error = ValidationError;

    fn try_from(size: usize) -> std::result::Result<Self, Self::Error> {
        Self::new(size)
    }
}

impl TryFrom<i64> for BatchSize {
    type Error = ValidationError;

    fn try_from(size: i64) -> std::result::Result<Self, Self::Error> {
        usize::try_from(size)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(BatchSize)
            .ok_or_else(|| invalid(size))
    }
}

fn invalid(size: impl fmt::Display) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::BatchSize,
        format!("batch size must be a positive integer, got {}", size),
    )
}

/// Split `keys` into consecutive batches of at most `size` keys.
///
/// Every batch is full except possibly the last.
pub fn partition<'a, I>(keys: I, size: BatchSize) -> Vec<Vec<Key>>
where
    I: IntoIterator<Item = &'a Key>,
{
    let keys: Vec<Key> = keys.into_iter().cloned().collect();
    keys.chunks(size.get()).map(<[Key]>::to_vec).collect()
}

/// Rows and batches written for one entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityCopy {
    /// Entity type label.
    pub entity: String,
    /// Rows inserted.
    pub inserted: u64,
    /// Batches written.
    pub batches: usize,
}

/// Outcome of [`replicate`], in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplicationReport {
    /// Per-type counts, for types that had records to copy.
    pub entities: Vec<EntityCopy>,
}

impl ReplicationReport {
    /// Total rows inserted.
    pub fn total_inserted(&self) -> u64 {
        self.entities.iter().map(|e| e.inserted).sum()
    }

    /// Counts for one entity type.
    pub fn get(&self, entity: &EntityType) -> Option<&EntityCopy> {
        self.entities.iter().find(|e| e.entity == entity.label())
    }
}

/// Copy the records in `selection` from `source` to `destination`.
///
/// Entity types are written in creation order so referenced records exist
/// before the records that point at them. Everything runs inside one
/// destination transaction: on any error, including cancellation, the
/// transaction is rolled back and the error returned.
#[tracing::instrument(level = "debug", skip_all, fields(batch_size = %batch_size))]
pub fn replicate<S, D>(
    source: &S,
    destination: &mut D,
    order: &TopoOrder,
    selection: &Selection,
    batch_size: BatchSize,
    cancel: &CancelFlag,
) -> Result<ReplicationReport>
where
    S: Connection + ?Sized,
    D: Connection,
{
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tracing::info!("Beginning destination transaction");
    let mut tx = destination.begin()?;

    match copy_all(source, &mut tx, order, selection, batch_size, cancel) {
        Ok(report) => {
            tracing::info!(
                inserted = report.total_inserted(),
                "Committing destination transaction"
            );
            tx.commit()?;
            Ok(report)
        }
        Err(err) => {
            tracing::info!(error = %err, "Rolling back destination transaction");
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!(
                    error = %rollback_err,
                    "Rollback failed after replication error"
                );
            }
            Err(err)
        }
    }
}

fn copy_all<S, T>(
    source: &S,
    tx: &mut T,
    order: &TopoOrder,
    selection: &Selection,
    batch_size: BatchSize,
    cancel: &CancelFlag,
) -> Result<ReplicationReport>
where
    S: Connection + ?Sized,
    T: Transaction,
{
    let mut report = ReplicationReport::default();

    for entity in order {
        let Some(keys) = selection.keys(entity).filter(|keys| !keys.is_empty()) else {
            continue;
        };

        tracing::debug!(entity = %entity, records = keys.len(), "Importing");

        let mut copy = EntityCopy {
            entity: entity.label().to_string(),
            inserted: 0,
            batches: 0,
        };
        for batch in partition(keys, batch_size) {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let records = source.read_records(entity, &batch)?;
            copy.inserted += tx.bulk_insert(entity, records)?;
            copy.batches += 1;
        }
        report.entities.push(copy);
    }

    Ok(report)
}
