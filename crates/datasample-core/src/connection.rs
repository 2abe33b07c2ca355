//! Store connection traits.
//!
//! Drivers implement [`Connection`] for a live store. The importer reads keys,
//! projections and full records from the source connection, checks existing
//! keys against the destination connection, and writes to the destination only
//! through a [`Transaction`] obtained from [`Connection::begin`].
//!
//! All operations are blocking. A driver that talks to a remote store does its
//! own I/O inside each call.

use std::collections::BTreeSet;

use crate::entity::EntityType;
use crate::error::Result;
use crate::record::Record;
use crate::value::Key;

/// A connection to a record store.
pub trait Connection {
    /// Transaction type returned by [`begin`](Connection::begin).
    type Tx<'conn>: Transaction
    where
        Self: 'conn;

    /// Short name identifying the store (e.g. the configured alias).
    ///
    /// Two connections with the same name are treated as the same store.
    fn name(&self) -> &str;

    /// Human-readable description of where the store lives.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Every primary key stored for `entity`.
    fn read_keys(&self, entity: &EntityType) -> Result<BTreeSet<Key>>;

    /// Records for `keys`, carrying only the requested `fields`.
    ///
    /// Keys with no record are skipped.
    fn read_projection(
        &self,
        entity: &EntityType,
        keys: &BTreeSet<Key>,
        fields: &[&str],
    ) -> Result<Vec<Record>>;

    /// Full records for `keys`. Keys with no record are skipped.
    fn read_records(&self, entity: &EntityType, keys: &[Key]) -> Result<Vec<Record>>;

    /// The subset of `keys` that already has a record of `entity`.
    fn existing_keys(&self, entity: &EntityType, keys: &BTreeSet<Key>) -> Result<BTreeSet<Key>>;

    /// Begin a transaction for writes.
    fn begin(&mut self) -> Result<Self::Tx<'_>>;
}

/// An open write transaction.
///
/// Dropping a transaction without calling [`commit`](Transaction::commit)
/// must discard its writes.
pub trait Transaction {
    /// Insert `records` of `entity`, returning the number of rows written.
    fn bulk_insert(&mut self, entity: &EntityType, records: Vec<Record>) -> Result<u64>;

    /// Make every write visible.
    fn commit(self) -> Result<()>;

    /// Discard every write.
    fn rollback(self) -> Result<()>;
}
