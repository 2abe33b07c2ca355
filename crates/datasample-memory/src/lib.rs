//! In-memory store driver for datasample.
//!
//! [`MemoryConnection`] keeps every entity type as an ordered map from key to
//! record. Writes go through a [`MemoryTransaction`] that stages rows and only
//! applies them on commit, so a rolled back or dropped transaction leaves the
//! store as it was.
//!
//! Inserts enforce primary key uniqueness. With a [`Registry`] attached via
//! [`MemoryConnection::with_schema`] they also enforce that every non-null
//! singular reference points at a record that exists (committed or staged in
//! the same transaction). Self references are not checked.
//!
//! The driver counts reads, existence checks and transaction events, and can
//! be told to fail a given insert, which makes it the test double for the
//! importer.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use datasample_core::{
    Connection, EntityType, Key, Record, Registry, RelationMetadata, Result, StoreError,
    StoreErrorKind, Transaction,
};

type Table = BTreeMap<Key, Record>;

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Default)]
struct Counters {
    reads: AtomicUsize,
    existence_checks: AtomicUsize,
    inserts: AtomicUsize,
    transactions: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> MemoryStats {
        MemoryStats {
            reads: self.reads.load(Ordering::Relaxed),
            existence_checks: self.existence_checks.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            transactions: self.transactions.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
        }
    }
}

/// Operation counts of a [`MemoryConnection`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryStats {
    /// Calls to `read_keys`, `read_projection` and `read_records`.
    pub reads: usize,
    /// Calls to `existing_keys`.
    pub existence_checks: usize,
    /// Rows accepted by `bulk_insert`, committed or not.
    pub inserts: usize,
    /// Transactions begun.
    pub transactions: usize,
    /// Transactions committed.
    pub commits: usize,
    /// Transactions rolled back explicitly.
    pub rollbacks: usize,
}

// ============================================================================
// Connection
// ============================================================================

/// A record store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryConnection {
    name: String,
    description: Option<String>,
    tables: BTreeMap<EntityType, Table>,
    schema: Option<Registry>,
    /// `(entity, n)`: the n-th `bulk_insert` of `entity` in a transaction fails.
    failures: Vec<(EntityType, usize)>,
    counters: Counters,
}

impl MemoryConnection {
    /// Create an empty store called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the text returned by [`Connection::describe`].
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Enforce the references declared in `registry` on insert.
    #[must_use]
    pub fn with_schema(mut self, registry: Registry) -> Self {
        self.schema = Some(registry);
        self
    }

    /// Make the `nth` (1-based) `bulk_insert` of `entity` within each
    /// transaction fail with a write error.
    #[must_use]
    pub fn fail_insert_on(mut self, entity: impl Into<EntityType>, nth: usize) -> Self {
        self.failures.push((entity.into(), nth));
        self
    }

    /// Store `records` directly, bypassing transactions and constraints.
    ///
    /// An existing record with the same key is replaced.
    pub fn seed<I>(&mut self, entity: impl Into<EntityType>, records: I)
    where
        I: IntoIterator<Item = Record>,
    {
        let table = self.tables.entry(entity.into()).or_default();
        for record in records {
            table.insert(record.key().clone(), record);
        }
    }

    /// The committed record of `entity` with `key`.
    pub fn get(&self, entity: &EntityType, key: &Key) -> Option<&Record> {
        self.tables.get(entity).and_then(|table| table.get(key))
    }

    /// Number of committed records of `entity`.
    pub fn count(&self, entity: &EntityType) -> usize {
        self.tables.get(entity).map_or(0, BTreeMap::len)
    }

    /// Snapshot of the operation counters.
    pub fn stats(&self) -> MemoryStats {
        self.counters.snapshot()
    }

    fn table(&self, entity: &EntityType) -> Option<&Table> {
        self.tables.get(entity)
    }
}

impl Connection for MemoryConnection {
    type Tx<'conn>
        = MemoryTransaction<'conn>
    where
        Self: 'conn;

    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| "in-memory store".to_string())
    }

    fn read_keys(&self, entity: &EntityType) -> Result<BTreeSet<Key>> {
        Counters::bump(&self.counters.reads);
        Ok(self
            .table(entity)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn read_projection(
        &self,
        entity: &EntityType,
        keys: &BTreeSet<Key>,
        fields: &[&str],
    ) -> Result<Vec<Record>> {
        Counters::bump(&self.counters.reads);
        let Some(table) = self.table(entity) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| table.get(key))
            .map(|record| record.project(fields))
            .collect())
    }

    fn read_records(&self, entity: &EntityType, keys: &[Key]) -> Result<Vec<Record>> {
        Counters::bump(&self.counters.reads);
        let Some(table) = self.table(entity) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|key| table.get(key))
            .cloned()
            .collect())
    }

    fn existing_keys(&self, entity: &EntityType, keys: &BTreeSet<Key>) -> Result<BTreeSet<Key>> {
        Counters::bump(&self.counters.existence_checks);
        let Some(table) = self.table(entity) else {
            return Ok(BTreeSet::new());
        };
        Ok(keys
            .iter()
            .filter(|key| table.contains_key(key))
            .cloned()
            .collect())
    }

    fn begin(&mut self) -> Result<Self::Tx<'_>> {
        Counters::bump(&self.counters.transactions);
        tracing::debug!(store = %self.name, "Beginning in-memory transaction");
        Ok(MemoryTransaction {
            conn: self,
            staged: BTreeMap::new(),
            insert_calls: BTreeMap::new(),
            finished: false,
        })
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// Write transaction over a [`MemoryConnection`].
///
/// Dropping it without [`commit`](Transaction::commit) discards staged rows.
#[derive(Debug)]
pub struct MemoryTransaction<'conn> {
    conn: &'conn mut MemoryConnection,
    staged: BTreeMap<EntityType, Table>,
    insert_calls: BTreeMap<EntityType, usize>,
    finished: bool,
}

impl MemoryTransaction<'_> {
    /// Number of staged, uncommitted rows.
    pub fn staged_rows(&self) -> usize {
        self.staged.values().map(BTreeMap::len).sum()
    }

    fn exists(&self, entity: &EntityType, key: &Key) -> bool {
        self.conn.get(entity, key).is_some()
            || self
                .staged
                .get(entity)
                .is_some_and(|table| table.contains_key(key))
    }

    fn check_injected_failure(&mut self, entity: &EntityType) -> Result<()> {
        let calls = self.insert_calls.entry(entity.clone()).or_insert(0);
        *calls += 1;
        let nth = *calls;
        if self
            .conn
            .failures
            .iter()
            .any(|(failing, at)| failing == entity && *at == nth)
        {
            return Err(StoreError::new(
                StoreErrorKind::Write,
                format!("injected failure on insert #{}", nth),
            )
            .entity(entity)
            .into());
        }
        Ok(())
    }

    fn check_record(&self, entity: &EntityType, record: &Record, batch: &Table) -> Result<()> {
        if self.exists(entity, record.key()) || batch.contains_key(record.key()) {
            return Err(StoreError::new(
                StoreErrorKind::Constraint,
                format!("duplicate primary key {}", record.key()),
            )
            .entity(entity)
            .into());
        }

        let Some(schema) = &self.conn.schema else {
            return Ok(());
        };
        for reference in schema.singular_references(entity) {
            let Some(value) = record.get(&reference.attribute) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let present = value
                .to_key()
                .is_some_and(|key| self.exists(&reference.target, &key));
            if !present {
                return Err(StoreError::new(
                    StoreErrorKind::Constraint,
                    format!(
                        "record {} references missing {} via {}",
                        record.key(),
                        reference.target,
                        reference.attribute
                    ),
                )
                .entity(entity)
                .into());
            }
        }
        Ok(())
    }
}

impl Transaction for MemoryTransaction<'_> {
    fn bulk_insert(&mut self, entity: &EntityType, records: Vec<Record>) -> Result<u64> {
        self.check_injected_failure(entity)?;

        let mut batch = Table::new();
        for record in records {
            self.check_record(entity, &record, &batch)?;
            batch.insert(record.key().clone(), record);
        }

        let written = batch.len();
        self.conn
            .counters
            .inserts
            .fetch_add(written, Ordering::Relaxed);
        self.staged.entry(entity.clone()).or_default().extend(batch);
        Ok(written as u64)
    }

    fn commit(mut self) -> Result<()> {
        let staged = std::mem::take(&mut self.staged);
        tracing::debug!(
            store = %self.conn.name,
            rows = staged.values().map(BTreeMap::len).sum::<usize>(),
            "Committing in-memory transaction"
        );
        for (entity, rows) in staged {
            self.conn.tables.entry(entity).or_default().extend(rows);
        }
        Counters::bump(&self.conn.counters.commits);
        self.finished = true;
        Ok(())
    }

    fn rollback(mut self) -> Result<()> {
        tracing::debug!(
            store = %self.conn.name,
            rows = self.staged_rows(),
            "Rolling back in-memory transaction"
        );
        self.staged.clear();
        Counters::bump(&self.conn.counters.rollbacks);
        self.finished = true;
        Ok(())
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.staged.is_empty() {
            tracing::debug!(
                store = %self.conn.name,
                rows = self.staged_rows(),
                "Discarding uncommitted in-memory transaction"
            );
        }
    }
}
