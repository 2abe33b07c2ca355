//! Per-type summary of a finished import.

use serde::Serialize;

use datasample_core::{EntityType, Selection};

use crate::replicate::ReplicationReport;
use crate::resolve::TopoOrder;

/// Counts for one entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityReport {
    /// Entity type label.
    pub entity: String,
    /// Keys in the caller's selection.
    pub selected: usize,
    /// Keys after expansion along references.
    pub expanded: usize,
    /// Keys skipped because the destination already held them.
    pub already_present: usize,
    /// Rows written to the destination.
    pub inserted: u64,
    /// Batches written.
    pub batches: usize,
}

/// Result of [`Importer::import`](crate::Importer::import).
///
/// Entities are listed in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Per-type counts, in creation order.
    pub entities: Vec<EntityReport>,
}

impl ImportReport {
    pub(crate) fn build(
        order: &TopoOrder,
        selected: &Selection,
        expanded: &Selection,
        remaining: &Selection,
        replication: &ReplicationReport,
    ) -> Self {
        let entities = order
            .iter()
            .map(|entity| {
                let copy = replication.get(entity);
                EntityReport {
                    entity: entity.label().to_string(),
                    selected: selected.len_of(entity),
                    expanded: expanded.len_of(entity),
                    already_present: expanded.len_of(entity) - remaining.len_of(entity),
                    inserted: copy.map_or(0, |c| c.inserted),
                    batches: copy.map_or(0, |c| c.batches),
                }
            })
            .collect();
        Self { entities }
    }

    /// Counts for `entity`, if it took part in the import.
    pub fn get(&self, entity: &EntityType) -> Option<&EntityReport> {
        self.entities.iter().find(|e| e.entity == entity.label())
    }

    /// Rows written across every entity type.
    pub fn total_inserted(&self) -> u64 {
        self.entities.iter().map(|e| e.inserted).sum()
    }

    /// Keys skipped across every entity type.
    pub fn total_already_present(&self) -> usize {
        self.entities.iter().map(|e| e.already_present).sum()
    }
}
