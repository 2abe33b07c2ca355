//! Dependency ordering of entity types.
//!
//! Entity types form a directed graph whose edges are singular references
//! (`Hero -> Team` when a hero stores a team key). [`resolve`] returns a
//! topological order in which every referenced type precedes the types that
//! reference it, and fails with the offending path when the graph has a cycle.
//!
//! The walk is an explicit depth-first search over a stack of frames, so deep
//! reference chains cannot overflow the call stack.

use std::collections::HashSet;
use std::vec;

use datasample_core::{CircularRelationshipError, EntityType, RelationMetadata};

/// Entity types in creation order: referenced types first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopoOrder(Vec<EntityType>);

impl TopoOrder {
    /// Entity types in creation order.
    pub fn iter(&self) -> std::slice::Iter<'_, EntityType> {
        self.0.iter()
    }

    /// Entity types in creation order, as a slice.
    pub fn as_slice(&self) -> &[EntityType] {
        &self.0
    }

    /// Position of `entity` in the order.
    pub fn position(&self, entity: &EntityType) -> Option<usize> {
        self.0.iter().position(|e| e == entity)
    }

    /// Whether `entity` is part of the order.
    pub fn contains(&self, entity: &EntityType) -> bool {
        self.0.contains(entity)
    }

    /// Number of entity types.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the order is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the underlying vector.
    pub fn into_vec(self) -> Vec<EntityType> {
        self.0
    }
}

impl<'a> IntoIterator for &'a TopoOrder {
    type Item = &'a EntityType;
    type IntoIter = std::slice::Iter<'a, EntityType>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One entity type on the current DFS path and the references still to visit.
struct Frame {
    entity: EntityType,
    pending: vec::IntoIter<EntityType>,
}

impl Frame {
    fn new<M: RelationMetadata + ?Sized>(metadata: &M, entity: EntityType) -> Self {
        let pending: Vec<EntityType> = metadata
            .singular_references(&entity)
            .into_iter()
            .map(|r| r.target)
            .filter(|target| *target != entity)
            .collect();
        Self {
            entity,
            pending: pending.into_iter(),
        }
    }
}

/// Order `entities` and everything they transitively reference.
///
/// Types are appended in post-order, so for every reference `A -> B`
/// (`A != B`) `B` comes before `A`. Types reachable from several roots appear
/// once. The relative order of unrelated types follows the iteration order of
/// `entities` and is not otherwise meaningful.
///
/// Fails as soon as a reference leads back onto the current path; the error
/// names the cycle from the first occurrence of the repeated type, e.g.
/// `[A, B, C, A]`.
#[tracing::instrument(level = "debug", skip(metadata, entities))]
pub fn resolve<'a, M, I>(metadata: &M, entities: I) -> Result<TopoOrder, CircularRelationshipError>
where
    M: RelationMetadata + ?Sized,
    I: IntoIterator<Item = &'a EntityType>,
{
    let mut order: Vec<EntityType> = Vec::new();
    let mut finalized: HashSet<EntityType> = HashSet::new();

    for root in entities {
        if finalized.contains(root) {
            continue;
        }

        let mut stack = vec![Frame::new(metadata, root.clone())];
        let mut on_path: HashSet<EntityType> = HashSet::from([root.clone()]);

        loop {
            let next = match stack.last_mut() {
                Some(frame) => frame.pending.next(),
                None => break,
            };

            match next {
                Some(target) => {
                    if finalized.contains(&target) {
                        continue;
                    }
                    if on_path.contains(&target) {
                        return Err(cycle_error(&stack, target));
                    }
                    on_path.insert(target.clone());
                    stack.push(Frame::new(metadata, target));
                }
                None => {
                    // Every reference of the top frame is finalized.
                    if let Some(frame) = stack.pop() {
                        on_path.remove(&frame.entity);
                        if finalized.insert(frame.entity.clone()) {
                            order.push(frame.entity);
                        }
                    }
                }
            }
        }
    }

    tracing::debug!(
        order = ?order.iter().map(EntityType::label).collect::<Vec<_>>(),
        "Resolved entity creation order"
    );

    Ok(TopoOrder(order))
}

fn cycle_error(stack: &[Frame], repeated: EntityType) -> CircularRelationshipError {
    let start = stack
        .iter()
        .position(|frame| frame.entity == repeated)
        .unwrap_or(0);
    let mut path: Vec<EntityType> = stack[start..]
        .iter()
        .map(|frame| frame.entity.clone())
        .collect();
    path.push(repeated);

    tracing::warn!(
        cycle = %path.iter().map(EntityType::label).collect::<Vec<_>>().join(" -> "),
        "Circular relationship detected"
    );

    CircularRelationshipError { path }
}
