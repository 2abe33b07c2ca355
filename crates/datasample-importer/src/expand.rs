//! Transitive expansion of a selection along singular references.

use std::collections::BTreeSet;

use datasample_core::{
    Connection, EntityType, Key, RelationMetadata, Result, Selection, StoreError, StoreErrorKind,
    Value,
};

use crate::resolve::TopoOrder;

/// Close `selection` under singular references, reading from `source`.
///
/// Entity types are visited in reverse creation order, so a referencing type
/// has already contributed its keys to a referenced type before that type's
/// own references are read. Each type issues one projected read covering all
/// of its keys at that point. One pass is enough because `order` already holds
/// every reachable type.
///
/// NULL references contribute nothing. Types that end up with no keys are left
/// out of the selection rather than added as empty entries.
#[tracing::instrument(level = "debug", skip_all)]
pub fn expand<C, M>(
    source: &C,
    metadata: &M,
    order: &TopoOrder,
    mut selection: Selection,
) -> Result<Selection>
where
    C: Connection + ?Sized,
    M: RelationMetadata + ?Sized,
{
    for entity in order.iter().rev() {
        let references = metadata.singular_references(entity);
        if references.is_empty() {
            continue;
        }
        let keys: BTreeSet<Key> = match selection.keys(entity) {
            Some(keys) if !keys.is_empty() => keys.clone(),
            _ => continue,
        };

        let fields: Vec<&str> = references.iter().map(|r| r.attribute.as_str()).collect();
        let rows = source.read_projection(entity, &keys, &fields)?;

        let before = selection.total_keys();
        for row in &rows {
            for reference in &references {
                let Some(value) = row.get(&reference.attribute) else {
                    continue;
                };
                if let Some(key) = referenced_key(entity, &reference.attribute, value)? {
                    selection.insert(reference.target.clone(), key);
                }
            }
        }

        tracing::debug!(
            entity = %entity,
            rows = rows.len(),
            added = selection.total_keys() - before,
            "Collected related keys"
        );
    }

    Ok(selection)
}

fn referenced_key(entity: &EntityType, attribute: &str, value: &Value) -> Result<Option<Key>> {
    if value.is_null() {
        return Ok(None);
    }
    match value.to_key() {
        Some(key) => Ok(Some(key)),
        None => Err(StoreError::new(
            StoreErrorKind::Decode,
            format!(
                "reference attribute {} holds a {} value, which cannot be a key",
                attribute,
                value.type_name()
            ),
        )
        .entity(entity)
        .into()),
    }
}
