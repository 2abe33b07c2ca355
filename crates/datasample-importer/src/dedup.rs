//! Removal of keys the destination already holds.

use datasample_core::{Connection, Result, Selection};

/// Drop from `selection` every key that already has a record at `destination`.
///
/// Pure narrowing: keys are only removed, and entity types with no keys issue
/// no query.
#[tracing::instrument(level = "debug", skip_all)]
pub fn dedup<C>(destination: &C, mut selection: Selection) -> Result<Selection>
where
    C: Connection + ?Sized,
{
    for (entity, keys) in selection.iter_mut() {
        if keys.is_empty() {
            continue;
        }
        let existing = destination.existing_keys(entity, keys)?;
        if existing.is_empty() {
            continue;
        }
        keys.retain(|key| !existing.contains(key));
        tracing::debug!(
            entity = %entity,
            existing = existing.len(),
            remaining = keys.len(),
            "Skipping records already present at destination"
        );
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasample_core::{Key, Record};
    use datasample_memory::MemoryConnection;

    #[test]
    fn test_empty_destination_keeps_everything() {
        let destination = MemoryConnection::new("dest");
        let selection: Selection = [("a.A", 1_i64), ("a.A", 2), ("a.B", 3)].into_iter().collect();

        let filtered = dedup(&destination, selection.clone()).unwrap();
        assert_eq!(filtered, selection);
    }

    #[test]
    fn test_existing_keys_are_removed() {
        let mut destination = MemoryConnection::new("dest");
        destination.seed("a.A", [Record::new(2_i64)]);
        destination.seed("a.B", [Record::new(3_i64), Record::new(99_i64)]);

        let selection: Selection = [("a.A", 1_i64), ("a.A", 2), ("a.B", 3)].into_iter().collect();
        let filtered = dedup(&destination, selection.clone()).unwrap();

        assert!(filtered.is_subset(&selection));
        assert_eq!(
            filtered.keys(&"a.A".into()).unwrap().iter().collect::<Vec<_>>(),
            vec![&Key::Int(1)]
        );
        assert_eq!(filtered.len_of(&"a.B".into()), 0);
        assert!(!filtered.contains(&"a.B".into(), &Key::Int(99)));
    }

    #[test]
    fn test_absent_and_empty_types_are_untouched() {
        let mut destination = MemoryConnection::new("dest");
        destination.seed("a.C", [Record::new(1_i64)]);

        let mut selection = Selection::new();
        selection.touch("a.A");
        let filtered = dedup(&destination, selection).unwrap();

        assert_eq!(filtered.entity_types().count(), 1);
        assert!(filtered.keys(&"a.C".into()).is_none());
        assert_eq!(destination.stats().existence_checks, 0);
    }
}
