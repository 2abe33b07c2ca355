//! Model and key selection.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::SliceRandom;

use datasample_core::{Connection, EntityType, Label, Registry, Result, Selection, ValidationError};

/// Resolve `labels` against `registry`, minus `excludes`.
///
/// Labels are `app_label` or `app_label.ModelName`. With no labels every
/// registered model is taken. Excludes drop a whole app or a single model.
/// The result keeps registration order within an app and label order across
/// labels, without duplicates.
pub fn collect_models<L, E>(
    registry: &Registry,
    labels: &[L],
    excludes: &[E],
) -> std::result::Result<Vec<EntityType>, ValidationError>
where
    L: AsRef<str>,
    E: AsRef<str>,
{
    let mut excluded_apps: BTreeSet<String> = BTreeSet::new();
    let mut excluded_models: BTreeSet<EntityType> = BTreeSet::new();
    for exclude in excludes {
        match Label::parse(exclude.as_ref())? {
            Label::App(app) => {
                registry.app_models(&app)?;
                excluded_apps.insert(app);
            }
            Label::Model(entity) => {
                registry.get_model(entity.label())?;
                excluded_models.insert(entity);
            }
        }
    }

    let mut candidates: Vec<EntityType> = Vec::new();
    if labels.is_empty() {
        candidates.extend(registry.models().cloned());
    } else {
        for label in labels {
            match Label::parse(label.as_ref())? {
                Label::App(app) => candidates.extend(registry.app_models(&app)?.iter().cloned()),
                Label::Model(entity) => {
                    candidates.push(registry.get_model(entity.label())?.entity().clone());
                }
            }
        }
    }

    let mut seen: BTreeSet<EntityType> = BTreeSet::new();
    let models: Vec<EntityType> = candidates
        .into_iter()
        .filter(|entity| !excluded_apps.contains(entity.app_label()))
        .filter(|entity| !excluded_models.contains(entity))
        .filter(|entity| seen.insert(entity.clone()))
        .collect();

    tracing::debug!(
        models = ?models.iter().map(EntityType::label).collect::<Vec<_>>(),
        "Collected models"
    );
    Ok(models)
}

/// Pick at most `limit` keys of every model from `source`.
///
/// Without `random` the lowest keys are taken; with it the keys are shuffled
/// with `rng` first. `None` takes every key. Every model gets an entry, even
/// when the store holds no record of it.
#[tracing::instrument(level = "debug", skip(source, models, rng))]
pub fn collect_keys<C, R>(
    source: &C,
    models: &[EntityType],
    limit: Option<usize>,
    random: bool,
    rng: &mut R,
) -> Result<Selection>
where
    C: Connection + ?Sized,
    R: Rng + ?Sized,
{
    let mut selection = Selection::new();
    for model in models {
        let mut keys: Vec<_> = source.read_keys(model)?.into_iter().collect();
        if random {
            keys.shuffle(rng);
        }
        if let Some(limit) = limit {
            keys.truncate(limit);
        }
        tracing::debug!(model = %model, keys = keys.len(), "Sampled keys");
        selection.extend(model.clone(), keys);
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use datasample_core::{EntitySchema, Key, Record, ValidationErrorKind};
    use datasample_memory::MemoryConnection;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const NONE: &[&str] = &[];

    fn registry() -> Registry {
        Registry::new()
            .with(EntitySchema::new("auth.User"))
            .with(EntitySchema::new("auth.Group"))
            .with(EntitySchema::new("shop.Product"))
            .with(EntitySchema::new("shop.Order"))
            .with(EntitySchema::new("blog.Post"))
    }

    fn labels(models: &[EntityType]) -> Vec<&str> {
        models.iter().map(EntityType::label).collect()
    }

    #[test]
    fn test_no_labels_takes_everything() {
        let models = collect_models(&registry(), NONE, NONE).unwrap();
        assert_eq!(
            labels(&models),
            vec!["auth.User", "auth.Group", "shop.Product", "shop.Order", "blog.Post"]
        );
    }

    #[test]
    fn test_app_and_model_labels() {
        let models = collect_models(&registry(), &["shop", "auth.Group", "shop.Order"], NONE).unwrap();
        assert_eq!(labels(&models), vec!["shop.Product", "shop.Order", "auth.Group"]);
    }

    #[test]
    fn test_excludes_apps_and_models() {
        let models = collect_models(&registry(), NONE, &["auth", "shop.Order"]).unwrap();
        assert_eq!(labels(&models), vec!["shop.Product", "blog.Post"]);

        let models = collect_models(&registry(), &["auth.User"], &["auth"]).unwrap();
        assert!(models.is_empty());
    }

    #[test]
    fn test_unknown_labels_fail() {
        let err = collect_models(&registry(), &["nope"], NONE).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::UnknownApp);

        let err = collect_models(&registry(), &["shop.Nope"], NONE).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::UnknownModel);

        let err = collect_models(&registry(), NONE, &["shop.Nope"]).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::UnknownModel);

        let err = collect_models(&registry(), &["shop.Order.id"], NONE).unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::Label);
    }

    fn source() -> MemoryConnection {
        let mut source = MemoryConnection::new("source");
        source.seed("shop.Order", (1..=10_i64).map(Record::new));
        source
    }

    #[test]
    fn test_limit_takes_lowest_keys() {
        let models = vec![EntityType::new("shop.Order"), EntityType::new("shop.Product")];
        let mut rng = StdRng::seed_from_u64(1);
        let selection = collect_keys(&source(), &models, Some(3), false, &mut rng).unwrap();

        let keys: Vec<&Key> = selection.keys(&models[0]).unwrap().iter().collect();
        assert_eq!(keys, vec![&Key::Int(1), &Key::Int(2), &Key::Int(3)]);
        assert_eq!(selection.keys(&models[1]).map(BTreeSet::len), Some(0));
    }

    #[test]
    fn test_no_limit_takes_all() {
        let models = vec![EntityType::new("shop.Order")];
        let mut rng = StdRng::seed_from_u64(1);
        let selection = collect_keys(&source(), &models, None, true, &mut rng).unwrap();
        assert_eq!(selection.len_of(&models[0]), 10);
    }

    #[test]
    fn test_random_sample_is_seeded_subset() {
        let models = vec![EntityType::new("shop.Order")];
        let source = source();

        let first = collect_keys(&source, &models, Some(4), true, &mut StdRng::seed_from_u64(42)).unwrap();
        let second = collect_keys(&source, &models, Some(4), true, &mut StdRng::seed_from_u64(42)).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len_of(&models[0]), 4);
        assert!(
            first
                .keys(&models[0])
                .unwrap()
                .iter()
                .all(|key| matches!(key, Key::Int(1..=10)))
        );
    }
}
