//! Adapter conformance suite.
//!
//! Every store adapter must pass these sequences unmodified. Each check
//! starts by wiping the store, so point it at a scratch collection/table.

use heroes_core::{Hero, HeroPatch, RecordId};

use super::{Crud, CrudError, Filter, Page};

/// An id no adapter ever generates.
fn missing_id() -> RecordId {
    RecordId::from(0)
}

/// A caller-chosen id every adapter can store (Postgres keys are integers).
fn fresh_id() -> RecordId {
    RecordId::from(900_001)
}

fn hero(name: &str, power: &str) -> Hero {
    Hero::new(name, power).expect("valid hero")
}

pub(crate) async fn run_all<S: Crud<Hero>>(store: &S) {
    create_then_read_returns_same_fields(store).await;
    update_changes_only_supplied_fields(store).await;
    mutations_on_missing_id_affect_nothing(store).await;
    page_bounds_results(store).await;
    contains_filter_matches_substrings(store).await;
    equality_filter_is_exact(store).await;
    delete_removes_exactly_one(store).await;
    upsert_updates_existing_record(store).await;
    upsert_creates_missing_record(store).await;
    empty_and_oversized_pages(store).await;
    empty_patch_reports_the_match(store).await;
    id_conditions_are_invalid_filters(store).await;
}

async fn reset<S: Crud<Hero>>(store: &S) {
    store.delete(None).await.expect("wipe store");
}

pub(crate) async fn create_then_read_returns_same_fields<S: Crud<Hero>>(store: &S) {
    reset(store).await;

    let created = store.create(hero("Flash", "Velocidade")).await.unwrap();
    assert!(!created.id.as_str().is_empty());
    assert_eq!(created.record, hero("Flash", "Velocidade"));

    let found = store
        .read(&Filter::all().eq("nome", "Flash"), Page::all())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, created.id);
    assert_eq!(found[0].record.power, "Velocidade");
}

pub(crate) async fn update_changes_only_supplied_fields<S: Crud<Hero>>(store: &S) {
    reset(store).await;

    let created = store.create(hero("Batman", "Dinheiro")).await.unwrap();
    let patch = HeroPatch {
        name: None,
        power: Some("Inteligencia".into()),
    };

    let outcome = store.update(&created.id, &patch, false).await.unwrap();
    assert!(outcome.is_exactly_one());
    assert_eq!(outcome.upserted_id, None);

    let found = store
        .read(&Filter::all().eq("nome", "Batman"), Page::all())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].record, hero("Batman", "Inteligencia"));
}

pub(crate) async fn mutations_on_missing_id_affect_nothing<S: Crud<Hero>>(store: &S) {
    reset(store).await;
    store.create(hero("Aquaman", "Falar com peixes")).await.unwrap();

    let patch = HeroPatch {
        name: Some("Ninguem".into()),
        power: None,
    };
    let updated = store.update(&missing_id(), &patch, false).await.unwrap();
    assert_eq!(updated.affected, 0);

    let deleted = store.delete(Some(&missing_id())).await.unwrap();
    assert_eq!(deleted.affected, 0);

    let all = store.read(&Filter::all(), Page::all()).await.unwrap();
    assert_eq!(all.len(), 1);
}

pub(crate) async fn page_bounds_results<S: Crud<Hero>>(store: &S) {
    reset(store).await;
    for i in 0..12 {
        store.create(hero(&format!("Heroi {i:02}"), "Nenhum")).await.unwrap();
    }

    let first = store.read(&Filter::all(), Page::new(0, 10)).await.unwrap();
    assert_eq!(first.len(), 10);

    let rest = store.read(&Filter::all(), Page::new(10, 10)).await.unwrap();
    assert_eq!(rest.len(), 2);

    let everything = store.read(&Filter::all(), Page::all()).await.unwrap();
    assert_eq!(everything.len(), 12);
}

pub(crate) async fn contains_filter_matches_substrings<S: Crud<Hero>>(store: &S) {
    reset(store).await;
    store.create(hero("Batman", "Dinheiro")).await.unwrap();
    store.create(hero("Batgirl", "Artes marciais")).await.unwrap();
    store.create(hero("Superman", "Forca")).await.unwrap();

    let bats = store
        .read(&Filter::all().contains("nome", "Bat"), Page::all())
        .await
        .unwrap();
    assert_eq!(bats.len(), 2);

    let lower = store
        .read(&Filter::all().contains("nome", "bat"), Page::all())
        .await
        .unwrap();
    assert!(lower.is_empty());

    // Pattern metacharacters are literal.
    let dots = store
        .read(&Filter::all().contains("nome", ".*"), Page::all())
        .await
        .unwrap();
    assert!(dots.is_empty());
}

pub(crate) async fn equality_filter_is_exact<S: Crud<Hero>>(store: &S) {
    reset(store).await;
    store.create(hero("Batman", "Dinheiro")).await.unwrap();

    let exact = store
        .read(&Filter::all().eq("nome", "Batman"), Page::all())
        .await
        .unwrap();
    assert_eq!(exact.len(), 1);

    let partial = store
        .read(&Filter::all().eq("nome", "Bat"), Page::all())
        .await
        .unwrap();
    assert!(partial.is_empty());
}

pub(crate) async fn delete_removes_exactly_one<S: Crud<Hero>>(store: &S) {
    reset(store).await;
    let keep = store.create(hero("Lanterna Verde", "Anel")).await.unwrap();
    let gone = store.create(hero("Ciborgue", "Tecnologia")).await.unwrap();

    let outcome = store.delete(Some(&gone.id)).await.unwrap();
    assert!(outcome.is_exactly_one());

    let left = store.read(&Filter::all(), Page::all()).await.unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].id, keep.id);
}

pub(crate) async fn upsert_updates_existing_record<S: Crud<Hero>>(store: &S) {
    reset(store).await;
    let existing = store.create(hero("Robin", "Acrobacia")).await.unwrap();

    let patch = HeroPatch {
        name: Some("Robin".into()),
        power: Some("Bastao".into()),
    };
    let outcome = store.update(&existing.id, &patch, true).await.unwrap();
    assert!(outcome.is_exactly_one());
    assert_eq!(outcome.upserted_id, None);

    let all = store.read(&Filter::all(), Page::all()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].record.power, "Bastao");
}

pub(crate) async fn upsert_creates_missing_record<S: Crud<Hero>>(store: &S) {
    reset(store).await;
    let id = fresh_id();
    let patch = HeroPatch {
        name: Some("Mulher Maravilha".into()),
        power: Some("Laco".into()),
    };

    let outcome = store.update(&id, &patch, true).await.unwrap();
    assert!(outcome.is_exactly_one());
    assert_eq!(outcome.upserted_id, Some(id.clone()));

    let found = store
        .read(&Filter::all().eq("nome", "Mulher Maravilha"), Page::all())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, id);
    assert_eq!(found[0].record, hero("Mulher Maravilha", "Laco"));

    // Generated ids keep working after a caller-chosen one.
    let first = store.create(hero("Shazam", "Raio")).await.unwrap();
    let second = store.create(hero("Zatanna", "Magia")).await.unwrap();
    assert_ne!(first.id, id);
    assert_ne!(second.id, id);
    assert_ne!(first.id, second.id);
    assert_eq!(store.read(&Filter::all(), Page::all()).await.unwrap().len(), 3);
}

pub(crate) async fn empty_and_oversized_pages<S: Crud<Hero>>(store: &S) {
    reset(store).await;
    for name in ["Batman", "Flash", "Aquaman"] {
        store.create(hero(name, "Nenhum")).await.unwrap();
    }

    let none = store.read(&Filter::all(), Page::new(0, 0)).await.unwrap();
    assert!(none.is_empty());

    let past_end = store.read(&Filter::all(), Page::new(u64::MAX, 10)).await.unwrap();
    assert!(past_end.is_empty());

    let unbounded = store.read(&Filter::all(), Page::new(0, u64::MAX)).await.unwrap();
    assert_eq!(unbounded.len(), 3);
}

pub(crate) async fn empty_patch_reports_the_match<S: Crud<Hero>>(store: &S) {
    reset(store).await;
    let existing = store.create(hero("Arqueiro Verde", "Flechas")).await.unwrap();

    let outcome = store
        .update(&existing.id, &HeroPatch::default(), false)
        .await
        .unwrap();
    assert!(outcome.is_exactly_one());

    let missing = store
        .update(&missing_id(), &HeroPatch::default(), false)
        .await
        .unwrap();
    assert_eq!(missing.affected, 0);

    let all = store.read(&Filter::all(), Page::all()).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].record, hero("Arqueiro Verde", "Flechas"));
}

pub(crate) async fn id_conditions_are_invalid_filters<S: Crud<Hero>>(store: &S) {
    reset(store).await;
    let created = store.create(hero("Caçador de Marte", "Telepatia")).await.unwrap();

    for field in ["_id", "id"] {
        let result = store
            .read(&Filter::all().eq(field, created.id.as_str()), Page::all())
            .await;
        assert!(matches!(result, Err(CrudError::InvalidFilter(_))), "{field}");
    }
}
