use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use engine::{
    Engine, EngineError, FileStore, KvStore, MemoryStore, MoneyMinor, RateSource, RateSourceError,
    RateTable, SlimCurrency,
};

struct FixedRates {
    rates: RateTable,
    fail: bool,
    calls: AtomicUsize,
}

impl FixedRates {
    fn new(rates: &[(&str, f64)]) -> Self {
        Self {
            rates: rates.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RateSource for FixedRates {
    async fn fetch_rates(&self) -> Result<RateTable, RateSourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(RateSourceError::MissingRates);
        }
        Ok(self.rates.clone())
    }
}

async fn engine_with_store(store: Arc<dyn KvStore>) -> Engine {
    Engine::builder()
        .store(store)
        .rate_source(Arc::new(FixedRates::new(&[("USD", 1.0), ("EUR", 0.9)])))
        .build()
        .await
        .unwrap()
}

async fn test_engine() -> Engine {
    engine_with_store(Arc::new(MemoryStore::new())).await
}

fn slim(code: &str, symbol: &str) -> SlimCurrency {
    SlimCurrency::new(code, symbol)
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, d, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn create_trip_persists_and_becomes_current() {
    let engine = test_engine().await;

    let trip = engine
        .create_or_update_trip(
            None,
            "Rome",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![slim("USD", "$"), slim("EUR", "€")],
            day(1),
        )
        .await
        .unwrap();

    let current = engine.current_trip().await.unwrap().unwrap();
    assert_eq!(current, trip);
    assert_eq!(engine.all_trips().await.unwrap(), vec![trip]);
}

#[tokio::test]
async fn base_and_local_always_join_the_short_list() {
    let engine = test_engine().await;

    let trip = engine
        .create_or_update_trip(
            None,
            "Prague",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![slim("CZK", "Kč")],
            day(1),
        )
        .await
        .unwrap();

    let codes: Vec<&str> = trip.currencies.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, ["CZK", "USD", "EUR"]);
}

#[tokio::test]
async fn blank_trip_name_is_rejected() {
    let engine = test_engine().await;

    let err = engine
        .create_or_update_trip(
            None,
            "   ",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            day(1),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert!(engine.all_trips().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_keeps_expenses_and_creation_time() {
    let engine = test_engine().await;
    let trip = engine
        .create_or_update_trip(
            None,
            "Rome",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            day(1),
        )
        .await
        .unwrap();
    engine
        .add_expense(MoneyMinor::new(1200), "Lunch", "Groceries", "EUR", day(2))
        .await
        .unwrap();

    let updated = engine
        .create_or_update_trip(
            Some(trip.id),
            "Roman Holiday",
            slim("ILS", "₪"),
            slim("EUR", "€"),
            vec![slim("EUR", "€")],
            day(3),
        )
        .await
        .unwrap();

    assert_eq!(updated.id, trip.id);
    assert_eq!(updated.created_at, trip.created_at);
    assert_eq!(updated.name, "Roman Holiday");
    assert_eq!(updated.expenses.len(), 1);
    assert_eq!(engine.current_trip().await.unwrap().unwrap(), updated);
}

#[tokio::test]
async fn updating_an_unknown_id_creates_a_new_trip() {
    let engine = test_engine().await;
    engine
        .create_or_update_trip(
            None,
            "Rome",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            day(1),
        )
        .await
        .unwrap();

    let ghost_id = Uuid::new_v4();
    let created = engine
        .create_or_update_trip(
            Some(ghost_id),
            "Oslo",
            slim("USD", "$"),
            slim("NOK", "kr"),
            vec![],
            day(2),
        )
        .await
        .unwrap();

    assert_ne!(created.id, ghost_id);
    assert_eq!(engine.all_trips().await.unwrap().len(), 2);
    assert_eq!(engine.current_trip().await.unwrap().unwrap(), created);
}

#[tokio::test]
async fn switch_trip_changes_current() {
    let engine = test_engine().await;
    let first = engine
        .create_or_update_trip(
            None,
            "Rome",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            day(1),
        )
        .await
        .unwrap();
    engine
        .create_or_update_trip(
            None,
            "Tokyo",
            slim("USD", "$"),
            slim("JPY", "¥"),
            vec![],
            day(2),
        )
        .await
        .unwrap();

    let switched = engine.switch_trip(first.id).await.unwrap();
    assert_eq!(switched.id, first.id);
    assert_eq!(engine.current_trip().await.unwrap().unwrap().id, first.id);

    let err = engine.switch_trip(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn deleting_the_active_trip_clears_current() {
    let engine = test_engine().await;
    let kept = engine
        .create_or_update_trip(
            None,
            "Rome",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            day(1),
        )
        .await
        .unwrap();
    let active = engine
        .create_or_update_trip(
            None,
            "Tokyo",
            slim("USD", "$"),
            slim("JPY", "¥"),
            vec![],
            day(2),
        )
        .await
        .unwrap();

    engine.delete_trips(&[active.id]).await.unwrap();

    assert_eq!(engine.current_trip().await.unwrap(), None);
    assert_eq!(engine.all_trips().await.unwrap(), vec![kept]);
}

#[tokio::test]
async fn deleting_every_trip_empties_the_store() {
    let engine = test_engine().await;
    let a = engine
        .create_or_update_trip(
            None,
            "Rome",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            day(1),
        )
        .await
        .unwrap();
    let b = engine
        .create_or_update_trip(
            None,
            "Tokyo",
            slim("USD", "$"),
            slim("JPY", "¥"),
            vec![],
            day(2),
        )
        .await
        .unwrap();

    engine.delete_trips(&[a.id, b.id]).await.unwrap();

    assert!(engine.all_trips().await.unwrap().is_empty());
    assert_eq!(engine.current_trip().await.unwrap(), None);
}

#[tokio::test]
async fn dangling_active_pointer_reads_as_no_trip() {
    let store = Arc::new(MemoryStore::new());
    let engine = engine_with_store(store.clone()).await;

    store
        .set("active_trip", &format!("\"{}\"", Uuid::new_v4()))
        .await
        .unwrap();

    assert_eq!(engine.current_trip().await.unwrap(), None);
}

#[tokio::test]
async fn template_scaffolds_from_the_catalog() {
    let engine = test_engine().await;

    let template = engine.new_trip_template(day(1)).await.unwrap();

    assert!(template.name.is_empty());
    assert!(template.expenses.is_empty());
    assert_eq!(template.base_currency, slim("USD", "$"));
    assert_eq!(template.local_currency, slim("USD", "$"));
    assert_eq!(template.currencies.len(), 8);
    // A template is a scaffold, not a stored trip.
    assert!(engine.all_trips().await.unwrap().is_empty());
}

#[tokio::test]
async fn export_import_round_trips_between_engines() {
    let source = test_engine().await;
    source
        .create_or_update_trip(
            None,
            "Rome",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            day(1),
        )
        .await
        .unwrap();
    source
        .create_or_update_trip(
            None,
            "Tokyo",
            slim("USD", "$"),
            slim("JPY", "¥"),
            vec![],
            day(2),
        )
        .await
        .unwrap();
    let snapshot = source.export_trips().await.unwrap();

    let target = test_engine().await;
    let merged = target.import_trips(&snapshot).await.unwrap();

    assert_eq!(merged, source.all_trips().await.unwrap());
    assert_eq!(target.all_trips().await.unwrap(), merged);
    // Importing never touches the active-trip pointer.
    assert_eq!(target.current_trip().await.unwrap(), None);
}

#[tokio::test]
async fn import_keeps_local_trips_on_id_collisions() {
    let engine = test_engine().await;
    let trip = engine
        .create_or_update_trip(
            None,
            "Rome",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            day(1),
        )
        .await
        .unwrap();
    let snapshot = engine.export_trips().await.unwrap();

    engine
        .create_or_update_trip(
            Some(trip.id),
            "Renamed",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            day(2),
        )
        .await
        .unwrap();

    let merged = engine.import_trips(&snapshot).await.unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].name, "Renamed");

    // Importing the same snapshot twice adds nothing new.
    let merged = engine.import_trips(&snapshot).await.unwrap();
    assert_eq!(merged.len(), 1);
}

#[tokio::test]
async fn import_accepts_a_bare_trip_array() {
    let source = test_engine().await;
    source
        .create_or_update_trip(
            None,
            "Rome",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            day(1),
        )
        .await
        .unwrap();
    let bare = serde_json::to_string(&source.all_trips().await.unwrap()).unwrap();

    let target = test_engine().await;
    let merged = target.import_trips(&bare).await.unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].name, "Rome");
}

#[tokio::test]
async fn import_rejects_garbage_and_unknown_versions() {
    let engine = test_engine().await;

    let err = engine.import_trips("not json at all").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .import_trips("{\"version\":9,\"trips\":[]}")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(err.to_string().contains("version"));

    assert!(engine.all_trips().await.unwrap().is_empty());
}

#[tokio::test]
async fn file_store_persists_across_engines() {
    let dir = TempDir::new().unwrap();

    let engine = engine_with_store(Arc::new(FileStore::new(dir.path()))).await;
    let trip = engine
        .create_or_update_trip(
            None,
            "Rome",
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            day(1),
        )
        .await
        .unwrap();

    let reopened = engine_with_store(Arc::new(FileStore::new(dir.path()))).await;
    assert_eq!(reopened.all_trips().await.unwrap(), vec![trip.clone()]);
    assert_eq!(reopened.current_trip().await.unwrap(), Some(trip));
}

#[tokio::test]
async fn malformed_stored_trips_surface_as_a_decode_error() {
    let store = Arc::new(MemoryStore::new());
    store.set("trips", "{definitely not json").await.unwrap();
    let engine = engine_with_store(store).await;

    let err = engine.all_trips().await.unwrap_err();
    assert!(matches!(err, EngineError::Malformed(_)));
    assert!(err.to_string().contains("trips"));
}
