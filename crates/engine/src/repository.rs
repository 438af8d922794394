//! Typed access to the persisted keys.
//!
//! This is the only module that knows key names and value encodings; the
//! operations above it deal purely in domain types. Every value is a JSON
//! document. A value that fails to decode surfaces as
//! [`EngineError::Malformed`] naming the offending key, never a panic.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine, Trip, store::KvStore};

/// Trip collection: the single durable source of truth for trips.
const TRIPS_KEY: &str = "trips";
/// Id of the active trip. The trip itself is resolved lazily against the
/// collection, so the two can never drift apart.
const ACTIVE_TRIP_KEY: &str = "active_trip";
/// Currency catalog with merged exchange rates.
const CURRENCIES_KEY: &str = "currencies";
/// Timestamp of the last successful rate fetch.
const RATES_REFRESHED_AT_KEY: &str = "rates_refreshed_at";

pub(crate) struct Repository {
    store: Arc<dyn KvStore>,
}

impl Repository {
    pub(crate) fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> ResultEngine<Option<T>> {
        match self.store.get(key).await? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|err| EngineError::Malformed(format!("{key}: {err}"))),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> ResultEngine<()> {
        let raw = serde_json::to_string(value)
            .map_err(|err| EngineError::Malformed(format!("{key}: {err}")))?;
        self.store.set(key, &raw).await?;
        Ok(())
    }

    pub(crate) async fn trips(&self) -> ResultEngine<Vec<Trip>> {
        Ok(self.read(TRIPS_KEY).await?.unwrap_or_default())
    }

    pub(crate) async fn save_trips(&self, trips: &[Trip]) -> ResultEngine<()> {
        self.write(TRIPS_KEY, &trips).await
    }

    pub(crate) async fn active_trip_id(&self) -> ResultEngine<Option<Uuid>> {
        self.read(ACTIVE_TRIP_KEY).await
    }

    pub(crate) async fn save_active_trip_id(&self, id: Uuid) -> ResultEngine<()> {
        self.write(ACTIVE_TRIP_KEY, &id).await
    }

    pub(crate) async fn clear_active_trip(&self) -> ResultEngine<()> {
        self.store.remove(ACTIVE_TRIP_KEY).await?;
        Ok(())
    }

    pub(crate) async fn currencies(&self) -> ResultEngine<Option<Vec<Currency>>> {
        self.read(CURRENCIES_KEY).await
    }

    pub(crate) async fn save_currencies(&self, currencies: &[Currency]) -> ResultEngine<()> {
        self.write(CURRENCIES_KEY, &currencies).await
    }

    pub(crate) async fn rates_refreshed_at(&self) -> ResultEngine<Option<DateTime<Utc>>> {
        self.read(RATES_REFRESHED_AT_KEY).await
    }

    pub(crate) async fn save_rates_refreshed_at(&self, at: DateTime<Utc>) -> ResultEngine<()> {
        self.write(RATES_REFRESHED_AT_KEY, &at).await
    }
}
