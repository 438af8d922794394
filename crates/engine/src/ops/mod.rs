use std::sync::Arc;

use crate::{
    CatalogData, EngineError, ResultEngine, Trip, rates::RateSource, repository::Repository,
    store::KvStore,
};

mod backup;
mod catalog;
mod expenses;
mod shortlist;
mod trips;

pub use expenses::DisplayExpense;
pub use shortlist::LocationSample;

/// The expense-tracking core. All operations go through here.
///
/// Construction wires in the three collaborators: a [`KvStore`] for
/// persistence, a [`RateSource`] for the daily exchange table and the static
/// [`CatalogData`] reference tables.
pub struct Engine {
    repository: Repository,
    rates: Arc<dyn RateSource>,
    catalog: CatalogData,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Lists every key currently present in the underlying store.
    pub async fn stored_keys(&self) -> ResultEngine<Vec<String>> {
        Ok(self.repository.store().keys().await?)
    }

    /// Loads the trip collection together with the active trip's index.
    ///
    /// Shared by every operation that mutates the active trip in place and
    /// then writes the whole collection back.
    async fn current_trip_slot(&self) -> ResultEngine<(Vec<Trip>, usize)> {
        let id = self
            .repository
            .active_trip_id()
            .await?
            .ok_or_else(|| EngineError::NotFound("current trip".to_string()))?;
        let trips = self.repository.trips().await?;
        let index = trips
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| EngineError::NotFound("current trip".to_string()))?;
        Ok((trips, index))
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn normalize_currency_code(value: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(
            "currency code must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    store: Option<Arc<dyn KvStore>>,
    rates: Option<Arc<dyn RateSource>>,
    catalog: Option<CatalogData>,
}

impl EngineBuilder {
    /// Pass the required persistence backend
    pub fn store(mut self, store: Arc<dyn KvStore>) -> EngineBuilder {
        self.store = Some(store);
        self
    }

    /// Pass the required exchange-rate source
    pub fn rate_source(mut self, rates: Arc<dyn RateSource>) -> EngineBuilder {
        self.rates = Some(rates);
        self
    }

    /// Override the stock reference tables
    pub fn catalog(mut self, catalog: CatalogData) -> EngineBuilder {
        self.catalog = Some(catalog);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let store = self
            .store
            .ok_or_else(|| EngineError::Validation("engine requires a store".to_string()))?;
        let rates = self
            .rates
            .ok_or_else(|| EngineError::Validation("engine requires a rate source".to_string()))?;
        Ok(Engine {
            repository: Repository::new(store),
            rates,
            catalog: self.catalog.unwrap_or_default(),
        })
    }
}
