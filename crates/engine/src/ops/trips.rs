use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, SlimCurrency, Trip};

use super::{Engine, normalize_required_name};

impl Engine {
    /// Resolves the active trip, if any.
    ///
    /// Only the trip's id is persisted; the record comes from the trip
    /// collection. An id that no longer resolves (possible with imported or
    /// hand-edited data) reads as "no current trip".
    pub async fn current_trip(&self) -> ResultEngine<Option<Trip>> {
        let Some(id) = self.repository.active_trip_id().await? else {
            return Ok(None);
        };
        let trips = self.repository.trips().await?;
        let found = trips.into_iter().find(|t| t.id == id);
        if found.is_none() {
            tracing::debug!(%id, "active trip id does not resolve to a stored trip");
        }
        Ok(found)
    }

    /// Every stored trip, in insertion order.
    pub async fn all_trips(&self) -> ResultEngine<Vec<Trip>> {
        self.repository.trips().await
    }

    /// Creates a trip, or updates the one `trip_id` names.
    ///
    /// Updating replaces name, base/local choices and short-list while
    /// keeping the trip's expenses and `created_at`. An id that matches
    /// nothing falls through to creation with a fresh id. Either way the
    /// result becomes the active trip; the collection is written before the
    /// active pointer so a failure between the two still leaves a coherent
    /// store.
    pub async fn create_or_update_trip(
        &self,
        trip_id: Option<Uuid>,
        name: &str,
        base_currency: SlimCurrency,
        local_currency: SlimCurrency,
        currencies: Vec<SlimCurrency>,
        now: DateTime<Utc>,
    ) -> ResultEngine<Trip> {
        let name = normalize_required_name(name, "trip")?;

        let mut trips = self.repository.trips().await?;
        let trip = match trip_id.and_then(|id| trips.iter_mut().find(|t| t.id == id)) {
            Some(existing) => {
                existing.set_profile(name, base_currency, local_currency, currencies);
                existing.clone()
            }
            None => {
                let trip = Trip::new(name, base_currency, local_currency, currencies, now);
                trips.push(trip.clone());
                trip
            }
        };

        self.repository.save_trips(&trips).await?;
        self.repository.save_active_trip_id(trip.id).await?;
        Ok(trip)
    }

    /// Makes `trip_id` the active trip.
    pub async fn switch_trip(&self, trip_id: Uuid) -> ResultEngine<Trip> {
        let trips = self.repository.trips().await?;
        let trip = trips
            .into_iter()
            .find(|t| t.id == trip_id)
            .ok_or_else(|| EngineError::NotFound(format!("trip {trip_id}")))?;
        self.repository.save_active_trip_id(trip.id).await?;
        Ok(trip)
    }

    /// Deletes the given trips. Unknown ids are ignored.
    ///
    /// The active pointer is cleared when it pointed at a deleted trip or
    /// when no trips remain; picking a successor is the caller's business.
    pub async fn delete_trips(&self, trip_ids: &[Uuid]) -> ResultEngine<()> {
        let mut trips = self.repository.trips().await?;
        trips.retain(|t| !trip_ids.contains(&t.id));
        self.repository.save_trips(&trips).await?;

        let active = self.repository.active_trip_id().await?;
        let clear = trips.is_empty() || active.is_some_and(|id| trip_ids.contains(&id));
        if clear {
            self.repository.clear_active_trip().await?;
        }
        Ok(())
    }

    /// A blank trip scaffold for "new trip" forms: fresh id, empty name, the
    /// catalog as short-list and its first entry as both base and local
    /// currency. Nothing is persisted.
    pub async fn new_trip_template(&self, now: DateTime<Utc>) -> ResultEngine<Trip> {
        let currencies: Vec<SlimCurrency> = self
            .list_currencies()
            .await?
            .iter()
            .map(crate::Currency::slim)
            .collect();
        let first = currencies
            .first()
            .cloned()
            .ok_or_else(|| EngineError::Validation("currency catalog is empty".to_string()))?;
        Ok(Trip::new(
            String::new(),
            first.clone(),
            first,
            currencies,
            now,
        ))
    }
}
