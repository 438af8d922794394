use crate::{EngineError, ResultEngine, SlimCurrency};

use super::{Engine, normalize_currency_code};

/// A location sample is only trusted as "where the user is now" for this
/// long.
const MAX_SAMPLE_AGE_MINUTES: i64 = 60;

/// Output of the geolocation collaborator: a reverse-geocoded country name
/// (when resolution succeeded) and the sample's age.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationSample {
    pub country: Option<String>,
    pub age_minutes: i64,
}

impl Engine {
    /// Adds `country`'s currency to the active trip's short-list. Returns
    /// whether the list changed; a currency that is already listed is left
    /// alone.
    ///
    /// The symbol for a currency the catalog has never listed comes from the
    /// static symbol table, falling back to the raw code.
    pub async fn add_currency_for_country(&self, country: &str) -> ResultEngine<bool> {
        let code = self
            .catalog
            .currency_for_country(country)
            .map(ToString::to_string)
            .ok_or_else(|| EngineError::NotFound(format!("currency for {}", country.trim())))?;

        let (mut trips, index) = self.current_trip_slot().await?;
        let trip = &mut trips[index];
        if trip.has_currency(&code) {
            return Ok(false);
        }
        let symbol = self.lookup_symbol(&code);
        trip.currencies.push(SlimCurrency::new(&code, &symbol));

        self.repository.save_trips(&trips).await?;
        Ok(true)
    }

    /// Short-list addition driven by a geolocation sample.
    ///
    /// Acts only on a sample that carries a country and is at most an hour
    /// old; anything else (including a country the mapping table does not
    /// know) is skipped quietly, since location is a convenience input, not
    /// a user command.
    pub async fn add_currency_from_location(&self, sample: &LocationSample) -> ResultEngine<bool> {
        let Some(country) = sample.country.as_deref() else {
            tracing::debug!("location sample without a country, skipping");
            return Ok(false);
        };
        if sample.age_minutes > MAX_SAMPLE_AGE_MINUTES {
            tracing::debug!(
                age_minutes = sample.age_minutes,
                "stale location sample, skipping"
            );
            return Ok(false);
        }
        match self.add_currency_for_country(country).await {
            Ok(added) => Ok(added),
            Err(EngineError::NotFound(_)) => {
                tracing::debug!(country, "no currency mapping for located country, skipping");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Removes currencies from the active trip's short-list, all or nothing.
    ///
    /// A code is refused when any expense still references it or when it is
    /// the trip's base or local currency (removing those would break the
    /// trip itself). If any requested code is refused, the error lists every
    /// blocking code and the short-list stays untouched.
    pub async fn remove_currencies(&self, codes: &[String]) -> ResultEngine<()> {
        let (mut trips, index) = self.current_trip_slot().await?;
        let trip = &mut trips[index];

        let codes = codes
            .iter()
            .map(|code| normalize_currency_code(code))
            .collect::<ResultEngine<Vec<String>>>()?;

        let mut blocking: Vec<String> = Vec::new();
        for code in &codes {
            let referenced = trip.expenses.iter().any(|e| e.currency == *code);
            let structural =
                trip.base_currency.code == *code || trip.local_currency.code == *code;
            if (referenced || structural) && !blocking.contains(code) {
                blocking.push(code.clone());
            }
        }
        if !blocking.is_empty() {
            return Err(EngineError::CurrencyInUse(blocking));
        }

        trip.currencies.retain(|c| !codes.contains(&c.code));
        self.repository.save_trips(&trips).await
    }
}
