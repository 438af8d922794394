use chrono::{DateTime, Duration, Utc};

use crate::{Currency, ResultEngine};

use super::Engine;

/// Rates older than this are refetched on the next refresh call.
const RATES_MAX_AGE_HOURS: i64 = 24;

impl Engine {
    /// The currency catalog: the persisted list when one exists, the
    /// configured default set otherwise.
    pub async fn list_currencies(&self) -> ResultEngine<Vec<Currency>> {
        Ok(self
            .repository
            .currencies()
            .await?
            .unwrap_or_else(|| self.catalog.default_currencies.clone()))
    }

    /// Refreshes the exchange-rate table when the cached one is older than a
    /// day (or was never fetched). Returns whether a fetch happened.
    ///
    /// A failed fetch is logged and leaves both the catalog and the
    /// freshness timestamp untouched, so the next call tries again; rates
    /// keep their previous (or identity) values in the meantime. Codes in
    /// the response with no catalog entry are ignored.
    pub async fn refresh_rates_if_stale(&self, now: DateTime<Utc>) -> ResultEngine<bool> {
        if let Some(refreshed_at) = self.repository.rates_refreshed_at().await?
            && now.signed_duration_since(refreshed_at) < Duration::hours(RATES_MAX_AGE_HOURS)
        {
            return Ok(false);
        }

        let table = match self.rates.fetch_rates().await {
            Ok(table) => table,
            Err(err) => {
                tracing::warn!("exchange rate refresh failed, keeping cached rates: {err}");
                return Ok(false);
            }
        };

        let mut currencies = self.list_currencies().await?;
        for currency in &mut currencies {
            if let Some(rate) = table.get(&currency.code)
                && rate.is_finite()
                && *rate > 0.0
            {
                currency.rate = *rate;
            }
        }

        self.repository.save_currencies(&currencies).await?;
        self.repository.save_rates_refreshed_at(now).await?;
        Ok(true)
    }

    /// Display symbol for a currency code; falls back to the code itself
    /// when the symbol table has no entry.
    #[must_use]
    pub fn lookup_symbol(&self, code: &str) -> String {
        self.catalog
            .symbol_for(code)
            .unwrap_or(code)
            .to_string()
    }
}
