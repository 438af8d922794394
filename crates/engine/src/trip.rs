use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Expense, SlimCurrency};

/// A trip: the unit of expense tracking.
///
/// Carries its own currency short-list plus the base (home) and local (travel)
/// currency choices. Invariants maintained by every construction and profile
/// update:
///
/// - `currencies` is unique by code;
/// - the base and local codes are always members of `currencies`;
/// - `expenses` is ordered most-recent-first.
///
/// A trip is always serialized whole; expenses have no life outside it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub name: String,
    pub base_currency: SlimCurrency,
    pub local_currency: SlimCurrency,
    pub currencies: Vec<SlimCurrency>,
    pub expenses: Vec<Expense>,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    /// Builds a trip with a fresh id and no expenses.
    #[must_use]
    pub fn new(
        name: String,
        base_currency: SlimCurrency,
        local_currency: SlimCurrency,
        currencies: Vec<SlimCurrency>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let currencies = short_list(&base_currency, &local_currency, currencies);
        Self {
            id: Uuid::new_v4(),
            name,
            base_currency,
            local_currency,
            currencies,
            expenses: Vec::new(),
            created_at,
        }
    }

    /// Replaces name, currency choices and short-list, keeping id, expenses
    /// and `created_at` untouched.
    pub fn set_profile(
        &mut self,
        name: String,
        base_currency: SlimCurrency,
        local_currency: SlimCurrency,
        currencies: Vec<SlimCurrency>,
    ) {
        self.currencies = short_list(&base_currency, &local_currency, currencies);
        self.name = name;
        self.base_currency = base_currency;
        self.local_currency = local_currency;
    }

    /// Whether `code` is on this trip's short-list.
    #[must_use]
    pub fn has_currency(&self, code: &str) -> bool {
        self.currencies.iter().any(|c| c.code == code)
    }
}

/// Deduplicates by code (first occurrence wins) and appends the base and
/// local currencies when the caller left them out.
fn short_list(
    base: &SlimCurrency,
    local: &SlimCurrency,
    currencies: Vec<SlimCurrency>,
) -> Vec<SlimCurrency> {
    let mut list: Vec<SlimCurrency> = Vec::with_capacity(currencies.len() + 2);
    for currency in currencies {
        if !list.iter().any(|c| c.code == currency.code) {
            list.push(currency);
        }
    }
    for required in [base, local] {
        if !list.iter().any(|c| c.code == required.code) {
            list.push(required.clone());
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slim(code: &str, symbol: &str) -> SlimCurrency {
        SlimCurrency::new(code, symbol)
    }

    #[test]
    fn short_list_appends_missing_base_and_local() {
        let trip = Trip::new(
            "Rome".to_string(),
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![slim("CZK", "Kč")],
            Utc::now(),
        );
        let codes: Vec<&str> = trip.currencies.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["CZK", "USD", "EUR"]);
    }

    #[test]
    fn short_list_drops_duplicate_codes() {
        let trip = Trip::new(
            "Rome".to_string(),
            slim("EUR", "€"),
            slim("EUR", "€"),
            vec![slim("EUR", "€"), slim("EUR", "euro"), slim("GBP", "£")],
            Utc::now(),
        );
        let codes: Vec<&str> = trip.currencies.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, ["EUR", "GBP"]);
        // First occurrence wins, including its symbol.
        assert_eq!(trip.currencies[0].symbol, "€");
    }

    #[test]
    fn set_profile_keeps_expenses_and_created_at() {
        let created = Utc::now();
        let mut trip = Trip::new(
            "Rome".to_string(),
            slim("USD", "$"),
            slim("EUR", "€"),
            vec![],
            created,
        );
        let id = trip.id;
        trip.set_profile(
            "Summer in Rome".to_string(),
            slim("ILS", "₪"),
            slim("EUR", "€"),
            vec![slim("EUR", "€")],
        );
        assert_eq!(trip.id, id);
        assert_eq!(trip.created_at, created);
        assert_eq!(trip.name, "Summer in Rome");
        assert!(trip.has_currency("ILS"));
        assert!(trip.has_currency("EUR"));
        assert!(!trip.has_currency("USD"));
    }
}
