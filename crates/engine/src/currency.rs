use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A catalog currency: identity, display data and its USD-relative rate.
///
/// `rate` is expressed as *units of this currency per 1 USD* and defaults to
/// `1.0` (identity) until a rate refresh succeeds, so conversion never blocks
/// on network availability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
    pub rate: f64,
}

impl Currency {
    /// Builds a catalog entry with the identity rate.
    #[must_use]
    pub fn new(code: &str, name: &str, symbol: &str) -> Self {
        Self {
            code: code.trim().to_ascii_uppercase(),
            name: name.to_string(),
            symbol: symbol.to_string(),
            rate: 1.0,
        }
    }

    /// Projects the short-list form (identity and display only).
    #[must_use]
    pub fn slim(&self) -> SlimCurrency {
        SlimCurrency {
            code: self.code.clone(),
            symbol: self.symbol.clone(),
        }
    }
}

/// Short-list entry for a trip: currency code plus its display symbol.
///
/// Rates are deliberately absent. A trip's short-list only decides which
/// currencies an expense may use and how they render; conversion always goes
/// through the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlimCurrency {
    pub code: String,
    pub symbol: String,
}

impl SlimCurrency {
    #[must_use]
    pub fn new(code: &str, symbol: &str) -> Self {
        Self {
            code: code.trim().to_ascii_uppercase(),
            symbol: symbol.to_string(),
        }
    }
}

impl core::fmt::Display for SlimCurrency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.code)
    }
}

/// Static reference data the engine is configured with: the default currency
/// set, the code→symbol table, the country→currency table and the expense
/// categories.
///
/// The tables are plain data so deployments can swap them without touching
/// engine code; [`CatalogData::default`] ships the stock set.
#[derive(Clone, Debug)]
pub struct CatalogData {
    pub default_currencies: Vec<Currency>,
    pub symbols: HashMap<String, String>,
    pub countries: HashMap<String, String>,
    pub categories: Vec<String>,
}

impl CatalogData {
    /// Display symbol for a code, when the table knows it.
    #[must_use]
    pub fn symbol_for(&self, code: &str) -> Option<&str> {
        self.symbols.get(code).map(String::as_str)
    }

    /// Currency code for a country name. Exact key match, surrounding
    /// whitespace ignored.
    #[must_use]
    pub fn currency_for_country(&self, country: &str) -> Option<&str> {
        self.countries.get(country.trim()).map(String::as_str)
    }

    /// Whether `name` is one of the configured expense categories.
    #[must_use]
    pub fn is_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c == name)
    }
}

const DEFAULT_SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("ILS", "₪"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("CHF", "CHF"),
    ("HUF", "Ft"),
    ("CZK", "Kč"),
    ("DKK", "kr"),
    ("NOK", "kr"),
    ("SEK", "kr"),
    ("ISK", "kr"),
    ("PLN", "zł"),
    ("RON", "lei"),
    ("BGN", "лв"),
    ("RSD", "din"),
    ("TRY", "₺"),
    ("JPY", "¥"),
    ("CAD", "C$"),
    ("AUD", "A$"),
    ("NZD", "NZ$"),
    ("THB", "฿"),
];

const DEFAULT_COUNTRIES: &[(&str, &str)] = &[
    ("United States", "USD"),
    ("Israel", "ILS"),
    ("Austria", "EUR"),
    ("Belgium", "EUR"),
    ("Croatia", "EUR"),
    ("Finland", "EUR"),
    ("France", "EUR"),
    ("Germany", "EUR"),
    ("Greece", "EUR"),
    ("Ireland", "EUR"),
    ("Italy", "EUR"),
    ("Netherlands", "EUR"),
    ("Portugal", "EUR"),
    ("Slovenia", "EUR"),
    ("Spain", "EUR"),
    ("United Kingdom", "GBP"),
    ("Switzerland", "CHF"),
    ("Hungary", "HUF"),
    ("Czech Republic", "CZK"),
    ("Czechia", "CZK"),
    ("Denmark", "DKK"),
    ("Norway", "NOK"),
    ("Sweden", "SEK"),
    ("Iceland", "ISK"),
    ("Poland", "PLN"),
    ("Romania", "RON"),
    ("Bulgaria", "BGN"),
    ("Serbia", "RSD"),
    ("Turkey", "TRY"),
    ("Japan", "JPY"),
    ("Canada", "CAD"),
    ("Australia", "AUD"),
    ("New Zealand", "NZD"),
    ("Thailand", "THB"),
];

const DEFAULT_CATEGORIES: &[&str] = &[
    "Groceries",
    "Souvenirs",
    "Eating Out & TA",
    "Beer and Coffee",
    "Gas + Parking",
    "Attractions",
];

impl Default for CatalogData {
    fn default() -> Self {
        let default_currencies = vec![
            Currency::new("USD", "US Dollar", "$"),
            Currency::new("ILS", "Israeli Shekel", "₪"),
            Currency::new("EUR", "Euro", "€"),
            Currency::new("GBP", "British Pound", "£"),
            Currency::new("CHF", "Swiss Franc", "CHF"),
            Currency::new("HUF", "Hungarian Forint", "Ft"),
            Currency::new("CZK", "Czech Koruna", "Kč"),
            Currency::new("DKK", "Danish Krone", "kr"),
        ];
        let symbols = DEFAULT_SYMBOLS
            .iter()
            .map(|(code, symbol)| (code.to_string(), symbol.to_string()))
            .collect();
        let countries = DEFAULT_COUNTRIES
            .iter()
            .map(|(country, code)| (country.to_string(), code.to_string()))
            .collect();
        let categories = DEFAULT_CATEGORIES.iter().map(ToString::to_string).collect();

        Self {
            default_currencies,
            symbols,
            countries,
            categories,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slim_keeps_code_and_symbol() {
        let currency = Currency::new("eur", "Euro", "€");
        assert_eq!(currency.code, "EUR");
        let slim = currency.slim();
        assert_eq!(slim, SlimCurrency::new("EUR", "€"));
    }

    #[test]
    fn country_lookup_trims_whitespace() {
        let catalog = CatalogData::default();
        assert_eq!(catalog.currency_for_country(" Hungary "), Some("HUF"));
        assert_eq!(catalog.currency_for_country("Atlantis"), None);
    }

    #[test]
    fn default_catalog_rates_start_at_identity() {
        let catalog = CatalogData::default();
        assert!(catalog.default_currencies.iter().all(|c| c.rate == 1.0));
        assert!(catalog.is_category("Beer and Coffee"));
        assert!(!catalog.is_category("Rent"));
    }
}
