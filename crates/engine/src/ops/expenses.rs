use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    Currency, EngineError, Expense, MoneyMinor, ResultEngine, Trip, expense::require_positive,
};

use super::{Engine, normalize_currency_code, normalize_optional_text};

/// How many entries [`Engine::recent_expenses`] returns by default.
const DEFAULT_RECENT_LIMIT: usize = 10;

/// Read-only projection of an expense for rendering: the currency code is
/// replaced by its display symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplayExpense {
    pub id: Uuid,
    pub amount: MoneyMinor,
    pub symbol: String,
    pub category: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Engine {
    /// Records an expense against the active trip, newest first.
    ///
    /// A blank description falls back to the category name. The currency
    /// must be on the trip's short-list and the category one of the
    /// configured set.
    pub async fn add_expense(
        &self,
        amount: MoneyMinor,
        description: &str,
        category: &str,
        currency: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<Expense> {
        let (mut trips, index) = self.current_trip_slot().await?;
        let trip = &mut trips[index];

        let category = self.validate_category(category)?;
        let currency = require_trip_currency(trip, currency)?;
        let description =
            normalize_optional_text(Some(description)).unwrap_or_else(|| category.clone());

        let expense = Expense::new(amount, currency, category, description, now)?;
        trip.expenses.insert(0, expense.clone());

        self.repository.save_trips(&trips).await?;
        Ok(expense)
    }

    /// Rewrites an expense's user-editable fields, keeping its id and
    /// `created_at`.
    pub async fn edit_expense(
        &self,
        expense_id: Uuid,
        amount: MoneyMinor,
        description: &str,
        category: &str,
        currency: &str,
    ) -> ResultEngine<Expense> {
        let (mut trips, index) = self.current_trip_slot().await?;
        let trip = &mut trips[index];

        let amount = require_positive(amount)?;
        let category = self.validate_category(category)?;
        let currency = require_trip_currency(trip, currency)?;
        let description =
            normalize_optional_text(Some(description)).unwrap_or_else(|| category.clone());

        let expense = trip
            .expenses
            .iter_mut()
            .find(|e| e.id == expense_id)
            .ok_or_else(|| EngineError::NotFound(format!("expense {expense_id}")))?;
        expense.amount = amount;
        expense.currency = currency;
        expense.category = category;
        expense.description = description;
        let updated = expense.clone();

        self.repository.save_trips(&trips).await?;
        Ok(updated)
    }

    /// Drops the given expenses from the active trip. Without an active trip
    /// there is nothing to remove and the call is a logged no-op.
    pub async fn remove_expenses(&self, expense_ids: &[Uuid]) -> ResultEngine<()> {
        let Some(id) = self.repository.active_trip_id().await? else {
            tracing::debug!("remove_expenses without a current trip, nothing to do");
            return Ok(());
        };
        let mut trips = self.repository.trips().await?;
        let Some(trip) = trips.iter_mut().find(|t| t.id == id) else {
            tracing::debug!(%id, "remove_expenses with a dangling active trip id, nothing to do");
            return Ok(());
        };
        trip.expenses.retain(|e| !expense_ids.contains(&e.id));
        self.repository.save_trips(&trips).await
    }

    /// Sums a trip's expenses in its base currency.
    ///
    /// Expenses already in the base currency pass through as exact integer
    /// cents. Everything else converts through the USD pivot as
    /// `cents * (base_rate / expense_rate)`, rounded per expense, both rates
    /// taken from the catalog. An expense whose currency (or the base
    /// currency itself, once a conversion is needed) has no usable catalog
    /// rate fails the whole computation rather than silently counting at
    /// 1.0.
    pub async fn compute_total(&self, trip: &Trip) -> ResultEngine<MoneyMinor> {
        let catalog = self.list_currencies().await?;
        let base_code = trip.base_currency.code.as_str();

        let mut total = MoneyMinor::ZERO;
        for expense in &trip.expenses {
            let cents = if expense.currency == base_code {
                expense.amount
            } else {
                let base_rate = rate_for(&catalog, base_code)?;
                let expense_rate = rate_for(&catalog, &expense.currency)?;
                let converted = expense.amount.cents() as f64 * (base_rate / expense_rate);
                MoneyMinor::new(converted.round() as i64)
            };
            total = total
                .checked_add(cents)
                .ok_or_else(|| EngineError::Validation("trip total overflows".to_string()))?;
        }
        Ok(total)
    }

    /// The trip's expenses ready for rendering, most recent first, with
    /// display symbols substituted for currency codes.
    #[must_use]
    pub fn display_expenses(&self, trip: &Trip) -> Vec<DisplayExpense> {
        trip.expenses
            .iter()
            .map(|expense| DisplayExpense {
                id: expense.id,
                amount: expense.amount,
                symbol: self.lookup_symbol(&expense.currency),
                category: expense.category.clone(),
                description: expense.description.clone(),
                created_at: expense.created_at,
            })
            .collect()
    }

    /// The first `limit` (default 10) display expenses.
    #[must_use]
    pub fn recent_expenses(&self, trip: &Trip, limit: Option<usize>) -> Vec<DisplayExpense> {
        let mut expenses = self.display_expenses(trip);
        expenses.truncate(limit.unwrap_or(DEFAULT_RECENT_LIMIT));
        expenses
    }

    fn validate_category(&self, category: &str) -> ResultEngine<String> {
        let trimmed = category.trim();
        if trimmed.is_empty() {
            return Err(EngineError::Validation(
                "category must not be empty".to_string(),
            ));
        }
        if !self.catalog.is_category(trimmed) {
            return Err(EngineError::Validation(format!(
                "unknown category: {trimmed}"
            )));
        }
        Ok(trimmed.to_string())
    }
}

fn require_trip_currency(trip: &Trip, currency: &str) -> ResultEngine<String> {
    let code = normalize_currency_code(currency)?;
    if !trip.has_currency(&code) {
        return Err(EngineError::NotFound(format!(
            "currency {code} in the trip short-list"
        )));
    }
    Ok(code)
}

fn rate_for(catalog: &[Currency], code: &str) -> ResultEngine<f64> {
    catalog
        .iter()
        .find(|c| c.code == code)
        .map(|c| c.rate)
        .filter(|rate| rate.is_finite() && *rate > 0.0)
        .ok_or_else(|| EngineError::NotFound(format!("usable rate for {code}")))
}
