use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, MoneyMinor, ResultEngine};

/// A single expense recorded against a trip.
///
/// Expenses live inside their owning [`Trip`] and are persisted with it;
/// they are never stored independently. `currency` holds a code from the
/// trip's short-list, `category` one of the configured category names.
///
/// [`Trip`]: crate::Trip
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub amount: MoneyMinor,
    pub currency: String,
    pub category: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Creates an expense, rejecting non-positive amounts.
    pub fn new(
        amount: MoneyMinor,
        currency: String,
        category: String,
        description: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            amount: require_positive(amount)?,
            currency,
            category,
            description,
            created_at,
        })
    }
}

/// Shared amount check for creating and editing expenses.
pub(crate) fn require_positive(amount: MoneyMinor) -> ResultEngine<MoneyMinor> {
    if amount.is_positive() {
        Ok(amount)
    } else {
        Err(EngineError::Validation(format!(
            "amount must be positive, got {amount}"
        )))
    }
}
