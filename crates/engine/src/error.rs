//! The module contains the errors the engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when a required field is missing or malformed.
//! - [`NotFound`] thrown when a trip, expense or currency cannot be resolved.
//! - [`CurrencyInUse`] thrown when a short-list removal would orphan data.
//!
//!  [`Validation`]: EngineError::Validation
//!  [`NotFound`]: EngineError::NotFound
//!  [`CurrencyInUse`]: EngineError::CurrencyInUse
use thiserror::Error;

use crate::store::StoreError;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid value: {0}")]
    Validation(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Currency still in use: {}", .0.join(", "))]
    CurrencyInUse(Vec<String>),
    #[error("Malformed data: {0}")]
    Malformed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::CurrencyInUse(a), Self::CurrencyInUse(b)) => a == b,
            (Self::Malformed(a), Self::Malformed(b)) => a == b,
            (Self::Store(a), Self::Store(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
