pub use currency::{CatalogData, Currency, SlimCurrency};
pub use error::EngineError;
pub use expense::Expense;
pub use file_store::FileStore;
pub use money::MoneyMinor;
pub use ops::{DisplayExpense, Engine, EngineBuilder, LocationSample};
pub use rates::{HttpRateSource, RateSource, RateSourceError, RateTable};
pub use store::{KvStore, MemoryStore, StoreError};
pub use trip::Trip;

mod currency;
mod error;
mod expense;
mod file_store;
mod money;
mod ops;
mod rates;
mod repository;
mod store;
mod trip;

type ResultEngine<T> = Result<T, EngineError>;
