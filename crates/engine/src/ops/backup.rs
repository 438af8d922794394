use std::collections::HashSet;

use csv::Writer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Trip};

use super::Engine;

const BACKUP_VERSION: u32 = 1;

/// Versioned wrapper around a trip snapshot.
#[derive(Serialize, Deserialize)]
struct BackupEnvelope {
    version: u32,
    trips: Vec<Trip>,
}

impl Engine {
    /// Serializes the whole trip collection into a portable JSON snapshot.
    pub async fn export_trips(&self) -> ResultEngine<String> {
        let trips = self.repository.trips().await?;
        serde_json::to_string(&BackupEnvelope {
            version: BACKUP_VERSION,
            trips,
        })
        .map_err(|err| EngineError::Malformed(format!("trips backup: {err}")))
    }

    /// Merges a snapshot into the local collection and returns the result.
    ///
    /// The merge is a union keyed by trip id: local trips always win, only
    /// genuinely new ids are appended. Accepts the current versioned
    /// envelope and, for old backups, a bare trip array. The active-trip
    /// pointer is untouched.
    pub async fn import_trips(&self, data: &str) -> ResultEngine<Vec<Trip>> {
        let value: serde_json::Value = serde_json::from_str(data)
            .map_err(|err| EngineError::Validation(format!("backup does not decode: {err}")))?;

        let incoming: Vec<Trip> = if value.is_array() {
            // Legacy snapshot: the trip array without an envelope.
            serde_json::from_value(value)
                .map_err(|err| EngineError::Validation(format!("backup does not decode: {err}")))?
        } else {
            let envelope: BackupEnvelope = serde_json::from_value(value)
                .map_err(|err| EngineError::Validation(format!("backup does not decode: {err}")))?;
            if envelope.version != BACKUP_VERSION {
                return Err(EngineError::Validation(format!(
                    "unsupported backup version {}",
                    envelope.version
                )));
            }
            envelope.trips
        };

        let mut trips = self.repository.trips().await?;
        let mut known: HashSet<Uuid> = trips.iter().map(|t| t.id).collect();
        for trip in incoming {
            if known.insert(trip.id) {
                trips.push(trip);
            }
        }

        self.repository.save_trips(&trips).await?;
        Ok(trips)
    }

    /// Renders a trip's expenses as CSV with a
    /// `Date,Amount,Currency,Category,Description` header. Quoting follows
    /// RFC 4180 (fields containing commas or quotes are quoted, embedded
    /// quotes doubled).
    pub fn export_csv(&self, trip: &Trip) -> ResultEngine<String> {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct ExportRow<'a> {
            date: String,
            amount: String,
            currency: &'a str,
            category: &'a str,
            description: &'a str,
        }

        let mut writer = Writer::from_writer(vec![]);
        for expense in &trip.expenses {
            writer
                .serialize(ExportRow {
                    date: expense.created_at.to_rfc3339(),
                    amount: expense.amount.to_string(),
                    currency: &expense.currency,
                    category: &expense.category,
                    description: &expense.description,
                })
                .map_err(|err| EngineError::Malformed(format!("csv export: {err}")))?;
        }

        let data = writer
            .into_inner()
            .map_err(|err| EngineError::Malformed(format!("csv export: {err}")))?;
        String::from_utf8(data).map_err(|err| EngineError::Malformed(format!("csv export: {err}")))
    }
}
