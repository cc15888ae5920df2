use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::prediction::PredictionResult;
use crate::state::settings::AppSettings;

/// Slot holding the serialized prediction map.
const SLOT_PREDICTIONS: &str = "predictions";
/// Slot holding the serialized settings record.
const SLOT_SETTINGS: &str = "settings";

/// Payload written by a legacy double-stringification bug; treated as absent.
const SENTINEL: &str = "[object Object]";

/// Thread-safe SQLite handle (single connection with mutex). The store is a
/// plain key-value table: each slot is overwritten wholesale with the full
/// serialized value on every mutation.
#[derive(Clone)]
pub struct Storage {
    conn: Arc<Mutex<Connection>>,
}

impl Storage {
    /// Open (or create) the SQLite database at the given path.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let storage = Storage {
            conn: Arc::new(Mutex::new(conn)),
        };
        storage.run_migrations()?;
        Ok(storage)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Storage {
            conn: Arc::new(Mutex::new(conn)),
        };
        storage.run_migrations()?;
        Ok(storage)
    }

    /// Run schema migrations (idempotent).
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    fn read_slot(&self, slot: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM slots WHERE slot = ?1",
                params![slot],
                |row| row.get(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write_slot(&self, slot: &str, payload: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO slots (slot, payload, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET
                payload=excluded.payload,
                updated_at=excluded.updated_at",
            params![slot, payload, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Load the prediction map, falling back to empty on any malformed
    /// content. A stored payload equal to the `"[object Object]"` sentinel
    /// counts as absent.
    pub fn load_predictions(&self) -> Result<HashMap<String, PredictionResult>> {
        let Some(payload) = self.read_slot(SLOT_PREDICTIONS)? else {
            return Ok(HashMap::new());
        };
        if !is_usable(&payload) {
            warn!("Stored prediction slot unusable, starting empty");
            return Ok(HashMap::new());
        }
        match serde_json::from_str(&payload) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!("Failed to decode stored predictions, starting empty: {e}");
                Ok(HashMap::new())
            }
        }
    }

    pub fn save_predictions(&self, predictions: &HashMap<String, PredictionResult>) -> Result<()> {
        let payload = serde_json::to_string(predictions)?;
        self.write_slot(SLOT_PREDICTIONS, &payload)
    }

    /// Load the settings record, falling back to defaults on any malformed
    /// content. Missing fields inside a valid record take their defaults via
    /// serde.
    pub fn load_settings(&self) -> Result<AppSettings> {
        let Some(payload) = self.read_slot(SLOT_SETTINGS)? else {
            return Ok(AppSettings::default());
        };
        if !is_usable(&payload) {
            warn!("Stored settings slot unusable, using defaults");
            return Ok(AppSettings::default());
        }
        match serde_json::from_str(&payload) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!("Failed to decode stored settings, using defaults: {e}");
                Ok(AppSettings::default())
            }
        }
    }

    pub fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        let payload = serde_json::to_string(settings)?;
        self.write_slot(SLOT_SETTINGS, &payload)
    }
}

fn is_usable(payload: &str) -> bool {
    let trimmed = payload.trim();
    !trimmed.is_empty() && trimmed != SENTINEL
}

/// SQLite schema (idempotent CREATE IF NOT EXISTS).
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS slots (
    slot       TEXT PRIMARY KEY,
    payload    TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::{MatchStats, PredictionResult};
    use crate::state::settings::{AutopilotSpeed, RiskLevel};

    fn sample_prediction(match_id: &str) -> PredictionResult {
        PredictionResult {
            match_id: match_id.to_string(),
            home_win_prob: 48,
            draw_prob: 27,
            away_win_prob: 25,
            confidence: 70.0,
            volatility: 35.0,
            reasoning: "test".to_string(),
            recommended_bet: "Home win".to_string(),
            key_factors: vec!["form".to_string()],
            stats: MatchStats::default(),
            sources: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn fresh_store_yields_empty_state() {
        let storage = Storage::open_in_memory().unwrap();
        assert!(storage.load_predictions().unwrap().is_empty());
        assert_eq!(storage.load_settings().unwrap(), AppSettings::default());
    }

    #[test]
    fn predictions_roundtrip() {
        let storage = Storage::open_in_memory().unwrap();
        let mut map = HashMap::new();
        map.insert("m-1".to_string(), sample_prediction("m-1"));
        map.insert("m-2".to_string(), sample_prediction("m-2"));
        storage.save_predictions(&map).unwrap();

        let loaded = storage.load_predictions().unwrap();
        assert_eq!(loaded, map);
    }

    #[test]
    fn settings_roundtrip() {
        let storage = Storage::open_in_memory().unwrap();
        let mut settings = AppSettings::default();
        settings.risk_level = RiskLevel::Aggressive;
        settings.autopilot = true;
        settings.autopilot_speed = AutopilotSpeed::Turbo;
        settings.historical_weight = 70;
        storage.save_settings(&settings).unwrap();

        assert_eq!(storage.load_settings().unwrap(), settings);
    }

    #[test]
    fn sentinel_payload_counts_as_absent() {
        let storage = Storage::open_in_memory().unwrap();
        storage.write_slot(SLOT_PREDICTIONS, SENTINEL).unwrap();
        storage.write_slot(SLOT_SETTINGS, SENTINEL).unwrap();

        assert!(storage.load_predictions().unwrap().is_empty());
        assert_eq!(storage.load_settings().unwrap(), AppSettings::default());
    }

    #[test]
    fn malformed_payload_degrades_to_defaults() {
        let storage = Storage::open_in_memory().unwrap();
        storage.write_slot(SLOT_PREDICTIONS, "{not valid").unwrap();
        storage.write_slot(SLOT_SETTINGS, "[1, 2, 3]").unwrap();

        assert!(storage.load_predictions().unwrap().is_empty());
        assert_eq!(storage.load_settings().unwrap(), AppSettings::default());
    }

    #[test]
    fn saves_overwrite_the_whole_slot() {
        let storage = Storage::open_in_memory().unwrap();
        let mut map = HashMap::new();
        map.insert("m-1".to_string(), sample_prediction("m-1"));
        storage.save_predictions(&map).unwrap();

        storage.save_predictions(&HashMap::new()).unwrap();
        assert!(storage.load_predictions().unwrap().is_empty());
    }

    #[test]
    fn partial_settings_fill_with_defaults() {
        let storage = Storage::open_in_memory().unwrap();
        storage
            .write_slot(SLOT_SETTINGS, r#"{"riskLevel":"aggressive"}"#)
            .unwrap();

        let settings = storage.load_settings().unwrap();
        assert_eq!(settings.risk_level, RiskLevel::Aggressive);
        assert_eq!(
            settings.historical_weight,
            AppSettings::default().historical_weight
        );
        assert_eq!(settings.ai_model, AppSettings::default().ai_model);
    }
}
