pub mod settings;

pub use settings::AppSettings;

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use tracing::warn;

use crate::db::Storage;
use crate::prediction::PredictionResult;
use crate::schedule::{LeagueSelector, Match, MatchQuery, TimePeriod};

/// Entries kept in the rolling activity log.
const LOG_CAPACITY: usize = 50;

/// The user's current board selection: which slice of the fixture window is
/// visible and being scanned by the autopilot.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSelection {
    pub date: NaiveDate,
    pub league: LeagueSelector,
    pub query: String,
    pub period: TimePeriod,
}

struct CoreState {
    matches: Vec<Match>,
    predictions: HashMap<String, PredictionResult>,
    settings: AppSettings,
    view: ViewSelection,
    in_flight: HashSet<String>,
    status: String,
    logs: VecDeque<String>,
}

/// The single owner of all mutable application state. Clone-able handle;
/// every mutation happens under one lock and writes through to storage, so
/// the in-flight set is the only cross-task discipline anyone needs.
#[derive(Clone)]
pub struct AppCore {
    state: Arc<Mutex<CoreState>>,
    storage: Storage,
}

impl AppCore {
    pub fn new(
        storage: Storage,
        matches: Vec<Match>,
        predictions: HashMap<String, PredictionResult>,
        settings: AppSettings,
        today: NaiveDate,
    ) -> Self {
        let core = AppCore {
            state: Arc::new(Mutex::new(CoreState {
                matches,
                predictions,
                settings,
                view: ViewSelection {
                    date: today,
                    league: LeagueSelector::All,
                    query: String::new(),
                    period: TimePeriod::All,
                },
                in_flight: HashSet::new(),
                status: crate::engine::autopilot::STANDBY.to_string(),
                logs: VecDeque::new(),
            })),
            storage,
        };
        core.push_log("Matchscout analytic core online");
        core.push_log("Awaiting analysis directives");
        core
    }

    // ── Matches and filtering ────────────────────────────────────────────────

    pub fn find_match(&self, id: &str) -> Option<Match> {
        let s = self.state.lock().unwrap();
        s.matches.iter().find(|m| m.id == id).cloned()
    }

    pub fn view(&self) -> ViewSelection {
        self.state.lock().unwrap().view.clone()
    }

    /// Update the board selection. `None` fields keep their current value.
    pub fn set_view(
        &self,
        date: Option<NaiveDate>,
        league: Option<LeagueSelector>,
        query: Option<String>,
        period: Option<TimePeriod>,
    ) {
        let mut s = self.state.lock().unwrap();
        if let Some(date) = date {
            s.view.date = date;
        }
        if let Some(league) = league {
            s.view.league = league;
        }
        if let Some(query) = query {
            s.view.query = query;
        }
        if let Some(period) = period {
            s.view.period = period;
        }
    }

    /// The matches currently visible under the view selection, joined with
    /// their prediction (if any) and in-flight flag, in generation order.
    pub fn board_entries(&self) -> Vec<(Match, Option<PredictionResult>, bool)> {
        let s = self.state.lock().unwrap();
        let query = MatchQuery {
            date: s.view.date,
            league: s.view.league,
            query: s.view.query.clone(),
            period: s.view.period,
        };
        query
            .filter(&s.matches)
            .into_iter()
            .map(|m| {
                let prediction = s.predictions.get(&m.id).cloned();
                let in_flight = s.in_flight.contains(&m.id);
                (m, prediction, in_flight)
            })
            .collect()
    }

    /// First visible match with no prediction and no request in flight.
    pub fn next_pending(&self) -> Option<Match> {
        self.board_entries()
            .into_iter()
            .find(|(_, prediction, in_flight)| prediction.is_none() && !in_flight)
            .map(|(m, _, _)| m)
    }

    /// Rotate the league selector one step in the fixed cyclic order.
    pub fn advance_league(&self) -> LeagueSelector {
        let mut s = self.state.lock().unwrap();
        let next = s.view.league.next();
        s.view.league = next;
        next
    }

    // ── In-flight guard ──────────────────────────────────────────────────────

    /// Claim a match for analysis. Returns false when a request for this id
    /// is already in flight — the caller must then do nothing.
    pub fn begin_analysis(&self, id: &str) -> bool {
        let mut s = self.state.lock().unwrap();
        s.in_flight.insert(id.to_string())
    }

    pub fn end_analysis(&self, id: &str) {
        let mut s = self.state.lock().unwrap();
        s.in_flight.remove(id);
    }

    pub fn is_in_flight(&self, id: &str) -> bool {
        self.state.lock().unwrap().in_flight.contains(id)
    }

    // ── Predictions ──────────────────────────────────────────────────────────

    /// Lookup kept for tests and future per-card endpoints.
    #[allow(dead_code)]
    pub fn prediction(&self, id: &str) -> Option<PredictionResult> {
        self.state.lock().unwrap().predictions.get(id).cloned()
    }

    /// Commit a result and write the whole map through to storage.
    pub fn insert_prediction(&self, result: PredictionResult) {
        let mut s = self.state.lock().unwrap();
        s.predictions.insert(result.match_id.clone(), result);
        if let Err(e) = self.storage.save_predictions(&s.predictions) {
            warn!("Failed to persist predictions: {e:#}");
        }
    }

    /// Drop every cached prediction and persist the empty map.
    pub fn clear_predictions(&self) {
        let mut s = self.state.lock().unwrap();
        s.predictions.clear();
        if let Err(e) = self.storage.save_predictions(&s.predictions) {
            warn!("Failed to persist predictions: {e:#}");
        }
    }

    // ── Settings ─────────────────────────────────────────────────────────────

    pub fn settings(&self) -> AppSettings {
        self.state.lock().unwrap().settings.clone()
    }

    /// Apply a mutation to the settings record and persist the result.
    pub fn update_settings(&self, mutate: impl FnOnce(&mut AppSettings)) -> AppSettings {
        let mut s = self.state.lock().unwrap();
        mutate(&mut s.settings);
        if let Err(e) = self.storage.save_settings(&s.settings) {
            warn!("Failed to persist settings: {e:#}");
        }
        s.settings.clone()
    }

    // ── Status and log ───────────────────────────────────────────────────────

    pub fn status(&self) -> String {
        self.state.lock().unwrap().status.clone()
    }

    pub fn set_status(&self, status: impl Into<String>) {
        self.state.lock().unwrap().status = status.into();
    }

    pub fn push_log(&self, message: impl AsRef<str>) {
        let mut s = self.state.lock().unwrap();
        if s.logs.len() >= LOG_CAPACITY {
            s.logs.pop_front();
        }
        let line = format!("[{}] {}", Utc::now().format("%H:%M:%S"), message.as_ref());
        s.logs.push_back(line);
    }

    pub fn logs(&self) -> Vec<String> {
        self.state.lock().unwrap().logs.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::MatchStats;
    use crate::schedule::{generate_window, League};

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn test_core() -> AppCore {
        let storage = Storage::open_in_memory().unwrap();
        AppCore::new(
            storage,
            generate_window(reference()),
            HashMap::new(),
            AppSettings::default(),
            reference(),
        )
    }

    fn prediction_for(id: &str) -> PredictionResult {
        PredictionResult {
            match_id: id.to_string(),
            home_win_prob: 34,
            draw_prob: 33,
            away_win_prob: 33,
            confidence: 50.0,
            volatility: 50.0,
            reasoning: String::new(),
            recommended_bet: String::new(),
            key_factors: Vec::new(),
            stats: MatchStats::default(),
            sources: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn in_flight_guard_rejects_second_claim() {
        let core = test_core();
        assert!(core.begin_analysis("m-1"));
        assert!(!core.begin_analysis("m-1"));
        core.end_analysis("m-1");
        assert!(core.begin_analysis("m-1"));
    }

    #[test]
    fn next_pending_skips_predicted_and_in_flight() {
        let core = test_core();
        let entries = core.board_entries();
        assert!(entries.len() >= 3, "need a few visible matches");

        let first = entries[0].0.id.clone();
        let second = entries[1].0.id.clone();
        core.insert_prediction(prediction_for(&first));
        assert!(core.begin_analysis(&second));

        let pending = core.next_pending().expect("a pending match");
        assert_eq!(pending.id, entries[2].0.id);
    }

    #[test]
    fn insert_and_clear_write_through_storage() {
        let storage = Storage::open_in_memory().unwrap();
        let core = AppCore::new(
            storage.clone(),
            generate_window(reference()),
            HashMap::new(),
            AppSettings::default(),
            reference(),
        );

        core.insert_prediction(prediction_for("m-9"));
        assert_eq!(storage.load_predictions().unwrap().len(), 1);
        assert!(core.prediction("m-9").is_some());

        core.clear_predictions();
        assert!(storage.load_predictions().unwrap().is_empty());
        assert!(core.prediction("m-9").is_none());
    }

    #[test]
    fn update_settings_persists() {
        let storage = Storage::open_in_memory().unwrap();
        let core = AppCore::new(
            storage.clone(),
            Vec::new(),
            HashMap::new(),
            AppSettings::default(),
            reference(),
        );

        core.update_settings(|s| s.autopilot = true);
        assert!(storage.load_settings().unwrap().autopilot);
    }

    #[test]
    fn view_updates_affect_board() {
        let core = test_core();
        let all = core.board_entries().len();
        assert!(all > 0);

        core.set_view(None, Some(LeagueSelector::Only(League::SerieA)), None, None);
        let serie_a = core.board_entries();
        assert!(serie_a.len() < all);
        assert!(serie_a.iter().all(|(m, _, _)| m.league == League::SerieA));
    }

    #[test]
    fn advance_league_walks_the_cycle() {
        let core = test_core();
        assert_eq!(core.view().league, LeagueSelector::All);
        assert_eq!(
            core.advance_league(),
            LeagueSelector::Only(League::ChampionsLeague)
        );
        // Thirteen more steps walk the remaining leagues and land back on All.
        for _ in 0..League::ALL.len() {
            core.advance_league();
        }
        assert_eq!(core.view().league, LeagueSelector::All);
    }

    #[test]
    fn log_ring_is_bounded() {
        let core = test_core();
        for i in 0..200 {
            core.push_log(format!("entry {i}"));
        }
        let logs = core.logs();
        assert_eq!(logs.len(), LOG_CAPACITY);
        assert!(logs.last().unwrap().contains("entry 199"));
    }
}
