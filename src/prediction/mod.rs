pub mod normalize;
pub mod prompt;
pub mod service;

pub use service::PredictionService;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A home/away pair of one statistic.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HomeAway {
    pub home: f64,
    pub away: f64,
}

/// Statistical block attached to each prediction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchStats {
    pub expected_goals: HomeAway,
    pub recent_possession: HomeAway,
    pub defense_strength: HomeAway,
}

/// A web citation backing a prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSource {
    pub title: String,
    pub uri: String,
}

/// The structured analysis for one match.
///
/// Probabilities are integers summing to exactly 100 — the normalizer
/// enforces this before a result is ever constructed. Results are never
/// mutated after creation, only replaced wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub match_id: String,
    pub home_win_prob: i64,
    pub draw_prob: i64,
    pub away_win_prob: i64,
    pub confidence: f64,
    pub volatility: f64,
    pub reasoning: String,
    pub recommended_bet: String,
    pub key_factors: Vec<String>,
    pub stats: MatchStats,
    pub sources: Vec<SearchSource>,
    pub timestamp: DateTime<Utc>,
}

/// The analytical fields as decoded from the inference payload, after
/// probability normalization. Every field is defaulted: the external schema
/// declares them required, but nothing from the wire is trusted at runtime.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisPayload {
    pub home_win_prob: i64,
    pub draw_prob: i64,
    pub away_win_prob: i64,
    pub confidence: f64,
    pub volatility: f64,
    pub reasoning: String,
    pub recommended_bet: String,
    pub key_factors: Vec<String>,
    pub stats: MatchStats,
}
