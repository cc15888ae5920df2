use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use crate::inference::{CompletionProvider, CompletionRequest, InferenceError};
use crate::schedule::Match;
use crate::state::settings::AppSettings;

use super::normalize::normalize_probabilities;
use super::prompt;
use super::{AnalysisPayload, PredictionResult, SearchSource};

/// At most this many grounding sources are kept per prediction.
const MAX_SOURCES: usize = 5;

/// Placeholder title for citations that arrive without one.
const UNTITLED_SOURCE: &str = "Data source";

/// Orchestrates one inference call per match: prompt in, validated
/// `PredictionResult` out. Exactly one outbound request per invocation; the
/// caller decides whether to re-invoke on failure.
pub struct PredictionService {
    provider: Arc<dyn CompletionProvider>,
}

impl PredictionService {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        PredictionService { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub async fn predict(
        &self,
        m: &Match,
        settings: &AppSettings,
    ) -> Result<PredictionResult, InferenceError> {
        let request = CompletionRequest {
            model: settings.ai_model.clone(),
            system_instruction: prompt::system_instruction(settings),
            prompt: prompt::build_match_prompt(m),
            response_schema: response_schema(),
            web_search: true,
        };

        let completion = self.provider.complete(&request).await?;
        debug!(
            "Completion for {}: {} chars, {} citations",
            m.id,
            completion.text.len(),
            completion.citations.len()
        );

        let clean = clean_json_string(extract_json(&completion.text));
        if clean.is_empty() || clean == "[object Object]" {
            return Err(InferenceError::EmptyText);
        }

        let mut payload: Value = serde_json::from_str(&clean)?;
        normalize_probabilities(&mut payload);
        let analysis: AnalysisPayload = serde_json::from_value(payload)?;

        let sources = completion
            .citations
            .into_iter()
            .take(MAX_SOURCES)
            .map(|c| SearchSource {
                title: c.title.unwrap_or_else(|| UNTITLED_SOURCE.to_string()),
                uri: c.uri,
            })
            .collect();

        Ok(PredictionResult {
            match_id: m.id.clone(),
            home_win_prob: analysis.home_win_prob,
            draw_prob: analysis.draw_prob,
            away_win_prob: analysis.away_win_prob,
            confidence: analysis.confidence,
            volatility: analysis.volatility,
            reasoning: analysis.reasoning,
            recommended_bet: analysis.recommended_bet,
            key_factors: analysis.key_factors,
            stats: analysis.stats,
            sources,
            timestamp: Utc::now(),
        })
    }
}

/// The output contract declared to the inference service: the analytical
/// fields of a prediction, all required.
fn response_schema() -> Value {
    let pair = || {
        json!({
            "type": "OBJECT",
            "properties": {
                "home": { "type": "NUMBER" },
                "away": { "type": "NUMBER" }
            }
        })
    };
    json!({
        "type": "OBJECT",
        "properties": {
            "homeWinProb": { "type": "NUMBER" },
            "drawProb": { "type": "NUMBER" },
            "awayWinProb": { "type": "NUMBER" },
            "confidence": { "type": "NUMBER" },
            "volatility": { "type": "NUMBER" },
            "reasoning": { "type": "STRING" },
            "recommendedBet": { "type": "STRING" },
            "keyFactors": { "type": "ARRAY", "items": { "type": "STRING" } },
            "stats": {
                "type": "OBJECT",
                "properties": {
                    "expectedGoals": pair(),
                    "recentPossession": pair(),
                    "defenseStrength": pair()
                }
            }
        },
        "required": [
            "homeWinProb", "drawProb", "awayWinProb", "confidence", "volatility",
            "reasoning", "recommendedBet", "keyFactors", "stats"
        ]
    })
}

/// Unwrap a JSON object from prose: everything between the first `{` and the
/// last `}`. Services wrap structured output in commentary often enough that
/// this runs on every response.
fn extract_json(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

/// Strip ASCII and C1 control characters and trim the remainder.
fn clean_json_string(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}'))
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{CannedProvider, Citation, Completion};
    use crate::schedule::generate_window;
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FixedProvider {
        text: String,
        citations: Vec<Citation>,
    }

    impl FixedProvider {
        fn text(text: &str) -> Self {
            FixedProvider {
                text: text.to_string(),
                citations: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl CompletionProvider for FixedProvider {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<Completion, InferenceError> {
            Ok(Completion {
                text: self.text.clone(),
                citations: self.citations.clone(),
            })
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn sample_match() -> Match {
        let reference = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        generate_window(reference)
            .into_iter()
            .find(|m| m.date == reference)
            .unwrap()
    }

    fn analysis_json() -> String {
        r#"{
            "homeWinProb": 60, "drawProb": 25, "awayWinProb": 15,
            "confidence": 74.0, "volatility": 31.0,
            "reasoning": "Home side in better form.",
            "recommendedBet": "Home win",
            "keyFactors": ["form", "home advantage"],
            "stats": {
                "expectedGoals": { "home": 1.9, "away": 0.8 },
                "recentPossession": { "home": 58.0, "away": 42.0 },
                "defenseStrength": { "home": 77.0, "away": 64.0 }
            }
        }"#
        .to_string()
    }

    #[test]
    fn extract_json_unwraps_prose() {
        let raw = r#"Here is the result: {"homeWinProb":60,"drawProb":20} Thanks!"#;
        assert_eq!(extract_json(raw), r#"{"homeWinProb":60,"drawProb":20}"#);
    }

    #[test]
    fn extract_json_passes_through_braceless_text() {
        assert_eq!(extract_json("no braces here"), "no braces here");
    }

    #[test]
    fn clean_json_strips_control_characters() {
        let dirty = "  {\"a\":\u{0001}1,\u{009F}\"b\":2}\n";
        assert_eq!(clean_json_string(dirty), "{\"a\":1,\"b\":2}");
    }

    #[tokio::test]
    async fn predict_decodes_prose_wrapped_json() {
        let provider = FixedProvider::text(&format!("Sure! Here you go: {} Cheers.", analysis_json()));
        let service = PredictionService::new(Arc::new(provider));
        let m = sample_match();

        let result = service.predict(&m, &AppSettings::default()).await.unwrap();
        assert_eq!(result.match_id, m.id);
        assert_eq!(
            (result.home_win_prob, result.draw_prob, result.away_win_prob),
            (60, 25, 15)
        );
        assert_eq!(result.recommended_bet, "Home win");
        assert_relative_eq!(result.confidence, 74.0, epsilon = 1e-9);
        assert_relative_eq!(result.stats.expected_goals.home, 1.9, epsilon = 1e-9);
        assert_relative_eq!(result.stats.recent_possession.away, 42.0, epsilon = 1e-9);
    }

    #[tokio::test]
    async fn predict_rejects_object_object_sentinel() {
        let provider = FixedProvider::text("[object Object]");
        let service = PredictionService::new(Arc::new(provider));

        let err = service
            .predict(&sample_match(), &AppSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::EmptyText));
    }

    #[tokio::test]
    async fn predict_rejects_empty_text() {
        let provider = FixedProvider::text("   \n ");
        let service = PredictionService::new(Arc::new(provider));

        let err = service
            .predict(&sample_match(), &AppSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::EmptyText));
    }

    #[tokio::test]
    async fn predict_surfaces_decode_failures() {
        let provider = FixedProvider::text("{ this is not json }");
        let service = PredictionService::new(Arc::new(provider));

        let err = service
            .predict(&sample_match(), &AppSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::Decode(_)));
    }

    #[tokio::test]
    async fn predict_normalizes_skewed_probabilities() {
        let skewed = r#"{"homeWinProb": 80, "drawProb": 80, "awayWinProb": 80}"#;
        let provider = FixedProvider::text(skewed);
        let service = PredictionService::new(Arc::new(provider));

        let result = service
            .predict(&sample_match(), &AppSettings::default())
            .await
            .unwrap();
        assert_eq!(
            (result.home_win_prob, result.draw_prob, result.away_win_prob),
            (33, 33, 34)
        );
    }

    #[tokio::test]
    async fn predict_caps_sources_and_fills_titles() {
        let citations: Vec<Citation> = (0..8)
            .map(|i| Citation {
                title: if i == 0 { None } else { Some(format!("Source {i}")) },
                uri: format!("https://example.com/{i}"),
            })
            .collect();
        let provider = FixedProvider {
            text: analysis_json(),
            citations,
        };
        let service = PredictionService::new(Arc::new(provider));

        let result = service
            .predict(&sample_match(), &AppSettings::default())
            .await
            .unwrap();
        assert_eq!(result.sources.len(), MAX_SOURCES);
        assert_eq!(result.sources[0].title, UNTITLED_SOURCE);
        assert_eq!(result.sources[1].title, "Source 1");
    }

    #[tokio::test]
    async fn canned_provider_round_trips_through_the_service() {
        let service = PredictionService::new(Arc::new(CannedProvider));
        let m = sample_match();

        let result = service.predict(&m, &AppSettings::default()).await.unwrap();
        assert_eq!(
            result.home_win_prob + result.draw_prob + result.away_win_prob,
            100
        );
    }
}
