use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// One completion request: model, instructions, and the strict output
/// contract the service must honour.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub system_instruction: String,
    pub prompt: String,
    /// JSON schema the completion text must conform to.
    pub response_schema: Value,
    /// Ask the service to ground the answer with live web search.
    pub web_search: bool,
}

/// Raw completion: text plus whatever citations the service attached.
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub text: String,
    pub citations: Vec<Citation>,
}

/// A grounding citation from the service's search metadata.
#[derive(Debug, Clone)]
pub struct Citation {
    pub title: Option<String>,
    pub uri: String,
}

/// Every failure mode of obtaining or decoding a prediction collapses into
/// this one type; callers recover at the orchestration boundary.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("inference API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("empty or unusable completion text")]
    EmptyText,

    #[error("failed to decode completion JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Trait every completion backend must implement.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Issue exactly one completion call. No retries.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, InferenceError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Offline backend: returns a deterministic canned analysis derived from the
/// prompt, wrapped in prose the way real services sometimes wrap JSON. Lets
/// the full loop run without credentials.
pub struct CannedProvider;

#[async_trait]
impl CompletionProvider for CannedProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, InferenceError> {
        // Cheap stable hash over the prompt so different fixtures get
        // different-looking numbers.
        let seed = request
            .prompt
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        let home = 25 + (seed % 40) as i64;
        // Keep at least a 5% share for the away side.
        let draw = 10 + ((seed / 7) % (85 - home) as u64) as i64;
        let away = 100 - home - draw;

        let body = serde_json::json!({
            "homeWinProb": home,
            "drawProb": draw,
            "awayWinProb": away,
            "confidence": 55 + (seed % 30) as i64,
            "volatility": 20 + (seed / 3 % 40) as i64,
            "reasoning": "Offline mode: synthetic analysis generated without a live inference backend.",
            "recommendedBet": if home >= away { "Home win" } else { "Away win" },
            "keyFactors": ["offline mode", "deterministic seed"],
            "stats": {
                "expectedGoals": { "home": 1.0 + (seed % 15) as f64 / 10.0, "away": 0.8 + (seed / 5 % 12) as f64 / 10.0 },
                "recentPossession": { "home": 45.0 + (seed % 10) as f64, "away": 45.0 + (seed / 11 % 10) as f64 },
                "defenseStrength": { "home": 60.0 + (seed % 20) as f64, "away": 60.0 + (seed / 13 % 20) as f64 }
            }
        });

        Ok(Completion {
            text: format!("Here is the requested analysis: {body} End of report."),
            citations: Vec::new(),
        })
    }

    fn name(&self) -> &str {
        "offline-canned"
    }
}
