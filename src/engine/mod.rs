pub mod autopilot;

pub use autopilot::Autopilot;

use std::sync::Arc;

use tracing::{info, warn};

use crate::prediction::PredictionService;
use crate::schedule::Match;
use crate::state::AppCore;

/// Shared orchestration for manual and autopilot analysis triggers. This is
/// the one place an `InferenceError` is caught: the failure becomes a log
/// line and the match reverts to its ready-to-analyze state.
#[derive(Clone)]
pub struct AnalysisEngine {
    core: AppCore,
    service: Arc<PredictionService>,
}

impl AnalysisEngine {
    pub fn new(core: AppCore, service: Arc<PredictionService>) -> Self {
        AnalysisEngine { core, service }
    }

    pub fn core(&self) -> &AppCore {
        &self.core
    }

    /// Run one analysis to completion. Returns false when the match was
    /// already in flight and no request was issued.
    pub async fn analyze(&self, m: &Match) -> bool {
        if !self.core.begin_analysis(&m.id) {
            info!("Analysis already in flight for {}, skipping", m.id);
            return false;
        }

        self.core
            .push_log(format!("Deep scan started: {} vs {}", m.home_team, m.away_team));
        let settings = self.core.settings();

        match self.service.predict(m, &settings).await {
            Ok(result) => {
                self.core.insert_prediction(result);
                self.core
                    .push_log(format!("Results synced for {}", m.home_team));
            }
            Err(e) => {
                warn!("Analysis failed for {}: {e}", m.id);
                self.core
                    .push_log(format!("Inference failure for {}", m.home_team));
            }
        }

        self.core.end_analysis(&m.id);
        true
    }

    /// Fire-and-forget analysis on the runtime; completion order is
    /// whatever the network gives us.
    pub fn spawn_analysis(&self, m: Match) {
        let engine = self.clone();
        tokio::spawn(async move {
            engine.analyze(&m).await;
        });
    }
}
