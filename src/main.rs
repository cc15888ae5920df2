use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod config;
mod dashboard;
mod db;
mod engine;
mod inference;
mod prediction;
mod schedule;
mod state;

use config::Config;
use dashboard::AppState;
use db::Storage;
use engine::{AnalysisEngine, Autopilot};
use inference::{CannedProvider, CompletionProvider, GeminiClient};
use prediction::PredictionService;
use state::AppCore;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Open storage and hydrate persisted state
    let storage = Storage::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);
    let settings = storage.load_settings()?;
    let predictions = storage.load_predictions()?;
    info!("Restored {} cached prediction(s)", predictions.len());

    // Generate the fixture window around today
    let today = chrono::Local::now().date_naive();
    let matches = schedule::generate_window(today);
    info!(
        "Generated {} fixtures across {} leagues around {}",
        matches.len(),
        schedule::League::ALL.len(),
        today
    );

    // Pick the completion backend
    let provider: Arc<dyn CompletionProvider> = if config.offline {
        info!("🟡 OFFLINE mode – canned analyses, no inference calls will be made");
        Arc::new(CannedProvider)
    } else {
        info!("🔴 LIVE mode – analyses go to {}", config.inference_api_url);
        Arc::new(GeminiClient::new(
            &config.inference_api_url,
            config.inference_api_key.clone().unwrap_or_default(),
            Duration::from_secs(config.inference_timeout_secs),
        )?)
    };
    let service = Arc::new(PredictionService::new(provider));
    info!("Prediction service ready (backend: {})", service.provider_name());

    // Wire the core, engine and autopilot
    let core = AppCore::new(storage, matches, predictions, settings, today);
    let engine = AnalysisEngine::new(core.clone(), service);
    let autopilot = Autopilot::new(engine.clone());
    autopilot.sync();

    // Serve the dashboard (blocks until shutdown)
    let app = dashboard::router(AppState {
        core,
        engine,
        autopilot,
    });
    let addr: SocketAddr = config.dashboard_addr.parse()?;
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
