use clap::Parser;

/// AI football match scout with autopilot analysis
#[derive(Parser, Debug, Clone)]
#[command(name = "matchscout", version, about)]
pub struct Config {
    /// Dashboard listen address
    #[arg(long, env = "DASHBOARD_ADDR", default_value = "0.0.0.0:8080")]
    pub dashboard_addr: String,

    /// SQLite database path
    #[arg(long, env = "DATABASE_PATH", default_value = "matchscout.db")]
    pub database_path: String,

    /// Inference API base URL
    #[arg(
        long,
        env = "INFERENCE_API_URL",
        default_value = "https://generativelanguage.googleapis.com"
    )]
    pub inference_api_url: String,

    /// Inference API key (required unless running offline)
    #[arg(long, env = "GEMINI_API_KEY")]
    pub inference_api_key: Option<String>,

    /// Inference request timeout in seconds
    #[arg(long, env = "INFERENCE_TIMEOUT_SECS", default_value = "45")]
    pub inference_timeout_secs: u64,

    /// Run without a live inference backend (deterministic canned analyses)
    #[arg(long, env = "OFFLINE", default_value = "false")]
    pub offline: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.offline && self.inference_api_key.is_none() {
            anyhow::bail!(
                "GEMINI_API_KEY is required for live analysis. Use --offline to run without credentials."
            );
        }
        if self.inference_timeout_secs == 0 {
            anyhow::bail!("inference_timeout_secs must be positive");
        }
        Ok(())
    }
}
