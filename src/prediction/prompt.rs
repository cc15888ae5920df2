//! Prompt templates for match analysis.
//!
//! Builds the persona/system instruction and the per-match analysis
//! directive sent to the inference service. Everything the model needs is
//! embedded as text; the strict output contract travels separately as a
//! response schema.

use crate::schedule::Match;
use crate::state::settings::{AppSettings, RiskLevel};

impl RiskLevel {
    /// How the persona should weigh risk when recommending bets.
    pub fn directive(&self) -> &'static str {
        match self {
            RiskLevel::Conservative => {
                "Favour low-variance outcomes and only recommend bets with a clear statistical cushion."
            }
            RiskLevel::Balanced => {
                "Balance expected value against variance; recommend the single best-value bet."
            }
            RiskLevel::Aggressive => {
                "Chase high-value longshots when the data supports them, accepting higher variance."
            }
        }
    }
}

/// The persona/system instruction, parameterized by the user's settings.
pub fn system_instruction(settings: &AppSettings) -> String {
    let mut s = String::with_capacity(512);
    s.push_str(
        "You are Matchscout, a predictive intelligence engine for European football. \
         Your analysis must be rigorous and grounded in recent statistical data \
         (xG, form, squad availability) together with live information from web search. \
         Maintain a professional, technical tone.\n",
    );
    s.push_str(&format!("Risk bias: {}\n", settings.risk_level.directive()));
    if settings.include_injuries {
        s.push_str("Weigh confirmed injuries and suspensions into the probabilities.\n");
    } else {
        s.push_str("Ignore injury news; assume full-strength squads.\n");
    }
    s.push_str(&format!(
        "Weight historical head-to-head data at roughly {}% against current form.",
        settings.historical_weight
    ));
    s
}

/// The per-match analysis directive.
pub fn build_match_prompt(m: &Match) -> String {
    format!(
        "Analyze the fixture: {home} vs {away} ({league}).\n\
         Event date: {date}, kickoff {kickoff}.\n\
         Use web search to verify breaking news, key player suspensions and weather conditions.\n\
         Return the result as a single structured JSON object.",
        home = m.home_team,
        away = m.away_team,
        league = m.league.display_name(),
        date = m.date,
        kickoff = m.kickoff,
    )
}
