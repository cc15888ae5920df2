use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{League, Match};

/// Time-of-day bucket derived from a match's kickoff hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    #[default]
    All,
    Morning,
    Afternoon,
    Evening,
}

impl TimePeriod {
    pub fn matches_hour(&self, hour: u32) -> bool {
        match self {
            TimePeriod::All => true,
            TimePeriod::Morning => hour < 12,
            TimePeriod::Afternoon => (12..18).contains(&hour),
            TimePeriod::Evening => hour >= 18,
        }
    }
}

/// Either every league or exactly one. Also defines the autopilot rotation
/// order: `All → league 1 → … → league 13 → All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum LeagueSelector {
    #[default]
    All,
    Only(League),
}

impl LeagueSelector {
    pub fn accepts(&self, league: League) -> bool {
        match self {
            LeagueSelector::All => true,
            LeagueSelector::Only(l) => *l == league,
        }
    }

    /// The next selector in the fixed cyclic ordering.
    pub fn next(&self) -> LeagueSelector {
        match self {
            LeagueSelector::All => LeagueSelector::Only(League::ALL[0]),
            LeagueSelector::Only(l) => {
                let idx = League::ALL.iter().position(|c| c == l).unwrap_or(0);
                match League::ALL.get(idx + 1) {
                    Some(next) => LeagueSelector::Only(*next),
                    None => LeagueSelector::All,
                }
            }
        }
    }

    pub fn parse(value: &str) -> Option<LeagueSelector> {
        if value.eq_ignore_ascii_case("all") {
            return Some(LeagueSelector::All);
        }
        League::from_slug(value).map(LeagueSelector::Only)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeagueSelector::All => "all",
            LeagueSelector::Only(l) => l.slug(),
        }
    }
}

impl From<LeagueSelector> for String {
    fn from(value: LeagueSelector) -> Self {
        value.as_str().to_string()
    }
}

impl TryFrom<String> for LeagueSelector {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LeagueSelector::parse(&value).ok_or_else(|| format!("unknown league selector '{value}'"))
    }
}

/// Conjunctive selection over the generated fixture set.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchQuery {
    /// Exact calendar date.
    pub date: NaiveDate,
    pub league: LeagueSelector,
    /// Case-insensitive substring over either team name; empty matches all.
    pub query: String,
    pub period: TimePeriod,
}

impl MatchQuery {
    /// Keep the sub-sequence of `all` satisfying every predicate, in the
    /// original generation order. Pure; no side effects.
    pub fn filter(&self, all: &[Match]) -> Vec<Match> {
        let needle = self.query.trim().to_lowercase();
        all.iter()
            .filter(|m| m.date == self.date)
            .filter(|m| self.league.accepts(m.league))
            .filter(|m| {
                needle.is_empty()
                    || m.home_team.to_lowercase().contains(&needle)
                    || m.away_team.to_lowercase().contains(&needle)
            })
            .filter(|m| self.period.matches_hour(m.kickoff_hour()))
            .cloned()
            .collect()
    }
}
