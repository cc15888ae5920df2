use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How boldly the analysis persona should weigh risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Conservative,
    #[default]
    Balanced,
    Aggressive,
}

/// Autopilot tick cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutopilotSpeed {
    #[default]
    Normal,
    Turbo,
}

impl AutopilotSpeed {
    pub fn interval(&self) -> Duration {
        match self {
            AutopilotSpeed::Normal => Duration::from_secs(12),
            AutopilotSpeed::Turbo => Duration::from_secs(4),
        }
    }
}

/// User-tunable configuration. Persisted after every mutation; loaded once
/// at startup with defaults filled in for anything missing or malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub risk_level: RiskLevel,
    pub include_injuries: bool,
    /// Weight of historical head-to-head data, percent.
    pub historical_weight: u32,
    pub ai_model: String,
    pub autopilot: bool,
    pub autopilot_speed: AutopilotSpeed,
    /// Display-only flag surfaced to the dashboard.
    pub hardware_acceleration: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            risk_level: RiskLevel::Balanced,
            include_injuries: true,
            historical_weight: 40,
            ai_model: "gemini-3-flash-preview".to_string(),
            autopilot: false,
            autopilot_speed: AutopilotSpeed::Normal,
            hardware_acceleration: true,
        }
    }
}

/// Partial settings update from the API. Absent fields keep their current
/// values; unknown fields are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsPatch {
    pub risk_level: Option<RiskLevel>,
    pub include_injuries: Option<bool>,
    pub historical_weight: Option<u32>,
    pub ai_model: Option<String>,
    pub autopilot: Option<bool>,
    pub autopilot_speed: Option<AutopilotSpeed>,
    pub hardware_acceleration: Option<bool>,
}

impl SettingsPatch {
    pub fn apply(self, settings: &mut AppSettings) {
        if let Some(v) = self.risk_level {
            settings.risk_level = v;
        }
        if let Some(v) = self.include_injuries {
            settings.include_injuries = v;
        }
        if let Some(v) = self.historical_weight {
            settings.historical_weight = v.min(100);
        }
        if let Some(v) = self.ai_model {
            settings.ai_model = v;
        }
        if let Some(v) = self.autopilot {
            settings.autopilot = v;
        }
        if let Some(v) = self.autopilot_speed {
            settings.autopilot_speed = v;
        }
        if let Some(v) = self.hardware_acceleration {
            settings.hardware_acceleration = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_first_run_expectations() {
        let settings = AppSettings::default();
        assert_eq!(settings.risk_level, RiskLevel::Balanced);
        assert!(settings.include_injuries);
        assert_eq!(settings.historical_weight, 40);
        assert!(!settings.autopilot);
        assert_eq!(settings.autopilot_speed, AutopilotSpeed::Normal);
    }

    #[test]
    fn speed_intervals() {
        assert_eq!(AutopilotSpeed::Normal.interval(), Duration::from_secs(12));
        assert_eq!(AutopilotSpeed::Turbo.interval(), Duration::from_secs(4));
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut settings = AppSettings::default();
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"autopilot": true, "autopilotSpeed": "turbo"}"#).unwrap();
        patch.apply(&mut settings);

        assert!(settings.autopilot);
        assert_eq!(settings.autopilot_speed, AutopilotSpeed::Turbo);
        assert_eq!(settings.risk_level, RiskLevel::Balanced);
        assert_eq!(settings.ai_model, AppSettings::default().ai_model);
    }

    #[test]
    fn patch_clamps_historical_weight() {
        let mut settings = AppSettings::default();
        SettingsPatch {
            historical_weight: Some(250),
            ..SettingsPatch::default()
        }
        .apply(&mut settings);
        assert_eq!(settings.historical_weight, 100);
    }

    #[test]
    fn patch_rejects_unknown_fields() {
        let result: Result<SettingsPatch, _> =
            serde_json::from_str(r#"{"autopilot": true, "turboBoost": 9000}"#);
        assert!(result.is_err());
    }

    #[test]
    fn settings_wire_format_is_camel_case() {
        let json = serde_json::to_value(AppSettings::default()).unwrap();
        assert!(json.get("riskLevel").is_some());
        assert!(json.get("historicalWeight").is_some());
        assert!(json.get("hardwareAcceleration").is_some());
    }
}
