use serde::{Deserialize, Serialize};

use crate::error::ReportError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub mode: ReportMode,
    #[serde(default = "default_prefix")]
    pub marketplace_prefix: String,
    #[serde(default)]
    pub roas_source: RoasSource,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub layout: LayoutConfig,
}

fn default_prefix() -> String {
    "MLB".into()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            mode: ReportMode::default(),
            marketplace_prefix: default_prefix(),
            roas_source: RoasSource::default(),
            thresholds: Thresholds::default(),
            layout: LayoutConfig::default(),
        }
    }
}

/// Shape of the campaign export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// One row per campaign per day.
    Daily,
    /// One row per campaign, already aggregated by the platform.
    #[default]
    Consolidated,
}

impl std::fmt::Display for ReportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Consolidated => write!(f, "consolidated"),
        }
    }
}

/// Where a campaign's ROAS comes from.
///
/// The platform column may reflect attribution windows a local
/// `revenue / investment` does not, so trusting it is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoasSource {
    #[default]
    Platform,
    Derived,
}

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Decision rule thresholds. Ratios are fractions, lost shares are
/// percentage points, investment is in account currency.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    pub min_visits_for_promotion: f64,
    pub min_organic_conversion_for_promotion: f64,
    pub min_investment_for_pause: f64,
    pub max_cvr_for_pause: f64,
    pub min_lost_share_budget_for_scale: f64,
    pub min_cvr_for_scale: f64,
    pub min_roas_for_scale: f64,
    pub min_lost_share_ranking_for_acos_raise: f64,
    pub min_roas_for_acos_raise: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_visits_for_promotion: 50.0,
            min_organic_conversion_for_promotion: 0.05,
            min_investment_for_pause: 100.0,
            max_cvr_for_pause: 0.01,
            min_lost_share_budget_for_scale: 20.0,
            min_cvr_for_scale: 0.02,
            min_roas_for_scale: 6.0,
            min_lost_share_ranking_for_acos_raise: 30.0,
            min_roas_for_acos_raise: 7.0,
        }
    }
}

impl Thresholds {
    fn named(&self) -> [(&'static str, f64); 9] {
        [
            ("min_visits_for_promotion", self.min_visits_for_promotion),
            ("min_organic_conversion_for_promotion", self.min_organic_conversion_for_promotion),
            ("min_investment_for_pause", self.min_investment_for_pause),
            ("max_cvr_for_pause", self.max_cvr_for_pause),
            ("min_lost_share_budget_for_scale", self.min_lost_share_budget_for_scale),
            ("min_cvr_for_scale", self.min_cvr_for_scale),
            ("min_roas_for_scale", self.min_roas_for_scale),
            ("min_lost_share_ranking_for_acos_raise", self.min_lost_share_ranking_for_acos_raise),
            ("min_roas_for_acos_raise", self.min_roas_for_acos_raise),
        ]
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        for (name, value) in self.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(ReportError::ConfigValidation(format!(
                    "threshold '{name}' must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// 0-based index of each export's header row.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub organic_header_row: usize,
    pub campaign_header_row: usize,
    pub sponsored_header_row: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            organic_header_row: 4,
            campaign_header_row: 1,
            sponsored_header_row: 1,
        }
    }
}

const MAX_HEADER_ROW: usize = 50;

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReportConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReportError> {
        let config: ReportConfig =
            toml::from_str(input).map_err(|e| ReportError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ReportError> {
        toml::to_string_pretty(self).map_err(|e| ReportError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        self.thresholds.validate()?;

        let prefix = &self.marketplace_prefix;
        if !prefix.is_ascii() || prefix.chars().any(char::is_whitespace) {
            return Err(ReportError::ConfigValidation(format!(
                "marketplace_prefix must be ASCII without spaces, got '{prefix}'"
            )));
        }

        let layout = &self.layout;
        for (name, row) in [
            ("organic_header_row", layout.organic_header_row),
            ("campaign_header_row", layout.campaign_header_row),
            ("sponsored_header_row", layout.sponsored_header_row),
        ] {
            if row > MAX_HEADER_ROW {
                return Err(ReportError::ConfigValidation(format!(
                    "layout.{name} must be at most {MAX_HEADER_ROW}, got {row}"
                )));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
