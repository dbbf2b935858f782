//! Typed outputs of the four sourcing pipeline stages.
//!
//! The source system documented these shapes only in prompt text and left
//! its parsers unimplemented; the structs here are the explicit schema the
//! pipeline parses into, and each carries the default the stage degrades to
//! when a model call fails or its output is unparseable.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::supplier::NewSupplier;

/// A supplier discovered by the research stage, before persistence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierLead {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub specialties: Vec<String>,
}

impl From<SupplierLead> for NewSupplier {
    fn from(lead: SupplierLead) -> Self {
        NewSupplier {
            name: lead.name,
            website: lead.website,
            country: lead.country,
            city: lead.city,
            product_categories: lead.specialties,
            ..NewSupplier::default()
        }
    }
}

/// Per-supplier rubric scores from the analyze stage, 1–10 per criterion.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierScorecard {
    pub name: String,
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
    #[serde(default)]
    pub recommendation: Option<String>,
}

impl SupplierScorecard {
    pub fn overall_score(&self) -> f64 {
        if self.scores.is_empty() {
            return 0.0;
        }
        self.scores.values().sum::<f64>() / self.scores.len() as f64
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplierAnalysis {
    pub total_suppliers: usize,
    #[serde(default)]
    pub analyzed: Vec<SupplierScorecard>,
    #[serde(default)]
    pub average_scores: BTreeMap<String, f64>,
}

/// Ordinal risk scale shared by the risk stage and the final report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown risk level `{0}` (expected LOW|MEDIUM|HIGH|CRITICAL)")]
pub struct ParseRiskLevelError(pub String);

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = ParseRiskLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(ParseRiskLevelError(other.to_string())),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The eight risk categories the assessment stage scores, in prompt order.
pub const RISK_CATEGORIES: &[&str] = &[
    "financial",
    "operational",
    "geopolitical",
    "compliance",
    "cybersecurity",
    "reputation",
    "supply_chain",
    "environmental",
];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskFinding {
    pub category: String,
    #[serde(default)]
    pub level: RiskLevel,
    #[serde(default)]
    pub factors: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall_risk_level: RiskLevel,
    #[serde(default)]
    pub supplier_risks: BTreeMap<String, Vec<RiskFinding>>,
    #[serde(default)]
    pub mitigation_strategies: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopSupplier {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub risk_level: RiskLevel,
}

/// Final synthesized report. The report stage wraps the raw model narrative
/// and echoes counts established by the earlier stages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourcingReport {
    pub executive_summary: String,
    pub total_suppliers: usize,
    pub recommended_count: usize,
    pub top_suppliers: Vec<TopSupplier>,
    pub overall_risk_level: RiskLevel,
    pub estimated_savings: String,
    pub generated_at: DateTime<Utc>,
    pub full_report: String,
}

impl Default for SourcingReport {
    fn default() -> Self {
        Self {
            executive_summary: String::new(),
            total_suppliers: 0,
            recommended_count: 0,
            top_suppliers: Vec::new(),
            overall_risk_level: RiskLevel::default(),
            estimated_savings: "TBD".to_string(),
            generated_at: Utc::now(),
            full_report: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RiskLevel, SupplierScorecard};

    #[test]
    fn risk_levels_are_ordered_low_to_critical() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn risk_level_round_trips_through_uppercase_labels() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::Critical] {
            assert_eq!(level.as_str().parse::<RiskLevel>(), Ok(level));
        }
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn overall_score_averages_rubric_entries() {
        let mut scorecard = SupplierScorecard { name: "Acme".to_string(), ..Default::default() };
        scorecard.scores.insert("quality".to_string(), 8.0);
        scorecard.scores.insert("delivery".to_string(), 6.0);
        assert!((scorecard.overall_score() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_scorecard_scores_zero() {
        let scorecard = SupplierScorecard::default();
        assert_eq!(scorecard.overall_score(), 0.0);
    }
}
