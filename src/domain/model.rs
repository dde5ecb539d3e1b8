use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One decoded line of the variant stream before gene filtering: the record
/// identifier plus its INFO annotations, stringified.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantEntry {
    pub id: String,
    pub info: HashMap<String, String>,
}

/// A pharmacogene observation extracted from the variant stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub gene: String,
    pub variant_id: String,
    pub star_allele: Option<String>,
}

impl VariantRecord {
    pub fn new(gene: impl Into<String>, variant_id: impl Into<String>, star_allele: Option<String>) -> Self {
        Self {
            gene: gene.into(),
            variant_id: variant_id.into(),
            star_allele,
        }
    }
}

/// Outcome of evaluating one drug against the extracted variants.
/// `gene`/`phenotype` are omitted from JSON when the evaluation never
/// matched a required gene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phenotype: Option<String>,
    pub recommendation: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Three-level severity from the recommendation wording: "Safe" is low,
    /// a dose change ("Reduce"/"Adjust") is medium, everything else -
    /// ineffective, toxic, unknown - is high.
    pub fn from_recommendation(recommendation: &str) -> Self {
        if recommendation.contains("Safe") {
            RiskLevel::Low
        } else if recommendation.contains("Reduce") || recommendation.contains("Adjust") {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn indicator(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🔴",
        }
    }
}

/// One screened drug: evaluation result, derived severity, and the optional
/// clinical explanation text.
#[derive(Debug, Clone, Serialize)]
pub struct DrugScreen {
    pub drug: String,
    pub result: EvaluationResult,
    pub risk: RiskLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl DrugScreen {
    pub fn new(drug: impl Into<String>, result: EvaluationResult, explanation: Option<String>) -> Self {
        let risk = RiskLevel::from_recommendation(&result.recommendation);
        Self {
            drug: drug.into(),
            result,
            risk,
            explanation,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenSummary {
    pub generated_at: DateTime<Utc>,
    pub screens: Vec<DrugScreen>,
    pub variants: Vec<VariantRecord>,
}

impl ScreenSummary {
    pub fn new(screens: Vec<DrugScreen>, variants: Vec<VariantRecord>) -> Self {
        Self {
            generated_at: Utc::now(),
            screens,
            variants,
        }
    }

    pub fn highest_risk(&self) -> Option<RiskLevel> {
        self.screens.iter().map(|s| s.risk).max_by_key(|r| match r {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        })
    }
}

/// Settings for the explanation collaborator, assembled by each config
/// surface.
#[derive(Debug, Clone)]
pub struct ExplainSettings {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_follows_recommendation_wording() {
        assert_eq!(RiskLevel::from_recommendation("Safe"), RiskLevel::Low);
        assert_eq!(RiskLevel::from_recommendation("Reduce dose"), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_recommendation("Adjust dosage"), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_recommendation("Ineffective"), RiskLevel::High);
        assert_eq!(RiskLevel::from_recommendation("Toxic risk"), RiskLevel::High);
        assert_eq!(RiskLevel::from_recommendation("Unknown risk"), RiskLevel::High);
        assert_eq!(RiskLevel::from_recommendation("Unknown drug"), RiskLevel::High);
    }

    #[test]
    fn absent_gene_and_phenotype_are_omitted_from_json() {
        let result = EvaluationResult {
            gene: None,
            phenotype: None,
            recommendation: "Unknown drug".to_string(),
            confidence: 0.0,
        };
        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("gene"));
        assert!(!obj.contains_key("phenotype"));
        assert_eq!(obj["recommendation"], "Unknown drug");
        assert_eq!(obj["confidence"], 0.0);
    }

    #[test]
    fn summary_reports_highest_risk_across_screens() {
        let safe = EvaluationResult {
            gene: Some("CYP2D6".to_string()),
            phenotype: Some("Normal metabolizer".to_string()),
            recommendation: "Safe".to_string(),
            confidence: 1.0,
        };
        let medium = EvaluationResult {
            gene: Some("CYP2C9".to_string()),
            phenotype: Some("Poor metabolizer".to_string()),
            recommendation: "Reduce dose".to_string(),
            confidence: 1.0,
        };
        let summary = ScreenSummary::new(
            vec![
                DrugScreen::new("Codeine", safe, None),
                DrugScreen::new("Warfarin", medium, None),
            ],
            vec![],
        );
        assert_eq!(summary.highest_risk(), Some(RiskLevel::Medium));
    }
}
