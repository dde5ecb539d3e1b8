use crate::domain::model::{EvaluationResult, VariantRecord};
use crate::utils::error::{PgxError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const RECOMMEND_SAFE: &str = "Safe";
pub const RECOMMEND_UNKNOWN_RISK: &str = "Unknown risk";
pub const RECOMMEND_UNKNOWN_DRUG: &str = "Unknown drug";
pub const RECOMMEND_GENE_NOT_FOUND: &str = "Unknown risk (gene not found)";

/// One drug's screening rule: the genes it depends on, the phenotype that
/// triggers the risk outcome, and the recommendation issued on that trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct DrugRule {
    pub genes: Vec<String>,
    pub risk_phenotype: String,
    pub risk_recommendation: String,
}

impl DrugRule {
    pub fn new(genes: &[&str], risk_phenotype: &str, risk_recommendation: &str) -> Self {
        Self {
            genes: genes.iter().map(|g| g.to_string()).collect(),
            risk_phenotype: risk_phenotype.to_string(),
            risk_recommendation: risk_recommendation.to_string(),
        }
    }
}

/// Static drug → rule table. Built once at startup and never mutated;
/// evaluation only reads it.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: HashMap<String, DrugRule>,
}

impl RuleSet {
    pub fn new(rules: HashMap<String, DrugRule>) -> Self {
        Self { rules }
    }

    /// The compiled-in rule table. Drug names are matched exactly.
    pub fn builtin() -> Self {
        let mut rules = HashMap::new();
        rules.insert(
            "Codeine".to_string(),
            DrugRule::new(&["CYP2D6"], "Poor metabolizer", "Ineffective"),
        );
        rules.insert(
            "Warfarin".to_string(),
            DrugRule::new(&["CYP2C9"], "Poor metabolizer", "Reduce dose"),
        );
        rules.insert(
            "Simvastatin".to_string(),
            DrugRule::new(&["SLCO1B1"], "High toxicity risk", "Toxic risk"),
        );
        Self { rules }
    }

    pub fn get(&self, drug: &str) -> Option<&DrugRule> {
        self.rules.get(drug)
    }

    pub fn drug_count(&self) -> usize {
        self.rules.len()
    }

    pub fn known_drugs(&self) -> Vec<&str> {
        let mut drugs: Vec<&str> = self.rules.keys().map(|k| k.as_str()).collect();
        drugs.sort_unstable();
        drugs
    }
}

/// Gene → star-allele → metabolizer phenotype lookup. Same lifecycle as
/// [`RuleSet`]: loaded before the first evaluation, read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhenotypeTable {
    genes: HashMap<String, HashMap<String, String>>,
}

impl PhenotypeTable {
    /// The compiled-in table: CPIC-style phenotype labels for the six
    /// screened pharmacogenes.
    pub fn builtin() -> Self {
        let mut genes = HashMap::new();
        genes.insert(
            "CYP2D6".to_string(),
            star_map(&[
                ("*1/*1", "Normal metabolizer"),
                ("*1/*4", "Intermediate metabolizer"),
                ("*4/*4", "Poor metabolizer"),
                ("*1/*1xN", "Ultrarapid metabolizer"),
            ]),
        );
        genes.insert(
            "CYP2C19".to_string(),
            star_map(&[
                ("*1/*1", "Normal metabolizer"),
                ("*1/*2", "Intermediate metabolizer"),
                ("*2/*2", "Poor metabolizer"),
                ("*17/*17", "Ultrarapid metabolizer"),
            ]),
        );
        genes.insert(
            "CYP2C9".to_string(),
            star_map(&[
                ("*1/*1", "Normal metabolizer"),
                ("*1/*3", "Intermediate metabolizer"),
                ("*2/*3", "Poor metabolizer"),
                ("*3/*3", "Poor metabolizer"),
            ]),
        );
        genes.insert(
            "SLCO1B1".to_string(),
            star_map(&[
                ("*1/*1", "Normal function"),
                ("*1/*5", "Decreased function"),
                ("*5/*5", "High toxicity risk"),
                ("*15/*15", "High toxicity risk"),
            ]),
        );
        genes.insert(
            "TPMT".to_string(),
            star_map(&[
                ("*1/*1", "Normal metabolizer"),
                ("*1/*3A", "Intermediate metabolizer"),
                ("*3A/*3A", "Poor metabolizer"),
            ]),
        );
        genes.insert(
            "DPYD".to_string(),
            star_map(&[
                ("*1/*1", "Normal metabolizer"),
                ("*1/*2A", "Intermediate metabolizer"),
                ("*2A/*2A", "Poor metabolizer"),
            ]),
        );
        Self { genes }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PgxError::ConfigError {
            message: format!("Failed to parse phenotype table: {}", e),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PgxError::ConfigError {
            message: format!("Failed to read phenotype table '{}': {}", path.display(), e),
        })?;
        Self::from_json_str(&content)
    }

    pub fn lookup(&self, gene: &str, star_allele: Option<&str>) -> Option<&str> {
        let star = star_allele?;
        self.genes.get(gene)?.get(star).map(|s| s.as_str())
    }

    pub fn gene_count(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

fn star_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(star, phenotype)| (star.to_string(), phenotype.to_string()))
        .collect()
}

/// Scan state while walking a rule's genes against the variant records.
///
/// `Risk` is absorbing: once a variant resolves to the rule's exact risk
/// phenotype, no further gene or variant is scanned. `Safe` and `Unknown`
/// follow last-write-wins in scan order. `NoMatch` only survives when no
/// required gene had any record at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    NoMatch,
    Safe,
    Unknown,
    Risk,
}

/// Pure per-drug evaluation over the two static tables.
///
/// Shared by reference across concurrent screenings; holds no mutable state.
#[derive(Debug, Clone)]
pub struct RiskResolver {
    rules: RuleSet,
    phenotypes: PhenotypeTable,
}

impl RiskResolver {
    pub fn new(rules: RuleSet, phenotypes: PhenotypeTable) -> Self {
        Self { rules, phenotypes }
    }

    pub fn with_builtin_rules(phenotypes: PhenotypeTable) -> Self {
        Self::new(RuleSet::builtin(), phenotypes)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn phenotypes(&self) -> &PhenotypeTable {
        &self.phenotypes
    }

    /// Evaluates one drug against the extracted variants.
    ///
    /// Never fails: an unrecognized drug or an absent gene degrades to a
    /// zero-confidence result with an explanatory recommendation. Confidence
    /// is the fraction of the rule's genes with at least one observed record
    /// (counted once per gene, not per record), rounded to two decimals.
    pub fn evaluate(&self, drug: &str, variants: &[VariantRecord]) -> EvaluationResult {
        let rule = match self.rules.get(drug) {
            Some(rule) => rule,
            None => {
                return EvaluationResult {
                    gene: None,
                    phenotype: None,
                    recommendation: RECOMMEND_UNKNOWN_DRUG.to_string(),
                    confidence: 0.0,
                }
            }
        };

        let mut state = ScanState::NoMatch;
        let mut phenotype_result: Option<String> = None;
        let mut found_genes = 0usize;
        let mut last_gene: Option<&str> = None;

        'genes: for gene in &rule.genes {
            last_gene = Some(gene);
            let mut gene_seen = false;

            for variant in variants.iter().filter(|v| v.gene == *gene) {
                if !gene_seen {
                    gene_seen = true;
                    found_genes += 1;
                }

                match self.phenotypes.lookup(gene, variant.star_allele.as_deref()) {
                    Some(phenotype) if phenotype == rule.risk_phenotype => {
                        phenotype_result = Some(phenotype.to_string());
                        state = ScanState::Risk;
                        break 'genes;
                    }
                    Some(phenotype) => {
                        phenotype_result = Some(phenotype.to_string());
                        state = ScanState::Safe;
                    }
                    None => {
                        // 表中查不到星號等位基因時不清除已解析的表型
                        state = ScanState::Unknown;
                    }
                }
            }
        }

        if found_genes == 0 {
            return EvaluationResult {
                gene: None,
                phenotype: None,
                recommendation: RECOMMEND_GENE_NOT_FOUND.to_string(),
                confidence: 0.0,
            };
        }

        let confidence = round2(found_genes as f64 / rule.genes.len() as f64);
        let recommendation = match state {
            ScanState::Risk => rule.risk_recommendation.clone(),
            ScanState::Safe => RECOMMEND_SAFE.to_string(),
            ScanState::Unknown | ScanState::NoMatch => RECOMMEND_UNKNOWN_RISK.to_string(),
        };

        EvaluationResult {
            gene: last_gene.map(|g| g.to_string()),
            phenotype: phenotype_result,
            recommendation,
            confidence,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(gene: &str, star: Option<&str>) -> VariantRecord {
        VariantRecord::new(gene, "rs0", star.map(|s| s.to_string()))
    }

    fn resolver() -> RiskResolver {
        RiskResolver::with_builtin_rules(PhenotypeTable::builtin())
    }

    fn two_gene_resolver() -> RiskResolver {
        let mut rules = HashMap::new();
        rules.insert(
            "Thiopurine".to_string(),
            DrugRule::new(&["TPMT", "DPYD"], "Poor metabolizer", "Avoid"),
        );
        RiskResolver::new(RuleSet::new(rules), PhenotypeTable::builtin())
    }

    #[test]
    fn builtin_tables_cover_expected_drugs_and_genes() {
        let resolver = resolver();
        assert_eq!(resolver.rules().drug_count(), 3);
        assert_eq!(
            resolver.rules().known_drugs(),
            vec!["Codeine", "Simvastatin", "Warfarin"]
        );
        assert_eq!(resolver.phenotypes().gene_count(), 6);
        assert_eq!(
            resolver.phenotypes().lookup("CYP2D6", Some("*4/*4")),
            Some("Poor metabolizer")
        );
    }

    #[test]
    fn unknown_drug_is_terminal_with_zero_confidence() {
        let result = resolver().evaluate("Azathioprine", &[record("TPMT", Some("*3A/*3A"))]);
        assert_eq!(result.recommendation, RECOMMEND_UNKNOWN_DRUG);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.gene, None);
        assert_eq!(result.phenotype, None);
    }

    #[test]
    fn missing_required_gene_reports_gene_not_found() {
        let result = resolver().evaluate("Warfarin", &[record("CYP2D6", Some("*1/*1"))]);
        assert_eq!(result.recommendation, RECOMMEND_GENE_NOT_FOUND);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.gene, None);
        assert_eq!(result.phenotype, None);
    }

    #[test]
    fn risk_phenotype_triggers_rule_recommendation() {
        let result = resolver().evaluate("Codeine", &[record("CYP2D6", Some("*4/*4"))]);
        assert_eq!(result.gene.as_deref(), Some("CYP2D6"));
        assert_eq!(result.phenotype.as_deref(), Some("Poor metabolizer"));
        assert_eq!(result.recommendation, "Ineffective");
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn non_risk_phenotype_is_safe() {
        let result = resolver().evaluate("Codeine", &[record("CYP2D6", Some("*1/*1"))]);
        assert_eq!(result.recommendation, RECOMMEND_SAFE);
        assert_eq!(result.phenotype.as_deref(), Some("Normal metabolizer"));
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn unknown_star_allele_reports_unknown_risk_with_null_phenotype() {
        let result = resolver().evaluate("Simvastatin", &[record("SLCO1B1", Some("*99/*99"))]);
        assert_eq!(result.recommendation, RECOMMEND_UNKNOWN_RISK);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.gene.as_deref(), Some("SLCO1B1"));
        assert_eq!(result.phenotype, None);
    }

    #[test]
    fn missing_star_allele_behaves_like_unknown() {
        let result = resolver().evaluate("Codeine", &[record("CYP2D6", None)]);
        assert_eq!(result.recommendation, RECOMMEND_UNKNOWN_RISK);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.phenotype, None);
    }

    #[test]
    fn risk_match_short_circuits_later_records() {
        let result = resolver().evaluate(
            "Codeine",
            &[
                record("CYP2D6", Some("*4/*4")),
                record("CYP2D6", Some("*1/*1")),
            ],
        );
        assert_eq!(result.recommendation, "Ineffective");
        assert_eq!(result.phenotype.as_deref(), Some("Poor metabolizer"));
    }

    #[test]
    fn later_unknown_overwrites_safe_recommendation_but_keeps_phenotype() {
        let result = resolver().evaluate(
            "Codeine",
            &[
                record("CYP2D6", Some("*1/*1")),
                record("CYP2D6", Some("*77/*77")),
            ],
        );
        assert_eq!(result.recommendation, RECOMMEND_UNKNOWN_RISK);
        assert_eq!(result.phenotype.as_deref(), Some("Normal metabolizer"));
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn later_safe_record_overwrites_earlier_unknown() {
        let result = resolver().evaluate(
            "Codeine",
            &[
                record("CYP2D6", Some("*77/*77")),
                record("CYP2D6", Some("*1/*4")),
            ],
        );
        assert_eq!(result.recommendation, RECOMMEND_SAFE);
        assert_eq!(result.phenotype.as_deref(), Some("Intermediate metabolizer"));
    }

    #[test]
    fn found_genes_counts_genes_not_records() {
        // 同一基因的多筆紀錄只計一次
        let result = two_gene_resolver().evaluate(
            "Thiopurine",
            &[
                record("TPMT", Some("*1/*1")),
                record("TPMT", Some("*1/*3A")),
            ],
        );
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.recommendation, RECOMMEND_SAFE);
    }

    #[test]
    fn confidence_is_rounded_to_two_decimals() {
        let mut rules = HashMap::new();
        rules.insert(
            "Triple".to_string(),
            DrugRule::new(&["TPMT", "DPYD", "CYP2C9"], "Poor metabolizer", "Avoid"),
        );
        let resolver = RiskResolver::new(RuleSet::new(rules), PhenotypeTable::builtin());

        let result = resolver.evaluate("Triple", &[record("TPMT", Some("*1/*1"))]);
        assert_eq!(result.confidence, 0.33);

        let result = resolver.evaluate(
            "Triple",
            &[
                record("TPMT", Some("*1/*1")),
                record("DPYD", Some("*1/*1")),
            ],
        );
        assert_eq!(result.confidence, 0.67);
    }

    #[test]
    fn risk_on_first_gene_stops_scanning_second() {
        let result = two_gene_resolver().evaluate(
            "Thiopurine",
            &[
                record("TPMT", Some("*3A/*3A")),
                record("DPYD", Some("*1/*1")),
            ],
        );
        assert_eq!(result.recommendation, "Avoid");
        assert_eq!(result.gene.as_deref(), Some("TPMT"));
        // DPYD 在短路後不再掃描，所以不計入信心值
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn gene_field_reports_last_iterated_gene_not_match_origin() {
        // 只有第一個基因有紀錄；回傳的 gene 仍是掃描到的最後一個基因
        let result = two_gene_resolver().evaluate("Thiopurine", &[record("TPMT", Some("*1/*1"))]);
        assert_eq!(result.gene.as_deref(), Some("DPYD"));
        assert_eq!(result.phenotype.as_deref(), Some("Normal metabolizer"));
        assert_eq!(result.recommendation, RECOMMEND_SAFE);
    }

    #[test]
    fn later_gene_overrides_earlier_safe_phenotype() {
        let result = two_gene_resolver().evaluate(
            "Thiopurine",
            &[
                record("TPMT", Some("*1/*1")),
                record("DPYD", Some("*1/*2A")),
            ],
        );
        assert_eq!(result.phenotype.as_deref(), Some("Intermediate metabolizer"));
        assert_eq!(result.recommendation, RECOMMEND_SAFE);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn phenotype_table_round_trips_through_json() {
        let json = r#"{"CYP2D6": {"*4/*4": "Poor metabolizer"}}"#;
        let table = PhenotypeTable::from_json_str(json).unwrap();
        assert_eq!(table.gene_count(), 1);
        assert_eq!(table.lookup("CYP2D6", Some("*4/*4")), Some("Poor metabolizer"));
        assert_eq!(table.lookup("CYP2D6", Some("*1/*1")), None);
        assert_eq!(table.lookup("CYP2D6", None), None);
        assert_eq!(table.lookup("TPMT", Some("*4/*4")), None);
    }

    #[test]
    fn malformed_phenotype_table_is_a_config_error() {
        let err = PhenotypeTable::from_json_str("not json").unwrap_err();
        assert!(matches!(err, PgxError::ConfigError { .. }));
    }
}
