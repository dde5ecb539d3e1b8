use crate::domain::model::{VariantEntry, VariantRecord};
use crate::utils::error::Result;

/// Genes screened for drug-metabolism variants. Fixed allow-list; anything
/// else in the input stream is ignored.
pub const PHARMACOGENES: [&str; 6] = ["CYP2D6", "CYP2C19", "CYP2C9", "SLCO1B1", "TPMT", "DPYD"];

/// INFO annotation carrying the gene symbol.
pub const GENE_KEY: &str = "GENE";
/// INFO annotation carrying the star-allele genotype.
pub const STAR_KEY: &str = "STAR";

pub fn is_pharmacogene(gene: &str) -> bool {
    PHARMACOGENES.contains(&gene)
}

/// Filters a decoded variant stream down to pharmacogene observations.
///
/// A malformed entry (`Err`) never aborts the pass; it is skipped and the
/// remaining entries are still consumed. Input order is preserved and
/// duplicate genes are all retained - how to use them is the resolver's
/// decision, not extraction's.
pub fn extract_variants<I>(entries: I) -> Vec<VariantRecord>
where
    I: IntoIterator<Item = Result<VariantEntry>>,
{
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                skipped += 1;
                tracing::debug!("Skipping malformed variant record: {}", e);
                continue;
            }
        };

        let gene = match entry.info.get(GENE_KEY) {
            Some(gene) if is_pharmacogene(gene) => gene.clone(),
            _ => continue,
        };

        records.push(VariantRecord::new(
            gene,
            entry.id,
            entry.info.get(STAR_KEY).cloned(),
        ));
    }

    if skipped > 0 {
        tracing::debug!("⏭️ {} malformed records skipped during extraction", skipped);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::PgxError;
    use std::collections::HashMap;

    fn entry(id: &str, pairs: &[(&str, &str)]) -> Result<VariantEntry> {
        let info: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(VariantEntry {
            id: id.to_string(),
            info,
        })
    }

    #[test]
    fn keeps_only_allow_listed_genes() {
        let records = extract_variants(vec![
            entry("rs3892097", &[("GENE", "CYP2D6"), ("STAR", "*4/*4")]),
            entry("rs1042522", &[("GENE", "TP53"), ("STAR", "*1/*1")]),
            entry("rs4149056", &[("GENE", "SLCO1B1"), ("STAR", "*5/*5")]),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].gene, "CYP2D6");
        assert_eq!(records[1].gene, "SLCO1B1");
    }

    #[test]
    fn missing_star_annotation_becomes_none() {
        let records = extract_variants(vec![entry("rs4244285", &[("GENE", "CYP2C19")])]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].star_allele, None);
        assert_eq!(records[0].variant_id, "rs4244285");
    }

    #[test]
    fn entries_without_gene_annotation_are_ignored() {
        let records = extract_variants(vec![entry("rs999", &[("DP", "100")])]);
        assert!(records.is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped_without_aborting() {
        let records = extract_variants(vec![
            entry("rs3892097", &[("GENE", "CYP2D6"), ("STAR", "*1/*4")]),
            Err(PgxError::ProcessingError {
                message: "unparseable line".to_string(),
            }),
            entry("rs1800462", &[("GENE", "TPMT"), ("STAR", "*3A/*3A")]),
        ]);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].gene, "CYP2D6");
        assert_eq!(records[1].gene, "TPMT");
    }

    #[test]
    fn input_order_and_duplicates_are_preserved() {
        let records = extract_variants(vec![
            entry("rs1", &[("GENE", "DPYD"), ("STAR", "*1/*1")]),
            entry("rs2", &[("GENE", "DPYD"), ("STAR", "*2A/*2A")]),
            entry("rs3", &[("GENE", "CYP2C9"), ("STAR", "*1/*3")]),
        ]);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].star_allele.as_deref(), Some("*1/*1"));
        assert_eq!(records[1].star_allele.as_deref(), Some("*2A/*2A"));
        assert_eq!(records[2].gene, "CYP2C9");
    }
}
