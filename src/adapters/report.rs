use crate::domain::model::{ScreenSummary, VariantRecord};
use crate::utils::error::{PgxError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const REPORT_JSON: &str = "report.json";
pub const REPORT_TEXT: &str = "report.txt";
pub const VARIANTS_CSV: &str = "variants.csv";
pub const BUNDLE_NAME: &str = "pgx_report.zip";

pub fn render_json(summary: &ScreenSummary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Human-readable report: one card per screened drug with the severity
/// indicator, recommendation, confidence bar, genetic findings when a gene
/// was matched, and the explanation text.
pub fn render_text(summary: &ScreenSummary) -> String {
    let mut out = String::new();
    out.push_str("PharmaGuard Screening Report\n");
    out.push_str(&format!(
        "Generated: {}\n",
        summary.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&"=".repeat(50));
    out.push('\n');

    for screen in &summary.screens {
        out.push('\n');
        out.push_str(&format!("{} {}\n", screen.risk.indicator(), screen.drug));
        out.push_str(&format!(
            "   Recommendation: {}\n",
            screen.result.recommendation
        ));
        out.push_str(&format!(
            "   Confidence:     {} {}%\n",
            confidence_bar(screen.result.confidence),
            confidence_percent(screen.result.confidence)
        ));

        if let Some(gene) = &screen.result.gene {
            out.push_str(&format!("   Gene:           {}\n", gene));
            out.push_str(&format!(
                "   Phenotype:      {}\n",
                screen.result.phenotype.as_deref().unwrap_or("Not resolved")
            ));
        }

        if let Some(explanation) = &screen.explanation {
            out.push_str("   Explanation:\n");
            for line in explanation.lines() {
                out.push_str(&format!("     {}\n", line));
            }
        }
    }

    out.push('\n');
    out.push_str(&"-".repeat(50));
    out.push('\n');
    out.push_str(&format!(
        "{} drug(s) screened, {} pharmacogene variant(s) observed\n",
        summary.screens.len(),
        summary.variants.len()
    ));

    out
}

pub fn confidence_bar(confidence: f64) -> String {
    let filled = (confidence.clamp(0.0, 1.0) * 10.0).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(10 - filled))
}

pub fn confidence_percent(confidence: f64) -> i64 {
    (confidence * 100.0).round() as i64
}

pub fn render_variants_csv(variants: &[VariantRecord]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["gene", "variant_id", "star_allele"])?;
    for variant in variants {
        writer.write_record([
            variant.gene.as_str(),
            variant.variant_id.as_str(),
            variant.star_allele.as_deref().unwrap_or(""),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| PgxError::ProcessingError {
            message: format!("Failed to flush variant sheet: {}", e),
        })?;
    String::from_utf8(bytes).map_err(|e| PgxError::ProcessingError {
        message: format!("Variant sheet is not valid UTF-8: {}", e),
    })
}

/// Packs the requested report formats into one zip archive. The JSON report
/// is always present; the variant sheet is only written when variants were
/// observed.
pub fn build_bundle(summary: &ScreenSummary, formats: &[String]) -> Result<Vec<u8>> {
    let wants = |format: &str| formats.iter().any(|f| f == format);

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    zip.start_file::<_, ()>(REPORT_JSON, FileOptions::default())?;
    zip.write_all(render_json(summary)?.as_bytes())?;

    if wants("text") {
        zip.start_file::<_, ()>(REPORT_TEXT, FileOptions::default())?;
        zip.write_all(render_text(summary).as_bytes())?;
    }

    if wants("csv") && !summary.variants.is_empty() {
        zip.start_file::<_, ()>(VARIANTS_CSV, FileOptions::default())?;
        zip.write_all(render_variants_csv(&summary.variants)?.as_bytes())?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{DrugScreen, EvaluationResult};

    fn risk_screen() -> DrugScreen {
        DrugScreen::new(
            "Codeine",
            EvaluationResult {
                gene: Some("CYP2D6".to_string()),
                phenotype: Some("Poor metabolizer".to_string()),
                recommendation: "Ineffective".to_string(),
                confidence: 1.0,
            },
            Some("CYP2D6 poor metabolizers cannot activate codeine.\nConsider an alternative analgesic.".to_string()),
        )
    }

    fn unknown_drug_screen() -> DrugScreen {
        DrugScreen::new(
            "Azathioprine",
            EvaluationResult {
                gene: None,
                phenotype: None,
                recommendation: "Unknown drug".to_string(),
                confidence: 0.0,
            },
            None,
        )
    }

    fn sample_variants() -> Vec<VariantRecord> {
        vec![
            VariantRecord::new("CYP2D6", "rs3892097", Some("*4/*4".to_string())),
            VariantRecord::new("CYP2C19", "rs4244285", None),
        ]
    }

    #[test]
    fn confidence_bar_scales_with_value() {
        assert_eq!(confidence_bar(0.0), "[----------]");
        assert_eq!(confidence_bar(0.5), "[#####-----]");
        assert_eq!(confidence_bar(1.0), "[##########]");
        assert_eq!(confidence_percent(0.33), 33);
        assert_eq!(confidence_percent(1.0), 100);
    }

    #[test]
    fn text_report_shows_findings_only_when_gene_matched() {
        let summary = ScreenSummary::new(
            vec![risk_screen(), unknown_drug_screen()],
            sample_variants(),
        );
        let text = render_text(&summary);

        assert!(text.contains("🔴 Codeine"));
        assert!(text.contains("Recommendation: Ineffective"));
        assert!(text.contains("[##########] 100%"));
        assert!(text.contains("Gene:           CYP2D6"));
        assert!(text.contains("Phenotype:      Poor metabolizer"));
        assert!(text.contains("Consider an alternative analgesic."));

        assert!(text.contains("🔴 Azathioprine"));
        assert!(text.contains("Recommendation: Unknown drug"));
        // 未命中基因的藥物不顯示基因區塊
        let azathioprine_block = text.split("Azathioprine").nth(1).unwrap();
        assert!(!azathioprine_block.contains("Gene:"));

        assert!(text.contains("2 drug(s) screened, 2 pharmacogene variant(s) observed"));
    }

    #[test]
    fn variant_sheet_lists_all_records() {
        let csv = render_variants_csv(&sample_variants()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "gene,variant_id,star_allele");
        assert_eq!(lines[1], "CYP2D6,rs3892097,*4/*4");
        assert_eq!(lines[2], "CYP2C19,rs4244285,");
    }

    #[test]
    fn json_report_omits_absent_gene_fields() {
        let summary = ScreenSummary::new(vec![unknown_drug_screen()], vec![]);
        let json = render_json(&summary).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let screen = &value["screens"][0];
        assert_eq!(screen["drug"], "Azathioprine");
        assert_eq!(screen["risk"], "high");
        assert!(screen["result"].get("gene").is_none());
        assert!(screen["result"].get("phenotype").is_none());
    }

    #[test]
    fn bundle_contains_requested_formats() {
        let summary = ScreenSummary::new(vec![risk_screen()], sample_variants());
        let formats = vec!["json".to_string(), "text".to_string(), "csv".to_string()];
        let bytes = build_bundle(&summary, &formats).unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec![REPORT_JSON, REPORT_TEXT, VARIANTS_CSV]);

        let mut json_file = archive.by_name(REPORT_JSON).unwrap();
        let mut content = String::new();
        std::io::Read::read_to_string(&mut json_file, &mut content).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["screens"][0]["result"]["recommendation"], "Ineffective");
    }

    #[test]
    fn bundle_always_has_json_and_skips_empty_variant_sheet() {
        let summary = ScreenSummary::new(vec![unknown_drug_screen()], vec![]);
        let formats = vec!["csv".to_string()];
        let bytes = build_bundle(&summary, &formats).unwrap();

        let archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
    }
}
