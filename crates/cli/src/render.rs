//! Plain-text rendering of a finished sourcing run.

use sourcing_agent::PipelineOutcome;
use sourcing_core::domain::report::SourcingReport;

/// Two-table summary: headline metrics, then the top recommended suppliers.
pub fn render_summary(outcome: &PipelineOutcome) -> String {
    let report = &outcome.report;
    let mut lines = Vec::new();

    lines.push("SOURCING ANALYSIS RESULTS".to_string());
    lines.push("=".repeat(50));
    lines.push(String::new());

    if !report.executive_summary.is_empty() {
        lines.push(report.executive_summary.clone());
        lines.push(String::new());
    }

    lines.push("Executive Summary".to_string());
    for (metric, value) in summary_rows(report) {
        lines.push(format!("  {metric:<22} {value}"));
    }

    if !report.top_suppliers.is_empty() {
        lines.push(String::new());
        lines.push("Top Recommended Suppliers".to_string());
        let name_width = report
            .top_suppliers
            .iter()
            .take(5)
            .map(|supplier| supplier.name.len())
            .max()
            .unwrap_or(4)
            .max(4);
        lines.push(format!("  {:<4} {:<name_width$}  {:<15} {:<8} {}", "Rank", "Name", "Country", "Score", "Risk"));
        for (rank, supplier) in report.top_suppliers.iter().take(5).enumerate() {
            lines.push(format!(
                "  {:<4} {:<name_width$}  {:<15} {:<8} {}",
                rank + 1,
                supplier.name,
                supplier.country.as_deref().unwrap_or("Unknown"),
                format!("{:.1}/10", supplier.score),
                supplier.risk_level,
            ));
        }
    }

    if !outcome.degraded_stages.is_empty() {
        lines.push(String::new());
        lines.push("Degraded stages".to_string());
        for degradation in &outcome.degraded_stages {
            lines.push(format!("  - {}: {}", degradation.stage.name(), degradation.reason));
        }
    }

    lines.join("\n")
}

fn summary_rows(report: &SourcingReport) -> Vec<(&'static str, String)> {
    vec![
        ("Suppliers Found", report.total_suppliers.to_string()),
        ("Recommended Suppliers", report.recommended_count.to_string()),
        ("Risk Level", report.overall_risk_level.to_string()),
        ("Estimated Savings", report.estimated_savings.clone()),
    ]
}
