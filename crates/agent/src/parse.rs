//! Parsers for model output, one per stage.
//!
//! Model text is untrusted. Each parser looks for a fenced or inline JSON
//! payload and falls back to the stage's documented default when nothing
//! usable is found, so a bad completion degrades a run instead of aborting
//! it.

use serde::de::DeserializeOwned;
use sourcing_core::domain::report::{
    RiskAssessment, RiskLevel, SourcingReport, SupplierAnalysis, SupplierLead, TopSupplier,
};
use tracing::debug;

/// Pull the first JSON payload out of a completion. Prefers a fenced code
/// block; falls back to the first balanced object or array in the raw text.
pub fn extract_json(raw: &str) -> Option<&str> {
    if let Some(fenced) = extract_fenced_block(raw) {
        return Some(fenced);
    }
    extract_balanced(raw)
}

fn extract_fenced_block(raw: &str) -> Option<&str> {
    let open = raw.find("```")?;
    let after_fence = &raw[open + 3..];
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    let candidate = body[..close].trim();
    if candidate.starts_with('{') || candidate.starts_with('[') {
        Some(candidate)
    } else {
        None
    }
}

fn extract_balanced(raw: &str) -> Option<&str> {
    let start = raw.find(['{', '['])?;
    let bytes = raw.as_bytes();
    let (open, close) = if bytes[start] == b'{' { (b'{', b'}') } else { (b'[', b']') };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b if b == open => depth += 1,
            b if b == close => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_payload<T: DeserializeOwned>(stage: &str, raw: &str) -> Option<T> {
    let payload = extract_json(raw)?;
    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(error) => {
            debug!(stage, %error, "stage payload did not match schema");
            None
        }
    }
}

/// Research output: a list of leads. Unparseable output yields no leads.
pub fn parse_supplier_leads(raw: &str) -> Vec<SupplierLead> {
    let leads: Vec<SupplierLead> = parse_payload("research", raw).unwrap_or_default();
    leads.into_iter().filter(|lead| !lead.name.trim().is_empty()).collect()
}

/// Analysis output. The parsed supplier count is reconciled with the actual
/// lead count so later stages never see an inflated total.
pub fn parse_supplier_analysis(raw: &str, lead_count: usize) -> SupplierAnalysis {
    let mut analysis: SupplierAnalysis = parse_payload("analyze", raw).unwrap_or_default();
    analysis.total_suppliers = analysis.total_suppliers.min(lead_count);
    analysis
}

/// Risk output. The default assessment reports MEDIUM overall with no
/// per-supplier findings.
pub fn parse_risk_assessment(raw: &str) -> RiskAssessment {
    parse_payload("assess_risk", raw).unwrap_or_default()
}

/// Report output: a JSON preamble with the headline fields, followed by the
/// narrative. The raw completion is always preserved as `full_report`, and
/// the totals established by earlier stages win over whatever the model
/// echoed back.
pub fn parse_sourcing_report(
    raw: &str,
    total_suppliers: usize,
    overall_risk_level: RiskLevel,
) -> SourcingReport {
    #[derive(Default, serde::Deserialize)]
    struct ReportPreamble {
        #[serde(default)]
        executive_summary: String,
        #[serde(default)]
        recommended_count: usize,
        #[serde(default)]
        top_suppliers: Vec<TopSupplier>,
        #[serde(default)]
        estimated_savings: Option<String>,
    }

    let preamble: ReportPreamble = parse_payload("report", raw).unwrap_or_default();
    SourcingReport {
        executive_summary: preamble.executive_summary,
        total_suppliers,
        recommended_count: preamble.recommended_count,
        top_suppliers: preamble.top_suppliers,
        overall_risk_level,
        estimated_savings: preamble.estimated_savings.unwrap_or_else(|| "TBD".to_string()),
        full_report: raw.to_string(),
        ..SourcingReport::default()
    }
}
