//! The four-stage sourcing pipeline.
//!
//! Stages run strictly in sequence with one model call in flight at a time.
//! A stage that fails to render, complete, or parse records a degradation
//! and hands its documented default to the next stage; the run itself
//! always finishes with a report.

use anyhow::Result;
use serde::Serialize;
use sourcing_core::domain::report::{
    RiskAssessment, SourcingReport, SupplierAnalysis, SupplierLead,
};
use tracing::{error, info};
use uuid::Uuid;

use crate::llm::LlmClient;
use crate::parse;
use crate::prompts::PromptSet;
use crate::search::WebSearch;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Research,
    Analyze,
    AssessRisk,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Research, Stage::Analyze, Stage::AssessRisk, Stage::Report];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Analyze => "analyze",
            Self::AssessRisk => "assess_risk",
            Self::Report => "report",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SourcingRequest {
    pub product_category: String,
    pub location_preference: String,
    pub budget_range: String,
    pub sustainability_required: bool,
    pub quality_standards: Vec<String>,
}

impl SourcingRequest {
    pub fn new(product_category: impl Into<String>) -> Self {
        Self {
            product_category: product_category.into(),
            location_preference: "Global".to_string(),
            budget_range: "$10,000-$50,000".to_string(),
            sustainability_required: true,
            quality_standards: Vec::new(),
        }
    }
}

/// One stage that fell back to its default, with the reason it did.
#[derive(Clone, Debug, Serialize)]
pub struct StageDegradation {
    pub stage: Stage,
    pub reason: String,
}

#[derive(Debug, Serialize)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub leads: Vec<SupplierLead>,
    pub analysis: SupplierAnalysis,
    pub risk_assessment: RiskAssessment,
    pub report: SourcingReport,
    pub degraded_stages: Vec<StageDegradation>,
}

impl PipelineOutcome {
    pub fn is_degraded(&self) -> bool {
        !self.degraded_stages.is_empty()
    }
}

pub struct SourcingPipeline {
    llm: Box<dyn LlmClient>,
    search: WebSearch,
    prompts: PromptSet,
    max_suppliers: usize,
}

impl SourcingPipeline {
    pub fn new(llm: Box<dyn LlmClient>, search: WebSearch, max_suppliers: u32) -> Result<Self> {
        Ok(Self {
            llm,
            search,
            prompts: PromptSet::new()?,
            max_suppliers: max_suppliers as usize,
        })
    }

    pub async fn run(&self, request: &SourcingRequest) -> PipelineOutcome {
        let run_id = Uuid::new_v4();
        let mut degraded_stages = Vec::new();
        info!(
            %run_id,
            product_category = %request.product_category,
            location = %request.location_preference,
            "starting sourcing run"
        );

        let leads = self.research(request, run_id, &mut degraded_stages).await;
        let analysis = self.analyze(request, &leads, run_id, &mut degraded_stages).await;
        let risk_assessment = self.assess_risk(&leads, run_id, &mut degraded_stages).await;
        let report = self
            .report(request, &leads, &analysis, &risk_assessment, run_id, &mut degraded_stages)
            .await;

        info!(
            %run_id,
            leads = leads.len(),
            degraded = degraded_stages.len(),
            overall_risk = %report.overall_risk_level,
            "sourcing run finished"
        );

        PipelineOutcome { run_id, leads, analysis, risk_assessment, report, degraded_stages }
    }

    async fn research(
        &self,
        request: &SourcingRequest,
        run_id: Uuid,
        degraded: &mut Vec<StageDegradation>,
    ) -> Vec<SupplierLead> {
        let search_results = self
            .search
            .search_suppliers(&request.product_category, &request.location_preference)
            .await;

        let mut context = tera::Context::new();
        context.insert("product_category", &request.product_category);
        context.insert("location_preference", &request.location_preference);
        context.insert("search_results", &search_results);
        context.insert("max_suppliers", &self.max_suppliers);

        match self.stage_completion(Stage::Research, &context, run_id).await {
            Ok(raw) => {
                let mut leads = parse::parse_supplier_leads(&raw);
                leads.truncate(self.max_suppliers);
                leads
            }
            Err(reason) => {
                degraded.push(StageDegradation { stage: Stage::Research, reason });
                Vec::new()
            }
        }
    }

    async fn analyze(
        &self,
        request: &SourcingRequest,
        leads: &[SupplierLead],
        run_id: Uuid,
        degraded: &mut Vec<StageDegradation>,
    ) -> SupplierAnalysis {
        let mut context = tera::Context::new();
        context.insert("suppliers", &to_json_blob(leads));
        context.insert("quality_standards", &to_json_blob(&request.quality_standards));

        match self.stage_completion(Stage::Analyze, &context, run_id).await {
            Ok(raw) => parse::parse_supplier_analysis(&raw, leads.len()),
            Err(reason) => {
                degraded.push(StageDegradation { stage: Stage::Analyze, reason });
                SupplierAnalysis::default()
            }
        }
    }

    async fn assess_risk(
        &self,
        leads: &[SupplierLead],
        run_id: Uuid,
        degraded: &mut Vec<StageDegradation>,
    ) -> RiskAssessment {
        let mut context = tera::Context::new();
        context.insert("suppliers", &to_json_blob(leads));

        match self.stage_completion(Stage::AssessRisk, &context, run_id).await {
            Ok(raw) => parse::parse_risk_assessment(&raw),
            Err(reason) => {
                degraded.push(StageDegradation { stage: Stage::AssessRisk, reason });
                RiskAssessment::default()
            }
        }
    }

    async fn report(
        &self,
        request: &SourcingRequest,
        leads: &[SupplierLead],
        analysis: &SupplierAnalysis,
        risk_assessment: &RiskAssessment,
        run_id: Uuid,
        degraded: &mut Vec<StageDegradation>,
    ) -> SourcingReport {
        let mut context = tera::Context::new();
        context.insert("product_category", &request.product_category);
        context.insert("budget_range", &request.budget_range);
        context.insert("sustainability_required", &request.sustainability_required);
        context.insert("suppliers", &to_json_blob(leads));
        context.insert("analysis", &to_json_blob(analysis));
        context.insert("risk_assessment", &to_json_blob(risk_assessment));

        match self.stage_completion(Stage::Report, &context, run_id).await {
            Ok(raw) => parse::parse_sourcing_report(
                &raw,
                leads.len(),
                risk_assessment.overall_risk_level,
            ),
            Err(reason) => {
                degraded.push(StageDegradation { stage: Stage::Report, reason });
                SourcingReport {
                    total_suppliers: leads.len(),
                    overall_risk_level: risk_assessment.overall_risk_level,
                    ..SourcingReport::default()
                }
            }
        }
    }

    async fn stage_completion(
        &self,
        stage: Stage,
        context: &tera::Context,
        run_id: Uuid,
    ) -> Result<String, String> {
        let prompt = self.prompts.render(stage, context).map_err(|err| {
            let reason = format!("template render failed: {err}");
            error!(%run_id, stage = stage.name(), %reason, "stage degraded");
            reason
        })?;

        self.llm.complete(&prompt).await.map_err(|err| {
            let reason = format!("model call failed: {err}");
            error!(%run_id, stage = stage.name(), %reason, "stage degraded");
            reason
        })
    }
}

fn to_json_blob<T: Serialize + ?Sized>(value: &T) -> String {
    // Stage inputs are our own serializable types; a failure here would be a
    // serializer bug, so degrade to an empty blob rather than abort.
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use sourcing_core::domain::report::{RiskLevel, SupplierLead};

    use super::{to_json_blob, SourcingPipeline, SourcingRequest, Stage};
    use crate::llm::LlmClient;
    use crate::search::{SearchHit, SearchProvider, WebSearch};

    struct ScriptedLlm {
        responses: Mutex<VecDeque<Result<String>>>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<Result<String>>) -> Self {
            Self { responses: Mutex::new(responses.into_iter().collect()) }
        }

        fn always_failing() -> Self {
            Self::new(Vec::new())
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            let mut responses = self.responses.lock().expect("responses lock");
            responses.pop_front().unwrap_or_else(|| Err(anyhow!("model unavailable")))
        }
    }

    struct FixedProvider;

    #[async_trait]
    impl SearchProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<SearchHit>> {
            Ok(vec![SearchHit {
                title: "Acme Electronics GmbH".to_string(),
                url: "https://acme-electronics.example".to_string(),
                snippet: "Electronic component supplier in Berlin".to_string(),
            }])
        }
    }

    fn scripted_stage_outputs() -> Vec<Result<String>> {
        vec![
            Ok(r#"```json
[
  {"name": "Acme Electronics GmbH", "country": "Germany", "city": "Berlin",
   "website": "https://acme-electronics.example", "specialties": ["sensors"]},
  {"name": "Pacific Components Ltd", "country": "Ireland", "specialties": ["connectors"]}
]
```"#
                .to_string()),
            Ok(r#"```json
{"total_suppliers": 2,
 "analyzed": [{"name": "Acme Electronics GmbH", "scores": {"quality": 8.0, "capacity": 7.0}}],
 "average_scores": {"quality": 8.0}}
```"#
                .to_string()),
            Ok(r#"```json
{"overall_risk_level": "LOW",
 "supplier_risks": {"Acme Electronics GmbH": [{"category": "financial", "level": "LOW", "factors": ["stable revenue"]}]},
 "mitigation_strategies": ["dual sourcing"]}
```"#
                .to_string()),
            Ok(r#"```json
{"executive_summary": "Two credible European suppliers identified.",
 "recommended_count": 2,
 "top_suppliers": [{"name": "Acme Electronics GmbH", "country": "Germany", "score": 7.5, "risk_level": "LOW"}],
 "overall_risk_level": "LOW",
 "estimated_savings": "$12,000 annually"}
```
Full narrative report."#
                .to_string()),
        ]
    }

    fn pipeline(llm: ScriptedLlm, max_suppliers: u32) -> SourcingPipeline {
        SourcingPipeline::new(
            Box::new(llm),
            WebSearch::with_provider(Box::new(FixedProvider)),
            max_suppliers,
        )
        .expect("build pipeline")
    }

    fn european_request() -> SourcingRequest {
        SourcingRequest {
            location_preference: "Europe".to_string(),
            quality_standards: vec!["ISO9001".to_string()],
            ..SourcingRequest::new("electronic components")
        }
    }

    #[tokio::test]
    async fn full_run_produces_structured_outputs_from_every_stage() {
        let pipeline = pipeline(ScriptedLlm::new(scripted_stage_outputs()), 50);
        let outcome = pipeline.run(&european_request()).await;

        assert!(!outcome.is_degraded());
        assert_eq!(outcome.leads.len(), 2);
        assert_eq!(outcome.leads[0].country.as_deref(), Some("Germany"));
        assert_eq!(outcome.analysis.total_suppliers, 2);
        assert_eq!(outcome.risk_assessment.overall_risk_level, RiskLevel::Low);
        assert_eq!(
            outcome.report.executive_summary,
            "Two credible European suppliers identified."
        );
        assert_eq!(outcome.report.total_suppliers, 2);
        assert_eq!(outcome.report.overall_risk_level, RiskLevel::Low);
        assert!(outcome.report.full_report.contains("Full narrative report."));
    }

    #[tokio::test]
    async fn model_failures_degrade_every_stage_but_still_yield_a_report() {
        let pipeline = pipeline(ScriptedLlm::always_failing(), 50);
        let outcome = pipeline.run(&european_request()).await;

        assert_eq!(outcome.degraded_stages.len(), 4);
        let stages: Vec<Stage> =
            outcome.degraded_stages.iter().map(|degradation| degradation.stage).collect();
        assert_eq!(stages, Stage::ALL.to_vec());

        assert!(outcome.leads.is_empty());
        assert_eq!(outcome.analysis.total_suppliers, 0);
        assert_eq!(outcome.risk_assessment.overall_risk_level, RiskLevel::Medium);
        assert_eq!(outcome.report.overall_risk_level, RiskLevel::Medium);
        assert_eq!(outcome.report.executive_summary, "");
        assert_eq!(outcome.report.estimated_savings, "TBD");
    }

    #[tokio::test]
    async fn single_stage_failure_does_not_stop_the_run() {
        let mut responses = scripted_stage_outputs();
        responses[2] = Err(anyhow!("rate limited"));
        let pipeline = pipeline(ScriptedLlm::new(responses), 50);
        let outcome = pipeline.run(&european_request()).await;

        assert_eq!(outcome.degraded_stages.len(), 1);
        assert_eq!(outcome.degraded_stages[0].stage, Stage::AssessRisk);
        assert_eq!(outcome.risk_assessment.overall_risk_level, RiskLevel::Medium);
        assert_eq!(outcome.leads.len(), 2);
        assert_eq!(outcome.report.overall_risk_level, RiskLevel::Medium);
        assert!(!outcome.report.executive_summary.is_empty());
    }

    #[tokio::test]
    async fn research_leads_are_truncated_to_the_configured_maximum() {
        let pipeline = pipeline(ScriptedLlm::new(scripted_stage_outputs()), 1);
        let outcome = pipeline.run(&european_request()).await;

        assert_eq!(outcome.leads.len(), 1);
        assert_eq!(outcome.leads[0].name, "Acme Electronics GmbH");
    }

    #[test]
    fn json_blob_serializes_lead_slices() {
        let leads = vec![SupplierLead {
            name: "Acme Electronics GmbH".to_string(),
            ..SupplierLead::default()
        }];

        let blob = to_json_blob(leads.as_slice());
        assert!(blob.contains("Acme Electronics GmbH"));
        assert_eq!(to_json_blob::<[SupplierLead]>(&[]), "[]");
    }
}
