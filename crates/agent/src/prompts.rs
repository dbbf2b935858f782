//! Embedded prompt templates, one per pipeline stage.

use tera::{Context, Tera};

use crate::pipeline::Stage;

pub struct PromptSet {
    tera: Tera,
}

impl PromptSet {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            template_name(Stage::Research),
            include_str!("../../../templates/prompts/research.txt.tera"),
        )?;
        tera.add_raw_template(
            template_name(Stage::Analyze),
            include_str!("../../../templates/prompts/analyze.txt.tera"),
        )?;
        tera.add_raw_template(
            template_name(Stage::AssessRisk),
            include_str!("../../../templates/prompts/assess_risk.txt.tera"),
        )?;
        tera.add_raw_template(
            template_name(Stage::Report),
            include_str!("../../../templates/prompts/report.txt.tera"),
        )?;
        Ok(Self { tera })
    }

    pub fn render(&self, stage: Stage, context: &Context) -> Result<String, tera::Error> {
        self.tera.render(template_name(stage), context)
    }
}

fn template_name(stage: Stage) -> &'static str {
    match stage {
        Stage::Research => "research.txt.tera",
        Stage::Analyze => "analyze.txt.tera",
        Stage::AssessRisk => "assess_risk.txt.tera",
        Stage::Report => "report.txt.tera",
    }
}
