use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use sourcing_agent::{client_from_config, PipelineOutcome, SourcingPipeline, SourcingRequest, WebSearch};
use sourcing_core::config::{AppConfig, LoadOptions};
use sourcing_core::domain::evaluation::NewEvaluation;
use sourcing_core::domain::supplier::NewSupplier;
use sourcing_core::errors::ApplicationError;
use sourcing_db::{
    connect_with_settings, migrations, EvaluationRepository, SqlEvaluationRepository,
    SqlSupplierRepository, SupplierRepository,
};
use tracing::warn;

use crate::commands::CommandResult;
use crate::render;

pub struct AnalyzeArgs {
    pub product: String,
    pub budget: String,
    pub location: String,
    pub sustainability: bool,
    pub quality: Option<String>,
}

pub fn run(args: AnalyzeArgs) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "analyze",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    init_logging(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "analyze",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let request = SourcingRequest {
        product_category: args.product,
        location_preference: args.location,
        budget_range: args.budget,
        sustainability_required: args.sustainability,
        quality_standards: args
            .quality
            .map(|raw| raw.split(',').map(|entry| entry.trim().to_string()).collect())
            .unwrap_or_default(),
    };

    let result = runtime.block_on(run_analysis(&config, &request));

    match result {
        Ok((outcome, report_path)) => {
            let mut output = render::render_summary(&outcome);
            output.push_str(&format!("\n\nFull report saved to: {}", report_path.display()));
            CommandResult { exit_code: 0, output }
        }
        Err(error) => CommandResult::failure(
            "analyze",
            error.class(),
            error.to_string(),
            exit_code_for(&error),
        ),
    }
}

fn exit_code_for(error: &ApplicationError) -> u8 {
    match error {
        ApplicationError::Configuration(_) => 2,
        ApplicationError::Persistence(_) => 4,
        ApplicationError::Provider(_) => 6,
        ApplicationError::Io(_) => 8,
    }
}

async fn run_analysis(
    config: &AppConfig,
    request: &SourcingRequest,
) -> Result<(PipelineOutcome, PathBuf), ApplicationError> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
    migrations::run_pending(&pool)
        .await
        .map_err(|error| ApplicationError::Persistence(error.to_string()))?;

    if !config.has_search() {
        warn!("no search credential configured, research will run without web results");
    }
    let search = WebSearch::from_config(&config.search);
    let llm = client_from_config(&config.llm)
        .map_err(|error| ApplicationError::Provider(error.to_string()))?;
    let pipeline = SourcingPipeline::new(llm, search, config.sourcing.max_suppliers)
        .map_err(|error| ApplicationError::Provider(error.to_string()))?;

    let outcome = pipeline.run(request).await;

    persist_outcome(&pool, &outcome)
        .await
        .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
    pool.close().await;

    let report_path = write_report_file(config, &outcome)?;

    Ok((outcome, report_path))
}

/// Store every researched lead as a supplier row, and one evaluation row per
/// rubric criterion the analysis stage scored.
async fn persist_outcome(
    pool: &sourcing_db::DbPool,
    outcome: &PipelineOutcome,
) -> Result<(), sourcing_db::RepositoryError> {
    let suppliers = SqlSupplierRepository::new(pool.clone());
    let evaluations = SqlEvaluationRepository::new(pool.clone());

    for lead in &outcome.leads {
        let supplier_id = suppliers.store(NewSupplier::from(lead.clone())).await?;

        let scorecard = outcome
            .analysis
            .analyzed
            .iter()
            .find(|scorecard| scorecard.name == lead.name);
        if let Some(scorecard) = scorecard {
            for (criteria, score) in &scorecard.scores {
                evaluations
                    .record(NewEvaluation {
                        supplier_id,
                        criteria: criteria.clone(),
                        score: *score,
                        notes: scorecard.recommendation.clone(),
                    })
                    .await?;
            }
        }
    }
    Ok(())
}

fn write_report_file(
    config: &AppConfig,
    outcome: &PipelineOutcome,
) -> std::io::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let path = config.sourcing.reports_dir.join(format!("sourcing_report_{timestamp}.json"));

    fs::create_dir_all(&config.sourcing.reports_dir)?;
    let payload = serde_json::to_string_pretty(outcome)
        .map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error))?;
    fs::write(&path, payload)?;
    Ok(path)
}

fn init_logging(config: &AppConfig) {
    use sourcing_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    // try_init: a second invocation in the same process must not panic
    let builder = tracing_subscriber::fmt().with_target(false).with_max_level(log_level);
    let result = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
    let _ = result;
}
