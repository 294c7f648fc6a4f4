//! Balanza batch reporter
//!
//! Runs one statement generation for the configured job and writes the
//! materialized rows as JSON to stdout.

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use balanza_core::statement::{
    ExportFormat, GenerateRequest, GenerationSummary, PositionResult, RenderError, ReportScope,
    StatementDocument, StatementRenderer, StatementService,
};
use balanza_db::{StatementRepository, connect};
use balanza_shared::AppConfig;
use balanza_shared::types::PageRequest;

/// Renderer for batch runs, which only emit JSON rows.
struct BatchRenderer;

impl StatementRenderer for BatchRenderer {
    fn render(
        &self,
        format: ExportFormat,
        _document: &StatementDocument,
    ) -> Result<Vec<u8>, RenderError> {
        Err(RenderError(format!("{format:?} export is not available in batch runs")))
    }
}

#[derive(Serialize)]
struct Output {
    summary: GenerationSummary,
    rows: Vec<PositionResult>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "balanza=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let job = config
        .job
        .clone()
        .context("No job configured; set BALANZA__JOB__* or a [job] section")?;

    let db = connect(&config.database).await?;
    info!("Connected to database");

    let repository = Arc::new(StatementRepository::new(db));
    let page_size = config.statement.page_size;
    let service = StatementService::new(
        Arc::clone(&repository),
        repository,
        Arc::new(BatchRenderer),
        config.statement,
    );

    let scope = ReportScope::new(job.company, job.report_type, job.books);
    let summary = service
        .generate(GenerateRequest {
            scope: scope.clone(),
            as_of: job.as_of,
            owner: job.owner.clone(),
            comparison_date: job.comparison_date,
        })
        .await?;

    let mut rows = Vec::with_capacity(summary.rows);
    let mut page = PageRequest::new(1, page_size);
    loop {
        let response = service.fetch_page(&scope, &job.owner, page.clone()).await?;
        rows.extend(response.data);
        if !response.meta.has_next {
            break;
        }
        page.page += 1;
    }

    info!(
        generation_id = %summary.generation_id,
        rows = rows.len(),
        "Writing statement"
    );
    let stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(stdout, &Output { summary, rows })?;
    println!();

    Ok(())
}
