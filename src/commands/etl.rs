//! `etl run`: one batch, in-process, with the report printed to stdout.

use std::path::Path;
use std::sync::Arc;

use super::{connect_database, persistence};
use crate::cli::args::{EtlAction, EtlArgs, FormatArg};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::etl::SourceFormat;
use crate::jobs::NoQueue;
use crate::services::{EtlManager, EtlService};

const CLI_TRIGGER: &str = "cli";

pub async fn execute(args: EtlArgs, config: Config) -> AppResult<()> {
    match args.action {
        EtlAction::Run {
            file,
            format,
            source,
        } => run(&config, &file, format, source).await,
    }
}

/// Explicit format, else the file extension, else CSV.
fn resolve_format(file: &Path, format: Option<FormatArg>) -> SourceFormat {
    if let Some(format) = format {
        return format.into();
    }
    match file.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
        _ => SourceFormat::Csv,
    }
}

async fn run(config: &Config, file: &Path, format: Option<FormatArg>, source: String) -> AppResult<()> {
    let payload = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| AppError::bad_request(format!("Cannot read {}: {}", file.display(), e)))?;
    let format = resolve_format(file, format);

    let database = connect_database(config).await?;
    let service = EtlManager::new(persistence(&database), Arc::new(NoQueue));

    tracing::info!(file = %file.display(), format = %format, "Running ETL batch");
    let (execution, report) = service
        .run_inline(source, format, payload, CLI_TRIGGER.to_string())
        .await?;

    let printed = serde_json::to_string_pretty(&report)
        .map_err(|e| AppError::internal(format!("Cannot render report: {}", e)))?;
    println!("{}", printed);
    println!(
        "Execution {} {}: {} loaded, {} failed",
        execution.id, execution.status, execution.records_loaded, execution.records_failed
    );
    if let Some(message) = &execution.error_message {
        println!("{}", message);
    }
    Ok(())
}
