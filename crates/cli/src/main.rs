//! `altoro`: runs the Altoro Mutual automation parts and writes the report
//! workbook.

mod args;
mod summary;

use std::process::ExitCode;
use std::sync::Arc;

use altoro_core::{run_all, run_part, WorkflowContext};
use altoro_domain::Settings;
use altoro_infra::{config, init_logging, HttpTransport, WebDriverLauncher, XlsxWorkbookSink};
use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use crate::args::Cli;

fn context(settings: Settings) -> anyhow::Result<WorkflowContext> {
    let transport = HttpTransport::from_settings(&settings).context("building the API client")?;
    let launcher = WebDriverLauncher::from_settings(&settings);
    let sink = XlsxWorkbookSink::new(settings.paths().excel_path.clone());
    Ok(WorkflowContext::new(settings, Arc::new(launcher), Arc::new(sink), Arc::new(transport)))
}

async fn execute(cli: &Cli, settings: Settings) -> anyhow::Result<()> {
    let workbook = settings.paths().excel_path.clone();
    let ctx = context(settings)?;
    let lines = match cli.selected_command().part() {
        Some(part) => {
            let outcome =
                run_part(&ctx, part).await.with_context(|| format!("part '{part}' failed"))?;
            summary::outcome_lines(&outcome)
        }
        None => summary::pipeline_lines(&run_all(&ctx).await.context("pipeline failed")?),
    };
    for line in lines {
        println!("{line}");
    }
    println!("workbook: {}", workbook.display());
    info!(workbook = %workbook.display(), "run finished");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match config::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            // No log directory yet; report on stderr only.
            if init_logging(cli.log_options(None)).is_err() {
                eprintln!("error: {err}");
            }
            error!(error = %err, "configuration rejected");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match init_logging(cli.log_options(Some(settings.paths().log_dir.clone()))) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match execute(&cli, settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "run failed");
            ExitCode::FAILURE
        }
    }
}
