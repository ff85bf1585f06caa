use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod cache;
mod charts;
mod config;
mod corrections;
mod dataset;
mod dimensions;
mod error;
mod models;
mod normalize;
mod recode;
mod report;
mod server;
mod sheets;

use crate::aggregate::{Cadence, Selection};
use crate::config::{ServiceAccount, SheetSettings};
use crate::dataset::DatasetLoader;
use crate::error::DashboardError;
use crate::sheets::GoogleSheetsClient;

#[derive(Parser)]
#[command(name = "survey-pulse")]
#[command(about = "Partner survey dashboard backed by a shared spreadsheet", long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// TOML file holding the service-account fields
    #[arg(long, env = "SURVEY_SECRETS", default_value = ".streamlit/secrets.toml", global = true)]
    secrets: PathBuf,
    #[arg(long, env = "SURVEY_SHEET_KEY", default_value = config::DEFAULT_SHEET_KEY, global = true)]
    sheet_key: String,
    #[arg(long, env = "SURVEY_WORKSHEET", default_value = config::DEFAULT_SURVEY_WORKSHEET, global = true)]
    survey_worksheet: String,
    #[arg(long, env = "SURVEY_ORG_WORKSHEET", default_value = config::DEFAULT_ORG_WORKSHEET, global = true)]
    org_worksheet: String,
    /// How long fetched worksheets are reused
    #[arg(long, env = "SURVEY_CACHE_TTL_SECS", default_value_t = 1100, global = true)]
    cache_ttl_secs: u64,
    #[arg(long, env = "SURVEY_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout_secs: u64,
    /// Rows below the column keys that are not survey data
    #[arg(long, env = "SURVEY_HEADER_ROWS", default_value_t = 1, global = true)]
    header_rows: usize,
    /// CSV of sid,field,value fixes applied at load time
    #[arg(long, env = "SURVEY_CORRECTIONS", global = true)]
    corrections: Option<PathBuf>,
}

#[derive(Args)]
struct SelectionArgs {
    /// Restrict to these survey types (repeatable). Default: all
    #[arg(long = "survey-type")]
    survey_types: Vec<String>,
    /// Question or aggregate category to chart
    #[arg(long, default_value = "Clarity in Change Needed")]
    dimension: String,
    #[arg(long, value_enum, default_value_t = Cadence::Weekly)]
    cadence: Cadence,
}

impl SelectionArgs {
    fn selection(&self) -> Result<Selection, DashboardError> {
        let dimension = dimensions::find(&self.dimension)
            .ok_or_else(|| DashboardError::UnknownDimension(self.dimension.clone()))?;
        Ok(Selection {
            survey_types: self.survey_types.iter().cloned().collect(),
            dimension,
            cadence: self.cadence,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive dashboard
    Serve {
        #[arg(long, env = "SURVEY_BIND", default_value = "127.0.0.1:8501")]
        bind: SocketAddr,
    },
    /// Render the dashboard for one selection to an HTML file
    Report {
        #[command(flatten)]
        selection: SelectionArgs,
        #[arg(long, default_value = "report.html")]
        out: PathBuf,
    },
    /// Print the aggregated series for one selection
    Series {
        #[command(flatten)]
        selection: SelectionArgs,
    },
    /// List the survey types present in the data
    SurveyTypes,
}

fn build_loader(args: &SourceArgs) -> anyhow::Result<DatasetLoader> {
    let settings = SheetSettings {
        sheet_key: args.sheet_key.clone(),
        survey_worksheet: args.survey_worksheet.clone(),
        org_worksheet: args.org_worksheet.clone(),
        cache_ttl: Duration::from_secs(args.cache_ttl_secs),
        request_timeout: Duration::from_secs(args.timeout_secs),
        header_rows: args.header_rows,
    };

    let account = ServiceAccount::load(&args.secrets)
        .with_context(|| format!("failed to load secrets from {}", args.secrets.display()))?;
    let corrections = corrections::load_optional(args.corrections.as_deref())?;
    tracing::info!(
        client_email = %account.client_email,
        corrections = corrections.len(),
        "configured sheet access"
    );

    let client = GoogleSheetsClient::new(account, settings.request_timeout)?;
    Ok(DatasetLoader::new(Arc::new(client), settings, corrections))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let loader = build_loader(&cli.source)?;

    match cli.command {
        Commands::Serve { bind } => {
            server::run(loader, bind).await?;
        }
        Commands::Report { selection, out } => {
            let selection = selection.selection()?;
            let dataset = loader
                .load()
                .await
                .context("failed to load survey data")?;
            let page = report::build_page(&dataset, &selection)?;
            std::fs::write(&out, page)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Series { selection } => {
            let selection = selection.selection()?;
            let dataset = loader
                .load()
                .await
                .context("failed to load survey data")?;
            match aggregate::aggregate(&dataset.surveys, &selection) {
                Ok(series) => print!("{}", report::series_table(&series)),
                Err(DashboardError::EmptySelection) => println!("{}", report::SELECT_MORE),
                Err(err) => return Err(err.into()),
            }
        }
        Commands::SurveyTypes => {
            let dataset = loader
                .load()
                .await
                .context("failed to load survey data")?;
            let types = aggregate::survey_types(&dataset.surveys);
            if types.is_empty() {
                println!("No survey types found.");
                return Ok(());
            }
            for survey_type in types {
                println!("- {survey_type}");
            }
        }
    }

    Ok(())
}
