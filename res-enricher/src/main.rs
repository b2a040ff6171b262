use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;

use res_enricher::app::EnrichUseCase;
use res_enricher::config::EnricherConfig;
use res_enricher::infra::{CsvOutputAdapter, LogDirectorySource, SqliteGeographySource};
use res_enricher::observability::{logging, metrics};
use res_enricher::pipeline::processing::analytics;
use res_enricher::pipeline::processing::geography::GeographyResolver;

#[derive(Parser)]
#[command(name = "res-enricher")]
#[command(about = "Real-estate search-event enrichment pipeline")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "enricher.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full enrichment pass: logs + geography -> enriched CSV
    Enrich {
        /// Override the geography database path
        #[arg(long)]
        geography_db: Option<PathBuf>,
        /// Override the search-log directory
        #[arg(long)]
        log_dir: Option<PathBuf>,
        /// Override the output file path
        #[arg(long)]
        output: Option<PathBuf>,
        /// Log an analytics summary of the enriched table
        #[arg(long)]
        summary: bool,
    },
    /// Load the geography table and verify the hierarchy resolves
    CheckGeography {
        /// Override the geography database path
        #[arg(long)]
        geography_db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();
    metrics::init();

    let cli = Cli::parse();
    let mut config = EnricherConfig::load(&cli.config)?;

    match cli.command {
        Commands::Enrich {
            geography_db,
            log_dir,
            output,
            summary,
        } => {
            if let Some(path) = geography_db {
                config.inputs.geography_db = path;
            }
            if let Some(path) = log_dir {
                config.inputs.search_log_dir = path;
            }
            if let Some(path) = output {
                config.output.path = path;
            }

            info!(
                "🔄 enriching searches from {} with geography {}",
                config.inputs.search_log_dir.display(),
                config.inputs.geography_db.display()
            );

            let use_case = EnrichUseCase::new(
                Box::new(SqliteGeographySource::new(config.inputs.geography_db)),
                Box::new(LogDirectorySource::new(config.inputs.search_log_dir)),
                Box::new(CsvOutputAdapter::new(&config.output.path)?),
                config.limits.max_malformed_ratio,
            );
            let report = use_case.run().await?;

            if summary {
                analytics::summarize(&report.enriched).log();
            }
            info!(
                "✅ wrote {} enriched rows to {}",
                report.enriched.len(),
                config.output.path.display()
            );
        }
        Commands::CheckGeography { geography_db } => {
            if let Some(path) = geography_db {
                config.inputs.geography_db = path;
            }
            let source = SqliteGeographySource::new(config.inputs.geography_db);
            use res_enricher::app::ports::GeographySourcePort;
            let nodes = source.load_nodes().await?;
            let index = GeographyResolver::new(nodes).resolve_all()?;
            info!("✅ geography hierarchy is well-formed ({} nodes)", index.len());
        }
    }

    Ok(())
}
