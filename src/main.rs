use anyhow::Context;
use clap::{Parser, Subcommand};
use fashion_etl::config::Config;
use fashion_etl::extract::{write_raw_dump, CatalogSource, FashionStudioCrawler, RawDumpSource};
use fashion_etl::load::build_sinks;
use fashion_etl::pipeline::{Pipeline, PipelineOutcome, PipelineResult};
use fashion_etl::{logging, metrics};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "fashion_etl")]
#[command(about = "Fashion Studio catalog ETL: scrape, clean and load product listings")]
#[command(version = "0.1.0")]
struct Cli {
    /// TOML config file. Environment variables (and .env) are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write a Prometheus text snapshot of the run's metrics to this file
    #[arg(long, global = true)]
    metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run extract, transform and load
    Run {
        /// Skip scraping and read raw records from a JSON dump
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Scrape only and save the raw records as JSON
    Scrape {
        #[arg(long)]
        out: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Config::from_env().context("loading config from environment"),
    }
}

fn print_result(result: &PipelineResult) {
    println!("\n📊 Pipeline Results ({}):", result.source);
    println!("   Run id: {}", result.run_id);
    println!("   Raw records: {}", result.stats.input_rows);
    println!("   Sentinel rows: {}", result.stats.sentinel_rows);
    println!("   Incomplete rows: {}", result.stats.incomplete_rows);
    println!("   Duplicates: {}", result.stats.duplicate_rows);
    println!("   Output rows: {}", result.stats.output_rows);

    match &result.outcome {
        PipelineOutcome::Halted(reason) => {
            println!("\n⚠️  Nothing loaded: {}", reason);
        }
        PipelineOutcome::Completed(report) => {
            for (sink, status) in &report.results {
                if status.is_success() {
                    println!("   ✅ {}", sink);
                }
            }
            for (sink, message) in report.failures() {
                println!("   ❌ {}: {}", sink, message);
            }
        }
    }
}

fn write_metrics(path: &Path) -> anyhow::Result<()> {
    match metrics::render() {
        Some(snapshot) => {
            fs::write(path, snapshot)
                .with_context(|| format!("writing metrics to {}", path.display()))?;
            info!("Metrics written to {}", path.display());
        }
        None => warn!("Metrics recorder is not installed, nothing written"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _log_guard = logging::init_logging();
    metrics::init_metrics();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { input } => {
            println!("🚀 Running full pipeline (extract + transform + load)...");

            let sinks = build_sinks(&config).context("configuring sinks")?;
            let source: Box<dyn CatalogSource> = match input {
                Some(path) => {
                    println!("📥 Reading raw records from {}", path.display());
                    Box::new(RawDumpSource::new(path))
                }
                None => {
                    println!("📥 Scraping {}", config.base_url);
                    Box::new(FashionStudioCrawler::from_config(&config)?)
                }
            };

            match Pipeline::run(&config, source.as_ref(), &sinks).await {
                Ok(result) => {
                    info!(summary = ?result.summary(), "Run complete");
                    print_result(&result);
                    if result.load_report().is_some_and(|r| r.all_succeeded()) {
                        println!("\n✅ Pipeline completed successfully!");
                    }
                }
                Err(e) => {
                    error!("Pipeline failed: {}", e);
                    println!("❌ Pipeline failed: {}", e);
                    if let Some(path) = &cli.metrics_out {
                        write_metrics(path)?;
                    }
                    return Err(e.into());
                }
            }
        }
        Commands::Scrape { out } => {
            println!("🔄 Scraping {}...", config.base_url);

            let crawler = FashionStudioCrawler::from_config(&config)?;
            let records = crawler.fetch_records().await?;
            write_raw_dump(&out, &records)?;
            println!("✅ Saved {} raw records to {}", records.len(), out.display());
        }
    }

    if let Some(path) = &cli.metrics_out {
        write_metrics(path)?;
    }
    Ok(())
}
