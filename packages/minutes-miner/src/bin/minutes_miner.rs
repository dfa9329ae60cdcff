//! CLI for mining committee meeting documents.
//!
//! Writes a JSON report to the output directory; spreadsheets and charts
//! are built from that file by downstream tools.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use minutes_miner::{
    ExtractionPipeline, JitterDelay, MinerConfig, MiningCoordinator, MiningReport, PatternCatalog,
    ReqwestTransport,
};

#[derive(Parser)]
#[command(name = "minutes-miner")]
#[command(about = "Fetch, extract, and classify public meeting documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory for the JSON report
    #[arg(long, global = true, default_value = "results")]
    output: PathBuf,

    /// Documents processed concurrently per group (overrides config)
    #[arg(long, global = true)]
    workers: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Locate, download, extract, and classify every configured group
    Run,

    /// List document URLs per group without downloading
    Discover,

    /// Classify documents already saved under a directory
    Analyze { dir: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,minutes_miner=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = MinerConfig::from_env().context("Failed to load configuration")?;
    if let Some(workers) = cli.workers {
        config = config.with_workers(workers);
    }
    let catalog = PatternCatalog::compile(&config.catalog).context("Invalid keyword catalog")?;
    let delay = JitterDelay::new(config.delays.clone());
    let transport = ReqwestTransport::new().context("Failed to build HTTP client")?;

    let coordinator = MiningCoordinator::new(config, catalog, transport, delay, ExtractionPipeline::standard());

    // Ctrl-C stops new fetches; in-flight work finishes and is reported
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight work");
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::Run => {
            let report = coordinator.run().await;
            finish(&report, &cli.output).await?;
        }
        Commands::Discover => {
            let discovered = coordinator.discover().await;
            tokio::fs::create_dir_all(&cli.output)
                .await
                .context("Failed to create output directory")?;
            let path = cli.output.join("document_urls.json");
            let listing: Vec<_> = discovered
                .iter()
                .map(|group| {
                    serde_json::json!({
                        "group": group.key,
                        "name": group.name,
                        "documents": group.documents.iter().map(|(bucket, doc)| serde_json::json!({
                            "bucket": bucket,
                            "url": doc.url,
                            "text": doc.text,
                            "date": doc.date,
                            "filename": doc.filename,
                        })).collect::<Vec<_>>(),
                        "skips": group.skips,
                    })
                })
                .collect();
            tokio::fs::write(&path, serde_json::to_vec_pretty(&listing)?)
                .await
                .context("Failed to write document list")?;
            let total: usize = discovered.iter().map(|g| g.documents.len()).sum();
            tracing::info!(documents = total, path = %path.display(), "Document list written");
        }
        Commands::Analyze { dir } => {
            let report = coordinator
                .analyze_directory(&dir)
                .await
                .with_context(|| format!("Failed to analyze {}", dir.display()))?;
            finish(&report, &cli.output).await?;
        }
    }

    Ok(())
}

async fn finish(report: &MiningReport, output: &std::path::Path) -> Result<()> {
    for tier in &report.tiers {
        tracing::info!(tier = %tier.name, findings = tier.findings, "Tier summary");
    }
    if report.findings.is_empty() {
        tracing::warn!(
            skips = report.skips().count(),
            "No findings; the site may be blocking requests or documents may be image-only"
        );
    }
    let path = report.write_json(output).await.context("Failed to write report")?;
    tracing::info!(path = %path.display(), "Done");
    Ok(())
}
