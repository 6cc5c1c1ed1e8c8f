// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use chimerascan::config::AppConfig;
use chimerascan::enrichment::provider::{InferenceProvider, OllamaProvider};
use chimerascan::pipeline::ScanPipeline;
use chimerascan::store::memory::MemoryScanStore;
use chimerascan::store::postgres::PgScanStore;
use chimerascan::store::ScanStore;
use chimerascan::types::ReportFormat;

#[derive(Parser, Debug)]
#[command(name = "chimerascan", about = "ChimeraScan scan pipeline worker")]
struct Args {
    /// Target URL to scan
    target: String,

    /// Project to associate the scan with
    #[arg(long)]
    project_id: Option<Uuid>,

    /// Owner recorded on the scan (generated when omitted)
    #[arg(long)]
    owner_id: Option<Uuid>,

    /// Poll interval while waiting for the scan to finish
    #[arg(long, default_value_t = 2)]
    poll_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    println!("ChimeraScan: DAST Scanner for Web Applications");
    println!();

    let args = Args::parse();
    let config = AppConfig::from_env().context("failed to load configuration")?;

    let store: Arc<dyn ScanStore> = if config.database.enabled {
        let store = PgScanStore::new(&config.database).await?;
        store.init_schema().await?;
        Arc::new(store)
    } else {
        info!("DATABASE_URL not set, using in-memory scan store");
        Arc::new(MemoryScanStore::new())
    };

    let provider: Arc<dyn InferenceProvider> = Arc::new(OllamaProvider::new(
        Some(config.inference.base_url.clone()),
        Some(config.inference.model.clone()),
        config.inference.request_timeout_secs,
    )?);

    let pipeline = Arc::new(ScanPipeline::new(&config, store, provider));

    let owner_id = args.owner_id.unwrap_or_else(Uuid::new_v4);
    let scan_id = pipeline
        .submit(args.target.clone(), owner_id, args.project_id)
        .await
        .context("failed to submit scan")?;
    info!("scan {} submitted for {}", scan_id, args.target);

    loop {
        tokio::time::sleep(Duration::from_secs(args.poll_secs)).await;
        let view = pipeline.status(scan_id, owner_id).await?;
        info!("scan {}: {}", scan_id, view.status);
        if view.status.is_terminal() {
            break;
        }
    }

    for format in [ReportFormat::Json, ReportFormat::Pdf, ReportFormat::Html] {
        match pipeline.artifact_path(scan_id, owner_id, format).await {
            Ok(path) => println!("{} report: {}", format, path.display()),
            Err(_) => println!("{} report: not available", format),
        }
    }

    Ok(())
}
