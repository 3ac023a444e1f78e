//! warera-tax - Community tax ledger daemon
//!
//! Initializes the ledger database, synchronizes the country roster in
//! the background, and runs the reconciliation pipeline on a fixed
//! interval until interrupted.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};
use warera_tax::config::{resolve_root_folder, EngineConfig};
use warera_tax::db::init_database;
use warera_tax::source::{warera::DEFAULT_BASE_URL, WarEraClient};
use warera_tax::{queries, sync, EngineContext};

#[derive(Parser, Debug)]
#[command(name = "warera-tax", about = "WarEra community tax ledger daemon")]
struct Args {
    /// Folder holding the ledger database
    #[arg(long)]
    root_folder: Option<String>,

    /// WarEra API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// WarEra API token
    #[arg(long, env = "WARERA_API_TOKEN", default_value = "")]
    token: String,

    /// Country whose members are tracked
    #[arg(long, env = "WARERA_COUNTRY_ID")]
    country_id: String,

    /// Minutes between reconciliation passes
    #[arg(long, default_value_t = 30)]
    interval_mins: u64,

    /// Minimum level shown on the dashboard
    #[arg(long, default_value_t = 10)]
    min_level: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting warera-tax v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = EngineConfig {
        root_folder: resolve_root_folder(args.root_folder.as_deref(), "WARERA_TAX_ROOT"),
        base_url: args.base_url,
        api_token: args.token,
        country_id: args.country_id,
        sync_interval: Duration::from_secs(args.interval_mins * 60),
        dashboard_min_level: args.min_level,
    };
    config.validate()?;

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path).await?;

    let ctx = EngineContext::new(pool);
    let client = Arc::new(WarEraClient::new(
        &config.base_url,
        &config.api_token,
        &config.country_id,
    )?);

    // Roster discovery runs in the background so slow pagination does
    // not delay the first reconciliation pass
    {
        let ctx = ctx.clone();
        let client = client.clone();
        tokio::spawn(async move {
            if let Err(e) = sync::sync_roster(&ctx, client.as_ref()).await {
                error!("Roster sync failed: {}", e);
            }
        });
    }

    info!(
        "Reconciling every {} minutes (ctrl-c to stop)",
        config.sync_interval.as_secs() / 60
    );
    let mut tick = interval(config.sync_interval);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                match sync::run_reconciliation(&ctx, client.as_ref()).await {
                    Ok(summary) => {
                        info!(
                            "Pass complete: {} updated, {} skipped",
                            summary.updated, summary.skipped
                        );
                        match queries::dashboard(&ctx, config.dashboard_min_level).await {
                            Ok(board) => info!(
                                "Standing (level >= {}): {} players, {} paid, {} partial, {} unpaid, {} legend, {} n/a",
                                config.dashboard_min_level,
                                board.counts.total,
                                board.counts.paid,
                                board.counts.partial,
                                board.counts.unpaid,
                                board.counts.legend,
                                board.counts.not_applicable
                            ),
                            Err(e) => error!("Dashboard query failed: {}", e),
                        }
                    }
                    Err(e) => error!("Reconciliation pass failed: {}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
