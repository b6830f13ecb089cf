//! StreamCredit — Benford's Law fraud screening and rule-based credit decisions
//!
//! Entry point. Loads `.env` and configuration, initialises structured
//! logging, and serves the HTTP API until Ctrl+C.

use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use streamcredit::api::{self, routes::ApiState};
use streamcredit::config::AppConfig;

const BANNER: &str = r#"
 ____  _                            ____              _ _ _
/ ___|| |_ _ __ ___  __ _ _ __ ___ / ___|_ __ ___  __| (_) |_
\___ \| __| '__/ _ \/ _` | '_ ` _ \ |   | '__/ _ \/ _` | | __|
 ___) | |_| | |  __/ (_| | | | | | | |___| | |  __/ (_| | | |_
|____/ \__|_|  \___|\__,_|_| |_| |_|\____|_|  \___|\__,_|_|\__|

  Benford fraud screening + revenue-based credit decisions
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Logging first so config fallbacks are visible
    init_logging();

    let config_path = AppConfig::path_from_env();
    let cfg = AppConfig::load_or_default(&config_path)?;

    println!("{BANNER}");
    info!(
        config = %config_path,
        addr = %cfg.server.bind_addr(),
        prefix = %cfg.server.api_prefix,
        significance_level = cfg.fraud.significance_level,
        mar_threshold = %cfg.credit.mar_threshold,
        max_credit_limit = %cfg.credit.max_credit_limit,
        "StreamCredit starting up"
    );

    let state = Arc::new(ApiState::new(&cfg));

    if let Err(e) = api::serve(state, &cfg.server, shutdown_signal()).await {
        error!(error = %e, "Server terminated with error");
        return Err(e);
    }

    info!("StreamCredit shut down cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        // Keep serving rather than exit immediately.
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("streamcredit=info"));

    let json_logging = std::env::var("STREAMCREDIT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
