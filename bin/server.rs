// Card Fee Calculator - Web Server

use anyhow::{bail, Context, Result};
use feecalc::web::{router, AppState};
use feecalc::{Config, FeeTable};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    config.init_stdout_logging();

    let table = FeeTable::standard();
    if let Err(problems) = table.validate() {
        bail!("Fee table is inconsistent: {}", problems.join("; "));
    }

    let app = router(AppState::new(table));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_address))?;

    info!(address = %config.bind_address, "server running");
    info!("API: http://{}/api/fees", config.bind_address);

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
