#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use project_lines::{LinePlanner, PlannerConfig, PlannerStore, http_api, telemetry};

    let config = PlannerConfig::load(None)?;
    telemetry::init(&config.log_filter);

    let addr: SocketAddr = config.http_addr.parse()?;
    let store = PlannerStore::open(&config)?;
    tracing::info!(store = store.describe(), "opened line store");
    let planner = LinePlanner::from_config(store, &config)?;

    println!("project-lines HTTP API listening on http://{addr}");
    http_api::serve(addr, planner).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
