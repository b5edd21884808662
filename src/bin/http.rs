#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::sync::Arc;

    use estimate_tool::{AppConfig, http_api, logging};

    logging::init();
    let config = AppConfig::from_env()?;
    let catalog = config.load_catalog()?;
    let estimator = config.load_estimator()?;
    let store = config.open_store()?;

    let state = http_api::AppState::new(catalog, Arc::from(estimator), Arc::from(store))
        .with_rounding(config.crew_rounding);
    http_api::serve(config.http_addr, state).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
