use anyhow::Result;
use cresta_api::{build_app, ApiConfig};
use cresta_observability::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("cresta_api");

    let config = ApiConfig::from_env();
    let app = build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!(
        bind = %config.bind,
        database_url = %config.database_url,
        "cresta api started"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
