use anyhow::Context;
use clap::Parser;

use shopfloor_api::app::{self, services::AppServices};
use shopfloor_api::config::Args;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    shopfloor_observability::init(args.log_format);

    let services = AppServices::connect(&args.database_url, args.max_connections)
        .await
        .with_context(|| format!("failed to open database at {}", args.database_url))?;

    let app = app::build_app(services);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
