use std::sync::Arc;

use cinema_api::{config::AppConfig, routes, AppState};
use shuttle_secrets::SecretStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[shuttle_runtime::main]
async fn main(#[shuttle_secrets::Secrets] secret_store: SecretStore) -> shuttle_axum::ShuttleAxum {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinema_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_secrets(&secret_store)?;
    let state = AppState::connect(&config).await?;

    let app = routes::build_router(Arc::new(state)).layer(routes::cors_layer(&config.app_url)?);
    tracing::info!(database = %config.database_name, "cinema api ready");

    // For a deployment outside shuttle, serve `app` with
    // `axum::serve(tokio::net::TcpListener::bind("0.0.0.0:8000").await?, app)`.
    Ok(app.into())
}
