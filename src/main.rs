//! OpenSASE Storefront - storefront pricing service

use anyhow::Result;
use opensase_storefront::{
    api::{build_app, AppState},
    bus::EventBus,
    config::load_app_config,
    loader::CatalogLoader,
    StorefrontApiClient,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_app_config()?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let client = StorefrontApiClient::new(&config.api_url, config.http_timeout_secs)?;
    let mut bus = EventBus::new(config.event_bus_capacity);
    if let Some(url) = &config.nats_url {
        match async_nats::connect(url).await {
            Ok(nats) => bus = bus.with_nats(nats),
            Err(e) => tracing::warn!(error = %e, %url, "NATS unavailable, events stay in-process"),
        }
    }
    let state = AppState { loader: CatalogLoader::new(client), bus, currency: config.currency.clone() };
    let app = build_app(state);

    tracing::info!(api = %config.api_url, "🚀 OpenSASE Storefront listening on {}", config.bind_addr);
    axum::serve(tokio::net::TcpListener::bind(config.bind_addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
