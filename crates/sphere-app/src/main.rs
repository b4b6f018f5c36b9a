use std::sync::Arc;
use std::time::Duration;

use salvo::conn::TcpListener;
use salvo::{Listener, Router};
use sphere_app::app::api::routes;
use sphere_app::clients::ClientsHandler;
use sphere_app::config::ConfigHandler;
use sphere_app::db_handler::DbProviderHandler;
use sphere_core::config::load_config;
use sphere_db::db::connection::{DbPool, create_pool};
use sphere_service::ai::AiClient;
use sphere_service::retention::sweep_expired_rooms;
use sphere_service::storage::StorageClient;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, reload, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Advent Sphere server");

    let config = load_config()?;

    tracing::info!(config = ?config, "Configuration loaded");

    if let Ok(filter) = EnvFilter::try_new(config.logging.level.as_str()) {
        if let Err(e) = filter_handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %config.logging.level, "Invalid log level in config, keeping debug");
    }

    let pool = create_pool(
        &config.database.url,
        u32::from(config.database.max_connections),
    )
    .await?;

    tracing::info!("Database connection pool created.");

    let storage = Arc::new(StorageClient::new(&config.storage));
    let ai = Arc::new(AiClient::new(&config.ai));

    spawn_retention_sweeper(
        pool.clone(),
        Arc::clone(&storage),
        config.retention.sweep_interval_minutes,
    );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let acceptor = TcpListener::new(bind_addr.clone()).bind().await;

    let router = Router::new()
        .hoop(DbProviderHandler { provider: pool })
        .hoop(ConfigHandler {
            settings: config.clone(),
        })
        .hoop(ClientsHandler { storage, ai })
        .push(routes());

    tracing::info!("Server listening on {bind_addr}");

    salvo::Server::new(acceptor).serve(router).await;

    Ok(())
}

/// Periodically removes rooms past the retention window, with their
/// slots and stored photos.
fn spawn_retention_sweeper(pool: DbPool, storage: Arc<StorageClient>, interval_minutes: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let mut conn = match pool.get().await {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(error = %e, "Retention sweep skipped, no connection");
                    continue;
                }
            };

            match sweep_expired_rooms(&mut conn, &storage, chrono::Utc::now()).await {
                Ok(0) => tracing::debug!("Retention sweep found nothing to remove"),
                Ok(removed) => tracing::info!(removed, "Retention sweep removed expired rooms"),
                Err(e) => tracing::error!(error = ?e, "Retention sweep failed"),
            }
        }
    });
}
