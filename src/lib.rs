pub mod api;
pub mod authorization;
pub mod config;
pub mod crypto;
pub mod db;
pub mod models;
pub mod services;

use tracing_subscriber::EnvFilter;

use crate::config::ClinicConfig;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] db::DatabaseError),

    #[error("Bootstrap failed: {0}")]
    Bootstrap(#[from] services::ServiceError),

    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load configuration, prepare the database, and serve until Ctrl+C.
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ClinicConfig::from_env()?;
    tracing::info!(db = %config.db_path.display(), "opening clinic database");

    {
        let conn = db::open_database(&config.db_path)?;
        services::account::ensure_bootstrap_admin(
            &conn,
            &config.admin_username,
            config.admin_password.as_deref(),
        )?;
    }

    let bind_addr = config.bind_addr;
    let mut server = api::start_api_server(api::ApiContext::new(config), bind_addr).await?;
    tracing::info!(addr = %server.addr, "clinic API listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {e}");
    }
    server.shutdown();
    server.wait().await;
    Ok(())
}
