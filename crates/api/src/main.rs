//! Gatehouse API Server

use std::sync::Arc;

use anyhow::Context;
use gatehouse_api::{
    config::{Config, LogFormat},
    routes::create_router,
    AppState,
};
use gatehouse_shared::{MemoryUserStore, NewUser, Role, UserStore};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("failed to load configuration")?;

    init_tracing(config.log_format);

    tracing::info!(
        bind_address = %config.bind_address,
        token_ttl_hours = config.jwt_expiry_hours,
        signup_enabled = config.enable_signup,
        "Starting Gatehouse API"
    );

    let users = Arc::new(MemoryUserStore::new());
    seed_admin(&config, users.as_ref())?;

    let bind_address = config.bind_address.clone();
    let state = AppState::new(config, users);
    let app = create_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!("Listening on {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shut down");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gatehouse_api=debug,tower_http=info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Create the bootstrap admin from `ADMIN_EMAIL` / `ADMIN_PASSWORD_HASH`
fn seed_admin(config: &Config, users: &dyn UserStore) -> anyhow::Result<()> {
    let (Some(email), Some(password_hash)) = (&config.admin_email, &config.admin_password_hash)
    else {
        tracing::warn!("ADMIN_EMAIL or ADMIN_PASSWORD_HASH not set; starting without an admin account");
        return Ok(());
    };

    let admin = users
        .insert(NewUser {
            email: email.clone(),
            password_hash: password_hash.clone(),
            first_name: "Admin".to_string(),
            last_name: String::new(),
            role: Role::Admin,
        })
        .context("failed to seed admin account")?;

    tracing::info!(user_id = %admin.id, "Seeded admin account");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal"),
    }
}
