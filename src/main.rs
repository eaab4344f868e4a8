use axum::http::{HeaderValue, Method, header};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ledgerline::config::Config;
use ledgerline::db::LedgerStorage;
use ledgerline::router::{LedgerState, ledger_router};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        database_url = %cfg.basic.database_url,
        listen_addr = %cfg.basic.listen_addr,
        loglevel = %cfg.basic.loglevel,
        require_auth = cfg.access.require_auth,
        seeded_users = cfg.users.len()
    );

    let storage = LedgerStorage::connect(&cfg.basic.database_url).await?;
    let state = LedgerState::new(storage, cfg.access.clone());

    for seed in &cfg.users {
        match state.users.ensure_user(&seed.username, &seed.token).await {
            Ok(id) => info!(user = %seed.username, id = %id, "user provisioned"),
            Err(e) => warn!(user = %seed.username, error = %e, "failed to provision user"),
        }
    }

    let origins: Vec<HeaderValue> = cfg
        .basic
        .cors_origins
        .iter()
        .filter_map(|o| {
            o.parse()
                .inspect_err(|_| warn!(origin = %o, "ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let app = ledger_router(state).layer(cors);

    let listener = TcpListener::bind(&cfg.basic.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.basic.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
