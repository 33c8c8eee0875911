use std::{env, net::SocketAddr};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use migration::{Migrator, MigratorTrait};
use service::auth::service::AuthConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::routes::{self, ServerState};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr() -> anyhow::Result<SocketAddr> {
    let (host, port) = match configs::load_default() {
        Ok(cfg) => {
            let s = cfg.server;
            (s.host, s.port)
        }
        Err(_) => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8082);
            (host, port)
        }
    };
    Ok(format!("{}:{}", host, port).parse()?)
}

/// Token settings from config.toml when present, env vars otherwise.
fn load_auth_config() -> AuthConfig {
    let mut auth = match configs::load_default() {
        Ok(cfg) => cfg.auth,
        Err(_) => configs::AuthConfig::default(),
    };
    auth.normalize_from_env();
    let jwt_secret = if auth.jwt_secret.trim().is_empty() {
        "dev-secret-change-me".to_string()
    } else {
        auth.jwt_secret
    };
    AuthConfig { jwt_secret, token_ttl_hours: auth.token_ttl_hours }
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    // DB connection, schema brought up to date before serving
    let db = models::db::connect().await?;
    Migrator::up(&db, None).await?;

    let state = ServerState::new(db, load_auth_config());

    // Build router
    let cors = build_cors();
    let app: Router = routes::build_router(cors, state);

    // Bind and serve
    let addr = load_bind_addr()?;
    info!(%addr, "starting book api server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
