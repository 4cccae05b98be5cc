//! API Server Entry Point
//!
//! Demo server hosting the SSO client.
//! Uses `anyhow` for startup errors; request-level errors render through
//! `sso::SsoError`.

mod config;
mod routes;

use axum::http::{self, Method, header};
use sqlx::postgres::PgPoolOptions;
use sso::{PgSsoRepository, RedisSessionStore, SsoClientBuilder};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,sso=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Primary database must be reachable at startup
    let primary = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.primary_database_url)
        .await?;

    tracing::info!("Connected to primary database");

    // Secondary is a standby; it may be down now and come back later
    let secondary = match &config.secondary_database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(5).connect_lazy(url)?;
            tracing::info!("Secondary database configured");
            Some(pool)
        }
        None => None,
    };

    let store = RedisSessionStore::connect(&config.sso.redis_uri).await?;

    tracing::info!("Connected to session store");

    let client = SsoClientBuilder::new(config.sso.clone(), store)?.with_repository(
        PgSsoRepository::new(primary),
        secondary.map(PgSsoRepository::new),
    );

    // CORS configuration
    let allowed_origins: Vec<http::HeaderValue> = config
        .frontend_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = routes::app(client)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
