//! PictoFold backend server
//!
//! Account signup/login with email OTP verification and authenticated
//! image upload, listing, and deletion via an external media host.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use pictofold_server::auth::{AccountService, SecureOtpGenerator};
use pictofold_server::config::Config;
use pictofold_server::db;
use pictofold_server::email::{HttpMailer, LogMailer, OtpMailer};
use pictofold_server::images::ImageService;
use pictofold_server::media::{CloudinaryClient, MediaHost};
use pictofold_server::routes::app_router;
use pictofold_server::state::AppState;
use pictofold_server::store::{
    AccountStore, ImageStore, InMemoryAccountStore, InMemoryImageStore, PostgresAccountStore,
    PostgresImageStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .init();

    tracing::info!(environment = %config.environment.as_str(), "Starting pictofold-server");

    // Stores: Postgres when configured, in-memory otherwise
    let (account_store, image_store): (Arc<dyn AccountStore>, Arc<dyn ImageStore>) =
        match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(&config, url)
                    .await
                    .context("Failed to connect to database")?;
                db::run_migrations(&pool)
                    .await
                    .context("Failed to run migrations")?;
                (
                    Arc::new(PostgresAccountStore::new(pool.clone())),
                    Arc::new(PostgresImageStore::new(pool)),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory stores");
                (
                    Arc::new(InMemoryAccountStore::new()),
                    Arc::new(InMemoryImageStore::new()),
                )
            }
        };

    // OTP mailer: real mail API when a token is configured
    let mailer: Arc<dyn OtpMailer> = match &config.mail_server_token {
        Some(token) => Arc::new(HttpMailer::new(
            config.mail_api_url.clone(),
            token.clone(),
            config.mail_from.clone(),
        )),
        None => {
            tracing::warn!("MAIL_SERVER_TOKEN not set, OTP emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let media_host: Arc<dyn MediaHost> = Arc::new(CloudinaryClient::new(
        config.cloudinary_cloud_name.clone(),
        config.cloudinary_api_key.clone(),
        config.cloudinary_api_secret.clone(),
    ));

    let account_service = Arc::new(AccountService::new(
        account_store.clone(),
        mailer,
        Arc::new(SecureOtpGenerator),
        config.jwt_secret.clone(),
        config.jwt_ttl_seconds,
        config.bcrypt_cost,
    ));

    let image_service = Arc::new(ImageService::new(
        image_store,
        account_store,
        media_host,
        config.cloudinary_folder.clone(),
    ));

    let state = AppState::new(account_service, image_service);

    // CORS: explicit origins when configured, permissive in development
    let cors = match &config.cors_allowed_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    };

    let app = app_router()
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind server address")?;

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
