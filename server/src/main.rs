use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use passgate_server::auth::JwtValidator;
use passgate_server::config::Config;
use passgate_server::payments::{PaymentProcessor, StripeClient};
use passgate_server::qr::{PgTokenGenerator, QrIssuer, QrLinks};
use passgate_server::routes::create_routes;
use passgate_server::state::AppState;
use passgate_server::store::{PgTicketStore, PgUserDirectory, TicketStore, UserDirectory};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("passgate_server=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let store: Arc<dyn TicketStore> = Arc::new(PgTicketStore::new(pool.clone()));
    let users: Arc<dyn UserDirectory> = Arc::new(PgUserDirectory::new(pool.clone()));
    let issuer = QrIssuer::new(
        store.clone(),
        users.clone(),
        Arc::new(PgTokenGenerator::new(pool)),
    );

    let payments = config.stripe_secret_key.as_ref().map(|key| {
        Arc::new(StripeClient::new(key.clone())) as Arc<dyn PaymentProcessor>
    });
    if payments.is_none() {
        tracing::warn!("STRIPE_SECRET_KEY is not set; checkout endpoints will return configuration errors");
    }

    let links = QrLinks::new(&config.public_app_url, &config.qr_image_endpoint)
        .expect("Invalid PUBLIC_APP_URL or QR_IMAGE_ENDPOINT");

    let state = AppState {
        store,
        users,
        issuer,
        payments,
        auth: Arc::new(JwtValidator::new(config.auth_jwt_secret.as_bytes())),
        links,
        public_app_url: config.public_app_url.clone(),
    };

    let app = create_routes(state, &config.http);

    tracing::info!("🚀 Server running at http://{}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
