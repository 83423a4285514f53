use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer, HttpConfig};
use crate::handlers::{access, admin, health_check, payments, qr, verify};
use crate::state::AppState;

pub fn create_routes(state: AppState, http: &HttpConfig) -> Router {
    let cors = create_cors_layer(http.cors_allowed_origins.as_deref(), &state.public_app_url);

    Router::new()
        .route("/health", get(health_check))
        .route("/ticket", get(verify::verify_token))
        .route("/api/qr/generate", post(qr::generate_qr))
        .route("/api/qr/backfill", post(qr::backfill_qr_codes))
        .route("/api/payments/checkout", post(payments::create_ticket_checkout))
        .route(
            "/api/payments/media-pass",
            post(payments::create_media_pass_checkout),
        )
        .route("/api/admin/tickets/delete", post(admin::delete_ticket))
        .route("/api/me/access", get(access::my_access))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer(http.production))
        .layer(cors)
}
