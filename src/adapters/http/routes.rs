//! Axum router for the API surface.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    bulk_generate, create_code, deactivate_code, get_account, handle_payment_webhook, list_codes,
    redeem_code, validate_code, AppState,
};

/// Builds the full API router.
///
/// # Routes
///
/// ## Webhooks (no auth; signature verified)
/// - `POST /webhooks/payments`
///
/// ## Account (bearer auth)
/// - `GET /account` - entitlement summary, registering on first use
///
/// ## Promo (bearer auth where noted)
/// - `POST /promo/validate` - optional auth
/// - `POST /promo/redeem` - requires auth
///
/// ## Admin (deployed behind the ops gateway)
/// - `POST /admin/promo`
/// - `POST /admin/promo/bulk`
/// - `GET /admin/promo`
/// - `POST /admin/promo/:code/deactivate`
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/webhooks/payments", post(handle_payment_webhook))
        .route("/account", get(get_account))
        .route("/promo/validate", post(validate_code))
        .route("/promo/redeem", post(redeem_code))
        .route("/admin/promo", post(create_code).get(list_codes))
        .route("/admin/promo/bulk", post(bulk_generate))
        .route("/admin/promo/:code/deactivate", post(deactivate_code))
        .route("/health", get(|| async { "ok" }))
}
