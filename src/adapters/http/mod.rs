//! HTTP adapter - the thin surface exposing the core engines.
//!
//! Routing and request validation stay thin here; the webhook, redemption,
//! and admin handlers delegate straight to the domain services.

mod dto;
mod handlers;
mod routes;

pub use handlers::AppState;
pub use routes::api_router;
