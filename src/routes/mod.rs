//! Route definitions for the PictoFold API

mod auth;
mod images;

pub use auth::auth_routes;
pub use images::image_routes;

use axum::{routing::get, Router};

use crate::handlers::health;
use crate::state::AppState;

/// Assemble the full application router
pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .merge(auth_routes())
        .merge(image_routes())
}
