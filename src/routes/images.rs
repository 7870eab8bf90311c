//! Image routes

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::handlers::images;
use crate::images::service::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Create image routes
pub fn image_routes() -> Router<AppState> {
    Router::new()
        .route("/api/images/upload", post(images::upload_image))
        .route("/api/images/my-images", get(images::my_images))
        .route("/api/images/:id", delete(images::delete_image))
        // Leave headroom above the payload cap for multipart framing
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
}
