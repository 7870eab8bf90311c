//! Shared application state

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AccountService;
use crate::images::ImageService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<AccountService>,
    pub image_service: Arc<ImageService>,
}

impl AppState {
    pub fn new(account_service: Arc<AccountService>, image_service: Arc<ImageService>) -> Self {
        Self {
            account_service,
            image_service,
        }
    }
}

impl FromRef<AppState> for Arc<AccountService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.account_service.clone()
    }
}

impl FromRef<AppState> for Arc<ImageService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.image_service.clone()
    }
}
