//! API handlers for the PictoFold backend

pub mod auth;
pub mod health;
pub mod images;

// Re-export AuthenticatedUser from middleware for handler use
pub use crate::middleware::AuthenticatedUser;
