//! PictoFold backend library
//!
//! User accounts with email OTP verification, credential login issuing
//! bearer tokens, and authenticated image upload backed by an external
//! media host.

pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod handlers;
pub mod images;
pub mod media;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
