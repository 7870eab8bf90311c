//! Image upload, listing, and deletion

pub mod service;

pub use service::{ImageError, ImageService, UploadPayload};
