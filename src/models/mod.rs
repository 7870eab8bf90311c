//! Data models for the PictoFold backend

mod account;
mod image;

pub use account::{
    Account, AuthResponse, LoginRequest, MessageResponse, PendingOtp, ResendOtpRequest,
    SignupRequest, UserRole, VerifyOtpRequest,
};
pub use image::{ImageRecord, ImageResponse, ProcessingStatus};
