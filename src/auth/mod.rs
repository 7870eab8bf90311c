//! Account authentication and OTP lifecycle

pub mod jwt;
pub mod otp;
pub mod password;
pub mod service;

pub use jwt::{issue_token, verify_token, Claims, JwtError};
pub use otp::{OtpGenerator, SecureOtpGenerator};
pub use service::{AccountService, AuthFlowError, LoginSuccess};
