//! Authentication and authorization for Lyceum
//!
//! Provides:
//! - JWT token generation and validation
//! - Password hashing with Argon2
//! - One-time verification codes (email verification, password reset)
//! - OAuth login flows (GitHub, Google)

pub mod jwt;
pub mod oauth;
pub mod otp;
pub mod password;

pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput};
pub use password::{hash_password, verify_password};
