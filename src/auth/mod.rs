//! Authentication module
//!
//! - Password hashing and verification (bcrypt)
//! - Access/refresh token issuance and validation (HS256 JWT, one secret per kind)
//! - The register / login / refresh flows tying them to the user store

mod jwt;
mod password;
mod service;

pub use jwt::{Claims, JwtError, JwtTokenManager, TokenKind, TokenManager};
pub use password::{hash_password, verify_password, PasswordError};
pub use service::{AuthError, AuthService, TokenPair};
