//! `heroes-auth`: token and credential primitives.
//!
//! This crate is intentionally decoupled from HTTP and storage: it signs and
//! verifies tokens and password verifiers. Looking the user up is the
//! caller's job.

pub mod claims;
pub mod error;
pub mod jwt;
pub mod password;

pub use claims::JwtClaims;
pub use error::{AuthError, AuthResult};
pub use jwt::{Hs256Jwt, JwtValidator};
pub use password::{hash_password, verify_password};
