//! BarentsWatch authentication.
//!
//! This crate provides:
//! - Client-credentials configuration loaded from the environment
//! - [`AccessTokenManager`], which exchanges credentials for a bearer token
//!   and decides when the token must be renewed

pub mod config;
pub mod error;
pub mod manager;
pub mod token;

pub use config::{AuthConfig, ClientCredentials};
pub use error::{AuthError, AuthResult};
pub use manager::AccessTokenManager;
pub use token::{AccessToken, TOKEN_RENEWAL_MARGIN};
