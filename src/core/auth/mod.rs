//! Authentication module for taskkeep
//!
//! This module provides:
//! - Peppered Argon2id password hashing
//! - JWT access tokens and opaque refresh tokens
//! - Session lifecycle (login, refresh rotation, logout, session cap)
//! - The request guard attaching an authenticated `Principal`
//! - REST API endpoints for session operations

pub mod api;
pub mod guard;
pub mod jwt;
pub mod password;
pub mod service;

pub use api::{AuthApiState, SESSION_COOKIE, auth_api_router};
pub use guard::{
    AccessError, ClientDevice, Principal, ensure_owner, extract_bearer_token, require_auth,
};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use password::{Argon2idHasher, HashError, PasswordHasher};
pub use service::{MAX_SESSIONS_PER_ACCOUNT, SessionError, SessionService, Tokens};
