//! taskkeep - Multi-tenant task tracking service
//!
//! Accounts sign in with a name and password and receive a short-lived JWT
//! access token plus an opaque refresh token bound to the client device.
//! Refresh tokens rotate on every use, and each account keeps at most
//! [`core::auth::MAX_SESSIONS_PER_ACCOUNT`] live sessions.

pub mod core;
