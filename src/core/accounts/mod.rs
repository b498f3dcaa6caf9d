//! Account registration and profile management

pub mod api;
pub mod service;

pub use api::{AccountsApiState, accounts_api_router};
pub use service::{AccountError, AccountService};
