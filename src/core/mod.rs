//! Core domain logic for taskkeep: accounts, sessions and tasks

pub mod accounts;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod router;
pub mod tasks;
pub mod telemetry;
pub mod validation;
