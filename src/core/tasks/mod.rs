//! Per-account task management

pub mod api;
pub mod service;

pub use api::{TasksApiState, tasks_api_router};
pub use service::{TaskError, TaskService};
