//! Application wiring
//!
//! Builds the services over a set of repositories and merges the feature
//! routers into one axum `Router` with tracing, CORS and request timeouts.
//! Every request gets an `x-request-id` (kept when the client sends one),
//! recorded on the request span and echoed on the response.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::core::accounts::{AccountService, AccountsApiState, accounts_api_router};
use crate::core::auth::{
    AuthApiState, JwtService, PasswordHasher, SessionService, auth_api_router,
};
use crate::core::config::Mode;
use crate::core::db::pool::health_check;
use crate::core::db::repositories::{
    AccountRepository, MemoryAccountRepository, MemorySessionRepository, MemoryTaskRepository,
    PgAccountRepository, PgSessionRepository, PgTaskRepository, SessionRepository,
    TaskRepository,
};
use crate::core::tasks::{TaskService, TasksApiState, tasks_api_router};

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Repository set the services run on
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub tasks: Arc<dyn TaskRepository>,
}

impl Repositories {
    /// Process-local DashMap store
    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(MemoryAccountRepository::new()),
            sessions: Arc::new(MemorySessionRepository::new()),
            tasks: Arc::new(MemoryTaskRepository::new()),
        }
    }

    /// PostgreSQL store sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            accounts: Arc::new(PgAccountRepository::new(pool.clone())),
            sessions: Arc::new(PgSessionRepository::new(pool.clone())),
            tasks: Arc::new(PgTaskRepository::new(pool)),
        }
    }
}

/// All application services
#[derive(Clone)]
pub struct Services {
    pub sessions: SessionService,
    pub accounts: AccountService,
    pub tasks: TaskService,
}

impl Services {
    pub fn new(repos: Repositories, hasher: Arc<dyn PasswordHasher>, jwt: JwtService) -> Self {
        Self {
            sessions: SessionService::new(
                repos.accounts.clone(),
                repos.sessions.clone(),
                hasher.clone(),
                jwt,
            ),
            accounts: AccountService::new(
                repos.accounts.clone(),
                repos.tasks.clone(),
                repos.sessions.clone(),
                hasher,
            ),
            tasks: TaskService::new(repos.accounts, repos.tasks),
        }
    }
}

/// Router-wide settings
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub mode: Mode,
    pub request_timeout: Duration,
    /// Pool checked by `/health`; absent for the in-memory store
    pub pool: Option<PgPool>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            request_timeout: Duration::from_secs(10),
            pool: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    storage: &'static str,
}

/// GET /health
async fn health_handler(
    State(pool): State<Option<PgPool>>,
) -> (StatusCode, Json<HealthResponse>) {
    match pool {
        None => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                storage: "memory",
            }),
        ),
        Some(pool) => match health_check(&pool).await {
            Ok(()) => (
                StatusCode::OK,
                Json(HealthResponse {
                    status: "ok",
                    storage: "postgres",
                }),
            ),
            Err(err) => {
                tracing::error!(error = %err, "Database health check failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(HealthResponse {
                        status: "unavailable",
                        storage: "postgres",
                    }),
                )
            }
        },
    }
}

/// Build the full application router
pub fn app_router(services: Services, options: RouterOptions) -> Router {
    let mode = options.mode;
    let trace = TraceLayer::new_for_http().make_span_with(move |request: &Request| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        tracing::info_span!(
            "request",
            mode = %mode,
            request_id = %request_id,
            method = %request.method(),
            uri = %request.uri(),
        )
    });

    let health = Router::new()
        .route("/health", get(health_handler))
        .with_state(options.pool);

    Router::new()
        .merge(auth_api_router(AuthApiState {
            sessions: services.sessions.clone(),
        }))
        .merge(accounts_api_router(AccountsApiState {
            accounts: services.accounts,
            sessions: services.sessions.clone(),
        }))
        .merge(tasks_api_router(TasksApiState {
            tasks: services.tasks,
            sessions: services.sessions,
        }))
        .merge(health)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    options.request_timeout,
                )),
        )
}
