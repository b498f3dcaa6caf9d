use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use taskkeep::core::auth::{Argon2idHasher, JwtService};
use taskkeep::core::config::Config;
use taskkeep::core::db::create_pool_with_migrations;
use taskkeep::core::router::{Repositories, RouterOptions, Services, app_router};
use taskkeep::core::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Optional explicit env file
    if let Ok(path) = std::env::var("CONFIG_PATH") {
        if let Err(err) = dotenvy::from_path(&path) {
            eprintln!("failed to load config file {path}: {err}");
            return ExitCode::FAILURE;
        }
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = telemetry::init(config.mode) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "Server terminated");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let mode = config.mode;

    // Log config status (without revealing secrets)
    tracing::info!(
        %mode,
        database = config.has_database(),
        access_ttl = %humantime::format_duration(config.jwt.access_ttl),
        refresh_ttl = %humantime::format_duration(config.jwt.refresh_ttl),
        "Config loaded"
    );

    let jwt = JwtService::new(config.jwt_config()?);
    let hasher = Arc::new(Argon2idHasher::new(config.password_pepper.clone()));

    let (repos, pool) = match &config.database {
        Some(database) => {
            let pool = create_pool_with_migrations(database).await?;
            tracing::info!(%mode, "Using PostgreSQL storage");
            (Repositories::postgres(pool.clone()), Some(pool))
        }
        None => {
            tracing::warn!(%mode, "DATABASE_URL not set, using in-memory storage");
            (Repositories::in_memory(), None)
        }
    };

    let app = app_router(
        Services::new(repos, hasher, jwt),
        RouterOptions {
            mode,
            request_timeout: config.http.request_timeout(),
            pool,
        },
    );

    let addr = config.http.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%mode, %addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(mode))
    .await?;

    tracing::info!(%mode, "Server stopped");
    Ok(())
}

async fn shutdown_signal(mode: taskkeep::core::config::Mode) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(%mode, "Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(%mode, "Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!(%mode, "Received shutdown signal, shutting down");
}
