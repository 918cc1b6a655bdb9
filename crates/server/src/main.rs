//! Pawlink server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use pawlink_api::AppState;
use pawlink_common::Config;
use pawlink_core::CreateAdminInput;
use pawlink_db::repositories::{
    AdminAccountRepository, NgoProfileRepository, ReportRepository, SharedAdminStore,
    SharedNgoStore, SharedReportStore,
};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Largest accepted request body. Reports carry an image URL, not the image.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// `pawlink --create-admin <username> <password>` bootstraps an admin and exits.
fn create_admin_args() -> Option<CreateAdminInput> {
    let mut args = std::env::args().skip(1);
    if args.next().as_deref() != Some("--create-admin") {
        return None;
    }
    Some(CreateAdminInput {
        username: args.next().unwrap_or_default(),
        password: args.next().unwrap_or_default(),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawlink=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting pawlink server...");

    let config = Config::load()?;

    let db = pawlink_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    pawlink_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);
    let reports: SharedReportStore = Arc::new(ReportRepository::new(Arc::clone(&db)));
    let ngos: SharedNgoStore = Arc::new(NgoProfileRepository::new(Arc::clone(&db)));
    let admins: SharedAdminStore = Arc::new(AdminAccountRepository::new(Arc::clone(&db)));

    let state = AppState::new(reports, ngos, admins, &config.dispatch);
    info!(
        radius_km = config.dispatch.match_radius_km,
        "Dispatch configured"
    );

    if let Some(input) = create_admin_args() {
        let admin = state.admin_service.create_admin(input).await?;
        info!(admin_id = %admin.id, "Admin created, exiting");
        return Ok(());
    }

    let app = pawlink_api::app(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(CompressionLayer::new())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
