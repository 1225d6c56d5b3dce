use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use unicorr_api::config::ServerConfig;
use unicorr_api::notifications::NotificationRouter;
use unicorr_api::router::build_app_router;
use unicorr_api::state::AppState;
use unicorr_db::DbPool;
use unicorr_events::EventBus;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        upload_dir = %config.upload_dir.display(),
        "Configuration loaded"
    );

    let pool = connect_database().await;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .expect("upload directory must be creatable");

    let event_bus = Arc::new(EventBus::default());
    let notifier = tokio::spawn(NotificationRouter::new(pool.clone()).run(event_bus.subscribe()));
    tracing::info!("Notification router running");

    let app = build_app_router(
        AppState {
            pool,
            config: Arc::new(config.clone()),
            event_bus: Arc::clone(&event_bus),
        },
        &config,
    );

    let ip: IpAddr = config
        .host
        .parse()
        .unwrap_or_else(|e| panic!("HOST={:?} is not an IP address: {e}", config.host));
    let addr = SocketAddr::new(ip, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("cannot listen on {addr}: {e}"));
    tracing::info!(%addr, "Listening");

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server terminated with an error");
    }

    // State clones went away with the server; this is the last sender.
    drop(event_bus);
    let drain = Duration::from_secs(config.shutdown_timeout_secs);
    if tokio::time::timeout(drain, notifier).await.is_err() {
        tracing::warn!(
            timeout_secs = config.shutdown_timeout_secs,
            "Notification router did not drain in time"
        );
    }

    tracing::info!("Shut down");
}

/// `RUST_LOG` filtering; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("unicorr_api=debug,tower_http=debug"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Connect, ping and migrate. Any failure aborts startup.
async fn connect_database() -> DbPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL is required");
    let pool = unicorr_db::create_pool(&url)
        .await
        .unwrap_or_else(|e| panic!("cannot connect to the database: {e}"));
    if let Err(e) = unicorr_db::health_check(&pool).await {
        panic!("database is not answering queries: {e}");
    }
    unicorr_db::run_migrations(&pool)
        .await
        .unwrap_or_else(|e| panic!("migrations failed: {e}"));
    tracing::info!("Database ready");
    pool
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl-C listener failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM listener failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => tracing::info!(signal = "SIGINT", "Shutting down"),
        () = terminate => tracing::info!(signal = "SIGTERM", "Shutting down"),
    }
}
