//! HTTP surfaces of the hotel and booking services.
//!
//! Each service is an axum router with structured logging (tracing) and
//! Prometheus metrics. The binaries pick PostgreSQL or in-memory storage
//! from the configuration.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use booking::{BookingStore, HotelClient};
use hotel::HotelStore;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use config::Config;
use routes::bookings::BookingState;
use routes::rooms::HotelState;

/// Creates the hotel service router.
pub fn create_hotel_app<S: HotelStore + 'static>(
    state: Arc<HotelState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    Router::new()
        .route("/health", get(|| routes::health::check("hotel-service")))
        .route(
            "/api/rooms",
            get(routes::rooms::available::<S>).post(routes::rooms::register::<S>),
        )
        .route("/api/rooms/recommend", get(routes::rooms::recommend::<S>))
        .route("/api/rooms/{id}", get(routes::rooms::get::<S>))
        .route(
            "/api/rooms/{id}/confirm-availability",
            post(routes::rooms::confirm::<S>),
        )
        .route("/api/rooms/{id}/release", post(routes::rooms::release::<S>))
        .with_state(state)
        .merge(metrics_router(metrics_handle))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

/// Creates the booking service router.
pub fn create_booking_app<S, H>(
    state: BookingState<S, H>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    S: BookingStore + 'static,
    H: HotelClient + 'static,
{
    Router::new()
        .route("/health", get(|| routes::health::check("booking-service")))
        .route("/api/booking", post(routes::bookings::create::<S, H>))
        .route("/api/bookings", get(routes::bookings::list::<S, H>))
        .route(
            "/api/booking/{id}",
            get(routes::bookings::get::<S, H>).delete(routes::bookings::cancel::<S, H>),
        )
        .with_state(state)
        .merge(metrics_router(metrics_handle))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
}

fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(handle)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Initializes the global tracing subscriber from `RUST_LOG`, falling back
/// to the configured level.
pub fn init_tracing(config: &Config) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Binds the configured address and serves `app` until SIGINT or SIGTERM.
pub async fn serve(app: Router, config: &Config) -> std::io::Result<()> {
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down gracefully");
    Ok(())
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}
