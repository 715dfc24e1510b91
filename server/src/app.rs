//! Application bootstrap and lifecycle.
//!
//! # Startup
//!
//! 1. Connect the `PostgreSQL` pool and apply migrations
//! 2. Build the identity verifier and the domain service
//! 3. Build the router with CORS and bind the listener
//!
//! # Shutdown
//!
//! When Ctrl+C or SIGTERM arrives the server stops accepting connections and
//! in-flight requests are given `SHUTDOWN_TIMEOUT` seconds to finish.

use crate::config::{Config, ServerConfig};
use crate::identity::HttpIdentityVerifier;
use accommodation_core::{AccommodationService, SystemClock};
use accommodation_postgres::PostgresRecordStore;
use accommodation_web::{AppState, build_router};
use anyhow::Context;
use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when it holds valid directives; otherwise `log_level` is
/// used for everything except the noisier crates.
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{log_level},accommodation=debug,sqlx=warn,tower_http=debug").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Install the Prometheus recorder and its scrape endpoint.
///
/// # Errors
///
/// Returns an error if the exporter cannot be installed.
pub fn install_metrics(server: &ServerConfig) -> anyhow::Result<()> {
    let Some(addr) = server.metrics_address() else {
        warn!(
            host = %server.metrics_host,
            port = server.metrics_port,
            "Invalid metrics address, Prometheus exporter disabled"
        );
        return Ok(());
    };

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus exporter")?;
    accommodation_core::metrics::register_metrics();

    info!(%addr, "Prometheus metrics endpoint started");
    Ok(())
}

/// CORS policy for browser clients.
#[must_use]
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins = if allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-id"),
            HeaderName::from_static("x-correlation-id"),
        ])
        .expose_headers([HeaderName::from_static("x-correlation-id")])
}

/// A bound, ready-to-run HTTP server.
#[derive(Debug)]
pub struct Application {
    listener: TcpListener,
    router: Router,
    shutdown_timeout: Duration,
}

impl Application {
    /// Connect every collaborator and bind the listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable, a migration fails,
    /// the identity client cannot be built or the address cannot be bound.
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        info!("Connecting to PostgreSQL...");
        let store = PostgresRecordStore::connect(
            &config.database.url,
            &config.database.pool_settings(),
        )
        .await
        .context("Failed to connect to PostgreSQL")?;

        if config.database.run_migrations {
            info!("Running database migrations...");
            store.migrate().await.context("Failed to run migrations")?;
        }

        let verifier =
            HttpIdentityVerifier::new(config.identity.url.clone(), config.identity.timeout())
                .context("Failed to build identity client")?;
        if !verifier.is_configured() {
            warn!("IDENTITY_SERVICE_URL is not set, protected routes will answer 500");
        }

        let service = AccommodationService::new(Arc::new(store), Arc::new(SystemClock))
            .with_release_policy(config.allocation.release_policy);
        info!(release_policy = %config.allocation.release_policy, "Allocation service ready");

        let state = AppState::new(service, Arc::new(verifier), config.server.env.clone());
        let router = build_router(state).layer(cors_layer(&config.server.cors_allowed_origins));

        let address = config.server.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {address}"))?;

        Ok(Self::from_parts(
            listener,
            router,
            config.server.shutdown_timeout(),
        ))
    }

    /// Assemble an application from an already bound listener.
    #[must_use]
    pub const fn from_parts(listener: TcpListener, router: Router, shutdown_timeout: Duration) -> Self {
        Self {
            listener,
            router,
            shutdown_timeout,
        }
    }

    /// Address the server is listening on.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket has no local address.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until Ctrl+C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails.
    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve until `signal` resolves, then drain in-flight requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails.
    pub async fn run_until<F>(self, signal: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.listener.local_addr()?;
        info!(%addr, "HTTP server listening");

        let stopping = Arc::new(Notify::new());
        let notify = Arc::clone(&stopping);
        let server = axum::serve(self.listener, self.router).with_graceful_shutdown(async move {
            signal.await;
            notify.notify_one();
        });
        let mut handle = tokio::spawn(async move { server.await });

        tokio::select! {
            result = &mut handle => {
                result.context("HTTP server task failed")??;
            }
            () = stopping.notified() => {
                info!(timeout_secs = self.shutdown_timeout.as_secs(), "Shutting down, draining requests");
                match tokio::time::timeout(self.shutdown_timeout, &mut handle).await {
                    Ok(result) => result.context("HTTP server task failed")??,
                    Err(_) => {
                        warn!("Graceful shutdown timed out, aborting open connections");
                        handle.abort();
                    },
                }
            }
        }

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        () = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use accommodation_testing::StaticIdentityVerifier;
    use accommodation_web::{CLIENT_ID_HEADER, CORRELATION_ID_HEADER};
    use accommodation_testing::fixtures::TestHarness;
    use tokio::sync::oneshot;
    use tower::ServiceExt;

    async fn preflight(origins: &[&str], origin: &str) -> axum::response::Response {
        let origins: Vec<String> = origins.iter().map(|o| (*o).to_string()).collect();
        let app = Router::new()
            .route("/dorms/", axum::routing::get(|| async { "ok" }))
            .layer(cors_layer(&origins));
        let request = axum::http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/dorms/")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-client-id")
            .body(axum::body::Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn test_cors_allows_listed_origin_only() {
        let origins = ["http://localhost:3000", "not a header\n"];

        let response = preflight(&origins, "http://localhost:3000").await;
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        let allowed_headers = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
            .unwrap()
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed_headers.contains("x-client-id"));

        let response = preflight(&origins, "http://evil.example").await;
        assert!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_cors_wildcard_allows_any_origin() {
        let response = preflight(&["*"], "http://anywhere.example").await;
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_serves_until_signalled() {
        let harness = TestHarness::with_beds(1).await.unwrap();
        let state = AppState::new(
            harness.service.clone(),
            Arc::new(StaticIdentityVerifier::allow_all()),
            "test",
        );
        let router = build_router(state).layer(cors_layer(&["*".to_string()]));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = Application::from_parts(listener, router, Duration::from_secs(5));
        let addr = app.local_addr().unwrap();

        let (stop, stopped) = oneshot::channel::<()>();
        let server = tokio::spawn(app.run_until(async move {
            let _ = stopped.await;
        }));

        let client = reqwest::Client::new();
        let health = client
            .get(format!("http://{addr}/health"))
            .send()
            .await
            .unwrap();
        assert_eq!(health.status(), reqwest::StatusCode::OK);

        let dorms = client
            .get(format!("http://{addr}/dorms/"))
            .header(header::AUTHORIZATION, "Bearer t")
            .header(CLIENT_ID_HEADER, "web")
            .send()
            .await
            .unwrap();
        assert_eq!(dorms.status(), reqwest::StatusCode::OK);
        assert!(dorms.headers().contains_key(CORRELATION_ID_HEADER));

        stop.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
