use crate::config::{AttendanceConfig, MongoConfig, StoreBackend};
use crate::handlers;
use crate::services::clock::{Clock, SystemClock};
use crate::services::gate::{
    AcceptRateActivenessVerifier, ActivenessVerifier, IdentityGate, IdentityVerifier,
    TemplateIdentityVerifier, TemplateRegistry,
};
use crate::services::lifecycle::SessionManager;
use crate::services::redemption::RedemptionEngine;
use crate::services::store::{
    AttendanceLedger, InMemoryAttendanceLedger, InMemorySessionStore, InMemoryTemplateStore,
    SessionStore, TemplateStore,
};
use crate::services::{spawn_sweeper, MongoDb};
use axum::{
    http::{header, HeaderName, Method, Request},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Backing stores for the three persistence contracts.
#[derive(Clone)]
pub struct Stores {
    pub sessions: Arc<dyn SessionStore>,
    pub ledger: Arc<dyn AttendanceLedger>,
    pub templates: Arc<dyn TemplateStore>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionStore::new()),
            ledger: Arc::new(InMemoryAttendanceLedger::new()),
            templates: Arc::new(InMemoryTemplateStore::new()),
        }
    }

    pub async fn mongo(config: &MongoConfig) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.uri, &config.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let db = Arc::new(db);
        Ok(Self {
            sessions: db.clone(),
            ledger: db.clone(),
            templates: db,
        })
    }

    pub async fn from_config(config: &AttendanceConfig) -> Result<Self, AppError> {
        match config.store {
            StoreBackend::Mongo => Self::mongo(&config.mongodb).await,
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory stores; data is lost on restart");
                Ok(Self::in_memory())
            }
        }
    }
}

/// Verifier implementations consulted by the identity gate.
#[derive(Clone)]
pub struct Verifiers {
    pub activeness: Arc<dyn ActivenessVerifier>,
    pub identity: Arc<dyn IdentityVerifier>,
}

impl Verifiers {
    pub fn from_config(config: &AttendanceConfig) -> Self {
        Self {
            activeness: Arc::new(AcceptRateActivenessVerifier::new(
                config.identity.activeness_accept_rate,
            )),
            identity: Arc::new(TemplateIdentityVerifier::new(
                config.identity.match_threshold,
            )),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AttendanceConfig,
    pub sessions: SessionManager,
    pub redemption: RedemptionEngine,
    pub gate: IdentityGate,
    pub session_store: Arc<dyn SessionStore>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        config: AttendanceConfig,
        stores: Stores,
        verifiers: Verifiers,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let sessions = SessionManager::new(
            stores.sessions.clone(),
            clock.clone(),
            config.session.policy(),
        );
        let registry = TemplateRegistry::new(stores.templates, config.identity.max_templates);
        let gate = IdentityGate::new(verifiers.activeness, verifiers.identity, registry);
        let redemption =
            RedemptionEngine::new(sessions.clone(), stores.ledger, gate.clone(), clock.clone());

        Self {
            config,
            sessions,
            redemption,
            gate,
            session_store: stores.sessions,
            clock,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/:id", get(handlers::get_session))
        .route("/sessions/:id/complete", post(handlers::complete_session))
        .route(
            "/sessions/:id/attendance",
            get(handlers::list_session_attendance),
        )
        .route("/attendance", post(handlers::mark_attendance))
        .route("/attendance/me", get(handlers::my_attendance))
        .route("/identity/templates", post(handlers::enroll_template))
        .route("/identity/verify", post(handlers::verify_identity))
        .route("/activity/validate", post(handlers::validate_activity))
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    HeaderName::from_static("x-user-id"),
                    HeaderName::from_static("x-user-role"),
                    HeaderName::from_static("x-request-id"),
                ]),
        )
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    pub async fn build(config: AttendanceConfig) -> Result<Self, AppError> {
        let stores = Stores::from_config(&config).await?;
        let verifiers = Verifiers::from_config(&config);
        let state = AppState::new(config.clone(), stores, verifiers, Arc::new(SystemClock));

        if config.session.sweep_interval_seconds > 0 {
            spawn_sweeper(
                state.sessions.clone(),
                Duration::from_secs(config.session.sweep_interval_seconds),
            );
            tracing::info!(
                interval_seconds = config.session.sweep_interval_seconds,
                "Session sweeper started"
            );
        }

        let app = build_router(state.clone());

        let ip = config.common.host.parse::<std::net::IpAddr>().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid bind host {}: {}",
                config.common.host,
                e
            ))
        })?;
        let addr = SocketAddr::new(ip, config.common.port);
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
