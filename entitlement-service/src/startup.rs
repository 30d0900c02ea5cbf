//! Application startup and lifecycle management.

use crate::config::Config;
use crate::services::{LimitEnforcer, MongoEntitlementStore, StripeClient};
use crate::{app_router, AppState};
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::rate_limit::{InMemoryRateLimitStore, IpRateLimit};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse MongoDB connection string: {}", e);
                AppError::DatabaseError(e.into())
            })?;
        client_options.app_name = Some("entitlement-service".to_string());

        let client = Client::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(e.into())
        })?;
        let db = client.database(&config.database.db_name);

        let store = Arc::new(MongoEntitlementStore::new(&db));
        store.init_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            AppError::DatabaseError(e)
        })?;

        let stripe = StripeClient::new(config.billing.clone());
        if stripe.is_configured() {
            tracing::info!("Billing provider client initialized");
        } else {
            tracing::warn!(
                "Billing provider credentials not configured - provider-managed subscriptions disabled"
            );
        }

        let rate_limit = IpRateLimit::new(
            Arc::new(InMemoryRateLimitStore::new()),
            "billing",
            Duration::from_millis(config.rate_limit.window_ms),
            config.rate_limit.max_requests,
        );

        let state = AppState {
            config: config.clone(),
            store: store.clone(),
            directory: store.clone(),
            billing: Arc::new(stripe),
            limits: LimitEnforcer::new(store),
            rate_limit,
        };

        // Port 0 binds a random port for tests.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Entitlement service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = app_router(self.state);
        axum::serve(
            self.listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}
