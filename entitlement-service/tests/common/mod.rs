// Not every test binary uses every helper.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use entitlement_service::config::{
    AuthConfig, BillingConfig, Config, DatabaseConfig, RateLimitConfig, ServerConfig,
};
use entitlement_service::middleware::auth::AccessTokenClaims;
use entitlement_service::models::{Member, MemberRole};
use entitlement_service::services::{
    LimitEnforcer, MemoryEntitlementStore, MockBillingProvider,
};
use entitlement_service::{app_router, AppState};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use secrecy::Secret;
use service_core::middleware::rate_limit::{InMemoryRateLimitStore, IpRateLimit};
use service_core::utils::signature;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: Secret::new("mongodb://localhost:27017".to_string()),
            db_name: format!("entitlement_test_{}", uuid::Uuid::new_v4()),
        },
        auth: AuthConfig {
            jwt_secret: Secret::new(TEST_JWT_SECRET.to_string()),
        },
        billing: BillingConfig {
            api_base_url: "https://api.stripe.com/v1".to_string(),
            api_key: Secret::new("sk_test_key".to_string()),
            webhook_secret: Secret::new(TEST_WEBHOOK_SECRET.to_string()),
            price_id_starter: Some("price_starter".to_string()),
            price_id_team: Some("price_team".to_string()),
            price_id_business: Some("price_business".to_string()),
            price_id_enterprise: Some("price_enterprise".to_string()),
        },
        rate_limit: RateLimitConfig {
            window_ms: 60_000,
            max_requests: 1_000,
        },
        service_name: "entitlement-service-test".to_string(),
    }
}

/// Test application driven through the router with the in-memory store and
/// mock billing provider; no external services involved.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryEntitlementStore>,
    pub billing: Arc<MockBillingProvider>,
}

impl TestApp {
    pub fn build() -> Self {
        Self::build_from_config(test_config())
    }

    pub fn build_from_config(config: Config) -> Self {
        let store = Arc::new(MemoryEntitlementStore::new());
        let billing = Arc::new(MockBillingProvider::new());

        let rate_limit = IpRateLimit::new(
            Arc::new(InMemoryRateLimitStore::new()),
            "billing",
            Duration::from_millis(config.rate_limit.window_ms),
            config.rate_limit.max_requests,
        );

        let state = AppState {
            config,
            store: store.clone(),
            directory: store.clone(),
            billing: billing.clone(),
            limits: LimitEnforcer::new(store.clone()),
            rate_limit,
        };

        TestApp {
            router: app_router(state),
            store,
            billing,
        }
    }

    pub async fn request(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("request should not fail at the transport level")
    }

    /// Seed a user belonging to a company.
    pub fn seed_member(&self, user_id: &str, company_id: &str, role: MemberRole) {
        self.store.insert_member(Member {
            id: user_id.to_string(),
            company_id: Some(company_id.to_string()),
            role: Some(role),
        });
    }
}

/// Mint a bearer token for a test user.
pub fn token_for(user_id: &str) -> String {
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("token encoding should succeed")
}

/// Sign a webhook body with the test webhook secret.
pub fn sign_webhook(body: &str) -> String {
    signature::generate_signature(TEST_WEBHOOK_SECRET, body)
        .expect("signature generation should succeed")
}

pub async fn response_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
